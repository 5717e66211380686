use std::collections::HashMap;

use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use crate::database::repo::ToolStore;
use crate::database::schema::{
    PG_INSERT_CARD, PG_INSERT_CATEGORY, PG_SELECT_CATEGORIES, PG_UPSERT_TOOL,
};
use crate::error::{ImportError, Result};
use crate::ingest::records::{NewCategory, NewTool, NewToolCard};
use crate::utils::config::DatabaseSettings;

/// A single Postgres connection driven from a private current-thread runtime,
/// so callers see plain blocking calls.
pub struct PgStore {
    runtime: Runtime,
    conn: PgConnection,
}

impl PgStore {
    pub fn connect(settings: &DatabaseSettings) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ImportError::Runtime)?;

        let options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .database(&settings.database)
            .username(&settings.user)
            .password(&settings.password);

        let conn = runtime.block_on(options.connect())?;
        info!(
            host = %settings.host,
            port = settings.port,
            database = %settings.database,
            "Connected to Postgres"
        );

        Ok(Self { runtime, conn })
    }
}

impl ToolStore for PgStore {
    fn insert_categories(&mut self, categories: &[NewCategory]) -> Result<()> {
        let Self { runtime, conn } = self;
        runtime.block_on(async {
            let mut tx = conn.begin().await?;
            for category in categories {
                sqlx::query(PG_INSERT_CATEGORY)
                    .bind(&category.name)
                    .bind(&category.slug)
                    .bind(&category.description)
                    .execute(&mut *tx)
                    .await?;
            }
            tx.commit().await?;
            Ok::<_, ImportError>(())
        })
    }

    fn category_ids(&mut self) -> Result<HashMap<String, i64>> {
        let Self { runtime, conn } = self;
        let rows: Vec<(String, i64)> = runtime.block_on(
            sqlx::query_as(PG_SELECT_CATEGORIES).fetch_all(&mut *conn),
        )?;
        Ok(rows.into_iter().collect())
    }

    fn import_tool<F>(&mut self, tool: &NewTool, card: F) -> Result<i64>
    where
        F: FnOnce(i64) -> NewToolCard,
    {
        let Self { runtime, conn } = self;
        let tool_id = runtime.block_on(async {
            let mut tx = conn.begin().await?;

            let tool_id: i64 = sqlx::query_scalar(PG_UPSERT_TOOL)
                .bind(&tool.name)
                .bind(&tool.slug)
                .bind(tool.url.as_deref())
                .bind(tool.description.as_deref())
                .bind(&tool.tagline)
                .bind(tool.category_id)
                .bind(tool.image_url.as_deref())
                .bind(tool.upvotes)
                .bind(tool.match_score)
                .bind(tool.status)
                .bind(tool.created_at)
                .bind(tool.updated_at)
                .fetch_one(&mut *tx)
                .await?;

            let card = card(tool_id);
            sqlx::query(PG_INSERT_CARD)
                .bind(card.tool_id)
                .bind(card.layout_type)
                .bind(card.card_size)
                .bind(card.display_order)
                .bind(card.is_featured)
                .bind(card.show_upvote_button)
                .bind(card.show_category_badge)
                .bind(card.created_at)
                .bind(card.updated_at)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok::<_, ImportError>(tool_id)
        })?;

        debug!(slug = %tool.slug, tool_id, "Tool committed");
        Ok(tool_id)
    }

    fn close(self) -> Result<()> {
        let Self { runtime, conn } = self;
        runtime.block_on(conn.close())?;
        Ok(())
    }
}
