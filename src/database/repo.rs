use std::collections::HashMap;
use std::path::Path;

use rusqlite::{params, Connection};
use tracing::debug;

use crate::database::schema::{
    SQLITE_INSERT_CARD, SQLITE_INSERT_CATEGORY, SQLITE_SCHEMA, SQLITE_UPSERT_TOOL,
};
use crate::error::Result;
use crate::ingest::records::{NewCategory, NewTool, NewToolCard};

/// Storage seam for the import. Every call that writes commits before it
/// returns; there is never a transaction spanning more than one tool.
pub trait ToolStore {
    /// Inserts all categories in one transaction. Names that already exist are skipped.
    fn insert_categories(&mut self, categories: &[NewCategory]) -> Result<()>;

    /// Every persisted category, keyed by name.
    fn category_ids(&mut self) -> Result<HashMap<String, i64>>;

    /// Upserts the tool by slug, inserts the card built for the returned id
    /// unless one exists, commits, and returns the tool id.
    fn import_tool<F>(&mut self, tool: &NewTool, card: F) -> Result<i64>
    where
        F: FnOnce(i64) -> NewToolCard;

    fn close(self) -> Result<()>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SQLITE_SCHEMA)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl ToolStore for SqliteStore {
    fn insert_categories(&mut self, categories: &[NewCategory]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(SQLITE_INSERT_CATEGORY)?;
            for category in categories {
                stmt.execute(params![category.name, category.slug, category.description])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn category_ids(&mut self) -> Result<HashMap<String, i64>> {
        let mut stmt = self.conn.prepare("SELECT name, id FROM categories")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let ids = rows.collect::<rusqlite::Result<HashMap<String, i64>>>()?;
        Ok(ids)
    }

    fn import_tool<F>(&mut self, tool: &NewTool, card: F) -> Result<i64>
    where
        F: FnOnce(i64) -> NewToolCard,
    {
        let tx = self.conn.transaction()?;

        let tool_id: i64 = tx.query_row(
            SQLITE_UPSERT_TOOL,
            params![
                tool.name,
                tool.slug,
                tool.url,
                tool.description,
                tool.tagline,
                tool.category_id,
                tool.image_url,
                tool.upvotes,
                tool.match_score,
                tool.status,
                tool.created_at,
                tool.updated_at
            ],
            |row| row.get(0),
        )?;

        let card = card(tool_id);
        tx.execute(
            SQLITE_INSERT_CARD,
            params![
                card.tool_id,
                card.layout_type,
                card.card_size,
                card.display_order,
                card.is_featured,
                card.show_upvote_button,
                card.show_category_badge,
                card.created_at,
                card.updated_at
            ],
        )?;

        tx.commit()?;
        debug!(slug = %tool.slug, tool_id, "Tool committed");
        Ok(tool_id)
    }

    fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(())
    }
}
