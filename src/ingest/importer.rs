use chrono::Utc;
use tracing::{debug, info};

use crate::database::repo::ToolStore;
use crate::error::Result;
use crate::ingest::categories::{extract_categories, upsert_categories};
use crate::ingest::records::{NewTool, NewToolCard, ToolRecord};
use crate::ml::Embedder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub categories: usize,
    pub tools: usize,
    pub embeddings: usize,
}

/// Runs categories first, then every tool in input order. Each tool and its
/// card are committed together before the next record starts, so a failure
/// leaves earlier records in place.
pub struct Importer<S, E> {
    store: S,
    embedder: E,
}

impl<S: ToolStore, E: Embedder> Importer<S, E> {
    pub fn new(store: S, embedder: E) -> Self {
        Self { store, embedder }
    }

    pub fn run(&mut self, tools: &[ToolRecord]) -> Result<ImportSummary> {
        let names = extract_categories(tools);
        let category_ids = upsert_categories(&mut self.store, &names)?;

        let mut summary = ImportSummary {
            categories: names.len(),
            ..Default::default()
        };

        for record in tools {
            // The vector is not written anywhere yet; only its computation is kept.
            let description = record.description_text();
            if !description.is_empty() {
                let embedding = self.embedder.embed(description)?;
                debug!(dimension = embedding.len(), "Computed description embedding");
                summary.embeddings += 1;
            }

            let category_id = record
                .category
                .as_deref()
                .and_then(|name| category_ids.get(name).copied());

            // UTC matches the session time zone sqlx sets on Postgres connections.
            let now = Utc::now().naive_utc();
            let tool = NewTool::from_record(record, category_id, now);
            self.store
                .import_tool(&tool, |tool_id| NewToolCard::for_tool(tool_id, now))?;
            summary.tools += 1;
        }

        info!(
            categories = summary.categories,
            tools = summary.tools,
            embeddings = summary.embeddings,
            "Import finished"
        );
        Ok(summary)
    }

    pub fn into_parts(self) -> (S, E) {
        (self.store, self.embedder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repo::SqliteStore;
    use crate::error::ImportError;
    use chrono::NaiveDateTime;

    /// Returns a constant vector and records what it was asked to embed.
    #[derive(Default)]
    struct FakeEmbedder {
        seen: Vec<String>,
        fail_on: Option<String>,
    }

    impl Embedder for FakeEmbedder {
        fn embed(&mut self, text: &str) -> Result<Vec<f32>> {
            if self.fail_on.as_deref() == Some(text) {
                return Err(ImportError::Embedding("model unavailable".to_string()));
            }
            self.seen.push(text.to_string());
            Ok(vec![0.5; 384])
        }
    }

    fn parse(json: &str) -> Vec<ToolRecord> {
        serde_json::from_str(json).unwrap()
    }

    fn importer() -> anyhow::Result<Importer<SqliteStore, FakeEmbedder>> {
        Ok(Importer::new(SqliteStore::open_in_memory()?, FakeEmbedder::default()))
    }

    fn count(store: &SqliteStore, table: &str) -> anyhow::Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        Ok(store.connection().query_row(&sql, [], |row| row.get(0))?)
    }

    const EXAMPLE: &str = r#"[{"name": "Foo Bar", "description": "A tool.", "category": "AI Writing", "url": "http://x"}]"#;

    #[test]
    fn test_worked_example() -> anyhow::Result<()> {
        let mut importer = importer()?;
        let summary = importer.run(&parse(EXAMPLE))?;
        assert_eq!(summary, ImportSummary { categories: 1, tools: 1, embeddings: 1 });

        let (store, embedder) = importer.into_parts();
        assert_eq!(embedder.seen, vec!["A tool.".to_string()]);

        let conn = store.connection();
        let (category_id, slug, description): (i64, String, String) = conn.query_row(
            "SELECT id, slug, description FROM categories WHERE name = 'AI Writing'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        assert_eq!(slug, "ai-writing");
        assert_eq!(description, "Tools related to AI Writing");

        let (tool_id, name, tool_slug, url, tagline, tool_category, image_url, upvotes, score, status): (
            i64,
            String,
            String,
            String,
            String,
            Option<i64>,
            Option<String>,
            i64,
            f64,
            String,
        ) = conn.query_row(
            "SELECT id, name, slug, url, tagline, category_id, image_url, upvotes, match_score, status FROM tools",
            [],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                ))
            },
        )?;
        assert_eq!(name, "Foo Bar");
        assert_eq!(tool_slug, "foo-bar");
        assert_eq!(url, "http://x");
        assert_eq!(tagline, "A tool.");
        assert_eq!(tool_category, Some(category_id));
        assert_eq!(image_url, None);
        assert_eq!(upvotes, 0);
        assert_eq!(score, 0.0);
        assert_eq!(status, "active");

        let (card_tool, layout, size, order, featured, upvote_btn, badge): (i64, String, String, i64, bool, bool, bool) =
            conn.query_row(
                "SELECT tool_id, layout_type, card_size, display_order, is_featured,
                        show_upvote_button, show_category_badge FROM tool_cards",
                [],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                    ))
                },
            )?;
        assert_eq!(card_tool, tool_id);
        assert_eq!((layout.as_str(), size.as_str(), order), ("default", "medium", 0));
        assert!(!featured);
        assert!(upvote_btn);
        assert!(badge);
        assert_eq!(count(&store, "tool_cards")?, 1);
        Ok(())
    }

    #[test]
    fn test_missing_category_is_null() -> anyhow::Result<()> {
        let mut importer = importer()?;
        importer.run(&parse(r#"[{"name": "Loner", "description": "No home"}]"#))?;

        let (store, _) = importer.into_parts();
        assert_eq!(count(&store, "categories")?, 0);
        let category_id: Option<i64> =
            store
                .connection()
                .query_row("SELECT category_id FROM tools", [], |row| row.get(0))?;
        assert_eq!(category_id, None);
        Ok(())
    }

    #[test]
    fn test_empty_description_skips_embedding() -> anyhow::Result<()> {
        let mut importer = importer()?;
        let summary = importer.run(&parse(r#"[{"name": "A"}, {"name": "B", "description": ""}]"#))?;
        assert_eq!(summary.tools, 2);
        assert_eq!(summary.embeddings, 0);

        let (_, embedder) = importer.into_parts();
        assert!(embedder.seen.is_empty());
        Ok(())
    }

    #[test]
    fn test_rerun_preserves_counters_and_cards() -> anyhow::Result<()> {
        let mut importer = importer()?;
        importer.run(&parse(EXAMPLE))?;

        let (store, embedder) = importer.into_parts();
        store.connection().execute_batch(
            "UPDATE tools SET upvotes = 42, match_score = 0.9, status = 'archived',
                              created_at = '2020-01-01 00:00:00';
             UPDATE tool_cards SET is_featured = 1;",
        )?;

        let edited = r#"[{"name": "Foo Bar", "description": "A better tool.", "category": "AI Writing",
                          "url": "http://y", "image_url": "http://y/logo.png"}]"#;
        let mut importer = Importer::new(store, embedder);
        importer.run(&parse(edited))?;
        importer.run(&parse(edited))?;

        let (store, _) = importer.into_parts();
        let conn = store.connection();
        let (upvotes, score, status, created_at, url, tagline, image_url): (
            i64,
            f64,
            String,
            String,
            String,
            String,
            Option<String>,
        ) = conn.query_row(
            "SELECT upvotes, match_score, status, created_at, url, tagline, image_url FROM tools",
            [],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            },
        )?;
        assert_eq!(upvotes, 42);
        assert_eq!(score, 0.9);
        assert_eq!(status, "archived");
        assert_eq!(created_at, "2020-01-01 00:00:00");
        assert_eq!(url, "http://y");
        assert_eq!(tagline, "A better tool.");
        assert_eq!(image_url.as_deref(), Some("http://y/logo.png"));

        assert_eq!(count(&store, "tools")?, 1);
        assert_eq!(count(&store, "categories")?, 1);
        assert_eq!(count(&store, "tool_cards")?, 1);
        let featured: bool = conn.query_row("SELECT is_featured FROM tool_cards", [], |row| row.get(0))?;
        assert!(featured);
        Ok(())
    }

    fn tool_timestamps(store: &SqliteStore) -> anyhow::Result<(NaiveDateTime, NaiveDateTime)> {
        Ok(store.connection().query_row(
            "SELECT created_at, updated_at FROM tools",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?)
    }

    #[test]
    fn test_rerun_moves_updated_at_forward() -> anyhow::Result<()> {
        let mut importer = importer()?;
        importer.run(&parse(EXAMPLE))?;
        let (store, embedder) = importer.into_parts();
        let (created_first, updated_first) = tool_timestamps(&store)?;
        assert_eq!(created_first, updated_first);

        // Inserts and conflict updates share one UTC clock
        let skew = (Utc::now().naive_utc() - updated_first).num_seconds().abs();
        assert!(skew < 60, "updated_at is {}s away from UTC now", skew);

        let mut importer = Importer::new(store, embedder);
        importer.run(&parse(EXAMPLE))?;
        let (store, _) = importer.into_parts();
        let (created_second, updated_second) = tool_timestamps(&store)?;

        assert_eq!(created_second, created_first);
        assert!(updated_second >= updated_first);
        Ok(())
    }

    #[test]
    fn test_explicit_null_url_is_stored_as_null() -> anyhow::Result<()> {
        let mut importer = importer()?;
        importer.run(&parse(r#"[{"name": "Nulls", "url": null}, {"name": "Missing"}]"#))?;

        let (store, _) = importer.into_parts();
        let urls: Vec<Option<String>> = store
            .connection()
            .prepare("SELECT url FROM tools ORDER BY id")?
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        assert_eq!(urls, vec![None, Some(String::new())]);
        Ok(())
    }

    #[test]
    fn test_unknown_category_reference_is_null() -> anyhow::Result<()> {
        let mut importer = importer()?;
        // Empty category names never become rows, so they cannot resolve.
        importer.run(&parse(r#"[{"name": "Odd", "category": ""}]"#))?;

        let (store, _) = importer.into_parts();
        assert_eq!(count(&store, "categories")?, 0);
        let category_id: Option<i64> =
            store
                .connection()
                .query_row("SELECT category_id FROM tools", [], |row| row.get(0))?;
        assert_eq!(category_id, None);
        Ok(())
    }

    #[test]
    fn test_failure_keeps_earlier_records() -> anyhow::Result<()> {
        let embedder = FakeEmbedder {
            fail_on: Some("second".to_string()),
            ..Default::default()
        };
        let mut importer = Importer::new(SqliteStore::open_in_memory()?, embedder);
        let tools = parse(
            r#"[{"name": "One", "description": "first"},
                {"name": "Two", "description": "second"},
                {"name": "Three", "description": "third"}]"#,
        );

        let err = importer.run(&tools).unwrap_err();
        assert!(matches!(err, ImportError::Embedding(_)));

        let (store, _) = importer.into_parts();
        let slugs: Vec<String> = store
            .connection()
            .prepare("SELECT slug FROM tools ORDER BY id")?
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        assert_eq!(slugs, vec!["one".to_string()]);
        assert_eq!(count(&store, "tool_cards")?, 1);
        Ok(())
    }

    #[test]
    fn test_same_slug_in_one_file_updates_once() -> anyhow::Result<()> {
        let mut importer = importer()?;
        let summary = importer.run(&parse(
            r#"[{"name": "Foo Bar", "url": "http://first"}, {"name": "foo bar", "url": "http://second"}]"#,
        ))?;
        assert_eq!(summary.tools, 2);

        let (store, _) = importer.into_parts();
        assert_eq!(count(&store, "tools")?, 1);
        assert_eq!(count(&store, "tool_cards")?, 1);
        let (name, url): (String, String) =
            store
                .connection()
                .query_row("SELECT name, url FROM tools", [], |row| Ok((row.get(0)?, row.get(1)?)))?;
        // Name is not in the update set, so the first spelling sticks.
        assert_eq!(name, "Foo Bar");
        assert_eq!(url, "http://second");
        Ok(())
    }
}
