mod database;
mod error;
mod ingest;
mod ml;
mod utils;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::database::postgres::PgStore;
use crate::database::repo::{SqliteStore, ToolStore};
use crate::ingest::importer::{ImportSummary, Importer};
use crate::ingest::records::ToolRecord;
use crate::ingest::source::load_tools;
use crate::ml::engine::EmbeddingEngine;
use crate::utils::config::{
    DatabaseSettings, ImportConfig, ModelPaths, StoreBackend, DEFAULT_INPUT_PATH,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Import tools, categories and default cards from a JSON file", long_about = None)]
struct Args {
    #[arg(short, long, env = "TOOLS_JSON_PATH", default_value = DEFAULT_INPUT_PATH)]
    input: PathBuf,

    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    db_host: String,

    #[arg(long, env = "DB_PORT", default_value_t = 5432)]
    db_port: u16,

    #[arg(long, env = "DB_NAME", default_value = "aistart")]
    db_name: String,

    #[arg(long, env = "DB_USER", default_value = "aistart")]
    db_user: String,

    #[arg(long, env = "DB_PASSWORD", default_value = "supersecret", hide_env_values = true)]
    db_password: String,

    /// Write to a SQLite file instead of Postgres
    #[arg(long, env = "SQLITE_PATH")]
    sqlite: Option<PathBuf>,

    #[arg(long, env = "EMBEDDING_MODEL_PATH", requires = "tokenizer_path")]
    model_path: Option<PathBuf>,

    #[arg(long, env = "EMBEDDING_TOKENIZER_PATH", requires = "model_path")]
    tokenizer_path: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> ImportConfig {
        let backend = match self.sqlite {
            Some(path) => StoreBackend::Sqlite(path),
            None => StoreBackend::Postgres(DatabaseSettings {
                host: self.db_host,
                port: self.db_port,
                database: self.db_name,
                user: self.db_user,
                password: self.db_password,
            }),
        };

        let model = match (self.model_path, self.tokenizer_path) {
            (Some(model), Some(tokenizer)) => Some(ModelPaths { model, tokenizer }),
            _ => None,
        };

        ImportConfig {
            input_path: self.input,
            backend,
            model,
        }
    }
}

fn run_with<S: ToolStore>(store: S, engine: EmbeddingEngine, tools: &[ToolRecord]) -> Result<ImportSummary> {
    let mut importer = Importer::new(store, engine);
    let summary = importer.run(tools).context("Import aborted")?;
    let (store, _) = importer.into_parts();
    store.close().context("Failed to close database connection")?;
    Ok(summary)
}

fn main() -> Result<()> {
    // `.env` feeds the same variables clap reads (DB_*, EMBEDDING_*); real env wins.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tool_import=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config();

    info!("Tool import starting...");
    info!("Input: {:?}", config.input_path);

    let tools = load_tools(&config.input_path)?;

    let model = config.model_paths().context("Failed to locate embedding model")?;
    let engine = EmbeddingEngine::load(&model.model, &model.tokenizer)?;

    let summary = match &config.backend {
        StoreBackend::Postgres(db) => {
            info!("DB: postgres://{}@{}:{}/{}", db.user, db.host, db.port, db.database);
            run_with(PgStore::connect(db)?, engine, &tools)?
        }
        StoreBackend::Sqlite(path) => {
            info!("DB: {:?}", path);
            run_with(SqliteStore::open(path)?, engine, &tools)?
        }
    };

    info!(
        categories = summary.categories,
        tools = summary.tools,
        "Pipeline completed."
    );
    println!("Data import completed successfully!");
    Ok(())
}
