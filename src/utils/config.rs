use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::info;
use walkdir::WalkDir;

pub const DEFAULT_INPUT_PATH: &str = "src/data/all-tools.json";

pub const ENV_FILE: &str = ".env";

const MODEL_FILE: &str = "model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";
const MODEL_KEY: &str = "EMBEDDING_MODEL_PATH";
const TOKENIZER_KEY: &str = "EMBEDDING_TOKENIZER_PATH";
const SEARCH_DEPTH: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "aistart".to_string(),
            user: "aistart".to_string(),
            password: "supersecret".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    Postgres(DatabaseSettings),
    Sqlite(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelPaths {
    pub model: PathBuf,
    pub tokenizer: PathBuf,
}

/// Everything the import needs. The defaults reproduce the fixed
/// connection and input path the job has always used.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
    pub input_path: PathBuf,
    pub backend: StoreBackend,
    pub model: Option<ModelPaths>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            backend: StoreBackend::Postgres(DatabaseSettings::default()),
            model: None,
        }
    }
}

impl ImportConfig {
    /// Configured paths win. `.env` has already been folded into the process
    /// environment by then, so a miss here means searching the filesystem and
    /// remembering the result in `.env` for the next run.
    pub fn model_paths(&self) -> Result<ModelPaths> {
        if let Some(paths) = &self.model {
            return Ok(paths.clone());
        }

        info!("No embedding model configured. Searching filesystem...");
        let paths = ModelPaths::discover(&std::env::current_dir()?, SEARCH_DEPTH)?;
        info!(
            model = %paths.model.display(),
            tokenizer = %paths.tokenizer.display(),
            "Found embedding model"
        );

        paths.append_to_env_file(Path::new(ENV_FILE))?;
        info!("Saved model paths to {}", ENV_FILE);
        Ok(paths)
    }
}

impl ModelPaths {
    /// Finds `model.onnx` and `tokenizer.json` below `root`, falling back to
    /// its parent when run from a subdirectory of the project.
    pub fn discover(root: &Path, max_depth: usize) -> Result<Self> {
        let find = |filename: &str| {
            search_under(root, filename, max_depth)
                .or_else(|| root.parent().and_then(|p| search_under(p, filename, max_depth)))
                .ok_or_else(|| anyhow!("Could not find file '{}' in nearby directories.", filename))
        };

        Ok(Self {
            model: find(MODEL_FILE)?,
            tokenizer: find(TOKENIZER_FILE)?,
        })
    }

    /// Appends the two keys; existing entries such as `DB_HOST` are left as they are.
    pub fn append_to_env_file(&self, path: &Path) -> Result<()> {
        let mut file = File::options()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open {:?}", path))?;
        writeln!(file, "{}={}", MODEL_KEY, self.model.display())?;
        writeln!(file, "{}={}", TOKENIZER_KEY, self.tokenizer.display())?;
        Ok(())
    }
}

fn search_under(root: &Path, filename: &str, max_depth: usize) -> Option<PathBuf> {
    WalkDir::new(root)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .find(|e| e.file_type().is_file() && e.file_name() == filename)
        .map(|e| e.path().to_path_buf())
}
