use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{ImportError, Result};
use crate::ingest::records::ToolRecord;

/// Reads the whole tool list up front. Nothing touches the database until this
/// has succeeded.
pub fn load_tools(path: &Path) -> Result<Vec<ToolRecord>> {
    let content = fs::read_to_string(path).map_err(|source| ImportError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;

    let tools: Vec<ToolRecord> =
        serde_json::from_str(&content).map_err(|source| ImportError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    info!(path = %path.display(), count = tools.len(), "Loaded tool records");
    Ok(tools)
}
