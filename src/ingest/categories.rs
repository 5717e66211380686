use std::collections::{BTreeSet, HashMap};
use tracing::info;

use crate::database::repo::ToolStore;
use crate::error::Result;
use crate::ingest::records::{NewCategory, ToolRecord};

/// Distinct, non-empty category names referenced by the records.
pub fn extract_categories(tools: &[ToolRecord]) -> BTreeSet<String> {
    tools
        .iter()
        .filter_map(|t| t.category_name())
        .map(str::to_string)
        .collect()
}

/// Inserts every category (existing names are left alone), then reads back the
/// complete name -> id map, including categories from earlier runs.
pub fn upsert_categories<S: ToolStore>(
    store: &mut S,
    names: &BTreeSet<String>,
) -> Result<HashMap<String, i64>> {
    let categories: Vec<NewCategory> = names.iter().map(|n| NewCategory::from_name(n)).collect();
    store.insert_categories(&categories)?;

    let ids = store.category_ids()?;
    info!(
        inserted = categories.len(),
        known = ids.len(),
        "Categories upserted"
    );
    Ok(ids)
}
