use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};

pub const TAGLINE_CHARS: usize = 280;

/// One element of the input JSON array. Every field may be missing or `null`.
///
/// `description` and `url` keep the two apart: `None` when the key is absent,
/// `Some(None)` for an explicit `null`. Absent keys are stored as `""`,
/// explicit nulls as NULL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub url: Option<Option<String>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ToolRecord {
    /// The category name, if the record names a non-empty one.
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    pub fn description_text(&self) -> &str {
        self.description.as_ref().and_then(|d| d.as_deref()).unwrap_or("")
    }
}

// Only called when the key exists, so a `null` lands as `Some(None)`.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn stored_text(field: &Option<Option<String>>) -> Option<String> {
    match field {
        None => Some(String::new()),
        Some(value) => value.clone(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub description: String,
}

impl NewCategory {
    pub fn from_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: slugify(name),
            description: format!("Tools related to {}", name),
        }
    }
}

/// Row written to `tools`. `upvotes`, `match_score` and `status` only apply on
/// first insert; the upsert never touches them afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTool {
    pub name: String,
    pub slug: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub tagline: String,
    pub category_id: Option<i64>,
    pub image_url: Option<String>,
    pub upvotes: i32,
    pub match_score: f64,
    pub status: &'static str,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewTool {
    pub fn from_record(record: &ToolRecord, category_id: Option<i64>, now: NaiveDateTime) -> Self {
        let name = record.name.clone().unwrap_or_default();
        Self {
            slug: slugify(&name),
            tagline: tagline(record.description_text()),
            name,
            url: stored_text(&record.url),
            description: stored_text(&record.description),
            category_id,
            image_url: record.image_url.clone(),
            upvotes: 0,
            match_score: 0.0,
            status: "active",
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewToolCard {
    pub tool_id: i64,
    pub layout_type: &'static str,
    pub card_size: &'static str,
    pub display_order: i32,
    pub is_featured: bool,
    pub show_upvote_button: bool,
    pub show_category_badge: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewToolCard {
    pub fn for_tool(tool_id: i64, now: NaiveDateTime) -> Self {
        Self {
            tool_id,
            layout_type: "default",
            card_size: "medium",
            display_order: 0,
            is_featured: false,
            show_upvote_button: true,
            show_category_badge: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Lowercases `name` and turns every space into a hyphen. Nothing else is
/// stripped, so punctuation survives into the slug.
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// First 280 characters (not bytes) of the description.
pub fn tagline(description: &str) -> String {
    description.chars().take(TAGLINE_CHARS).collect()
}
