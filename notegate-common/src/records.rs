//! Typed record fields per category, plus validation of oracle output.
//!
//! Every record the store holds is one of these shapes. The capture service
//! builds them from an explicit prefix parse or from the classification
//! oracle's field map; the oracle path is validated here and fails closed
//! on anything off-contract.

use crate::categories::Category;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Titles derived from free text are cut to this many characters.
pub const TITLE_MAX_CHARS: usize = 100;

/// Allowed project statuses, in listing order.
pub const PROJECT_STATUSES: [&str; 5] = ["active", "waiting", "blocked", "someday", "done"];

/// Extracted fields for one record, one variant per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum RecordFields {
    People {
        name: String,
        context: Option<String>,
        follow_ups: Option<String>,
    },
    Projects {
        name: String,
        status: String,
        next_action: Option<String>,
        notes: Option<String>,
    },
    Ideas {
        title: String,
        one_liner: Option<String>,
        elaboration: Option<String>,
    },
    Admin {
        name: String,
        due_date: Option<String>,
        notes: Option<String>,
    },
    Decisions {
        title: String,
        decision: String,
        rationale: Option<String>,
        context: Option<String>,
    },
    Howtos {
        title: String,
        content: String,
    },
    Snippets {
        title: String,
        content: String,
    },
}

impl RecordFields {
    pub fn category(&self) -> Category {
        match self {
            RecordFields::People { .. } => Category::People,
            RecordFields::Projects { .. } => Category::Projects,
            RecordFields::Ideas { .. } => Category::Ideas,
            RecordFields::Admin { .. } => Category::Admin,
            RecordFields::Decisions { .. } => Category::Decisions,
            RecordFields::Howtos { .. } => Category::Howtos,
            RecordFields::Snippets { .. } => Category::Snippets,
        }
    }

    /// The record's display title (name or title per category).
    pub fn title(&self) -> &str {
        match self {
            RecordFields::People { name, .. } => name,
            RecordFields::Projects { name, .. } => name,
            RecordFields::Ideas { title, .. } => title,
            RecordFields::Admin { name, .. } => name,
            RecordFields::Decisions { title, .. } => title,
            RecordFields::Howtos { title, .. } => title,
            RecordFields::Snippets { title, .. } => title,
        }
    }

    /// Build fields for a dynamic category from the oracle's field map.
    ///
    /// Required fields must be present and non-blank; unknown keys are
    /// ignored. Reference categories are rejected outright since the oracle
    /// is never allowed to assign them.
    pub fn from_oracle_map(category: Category, map: &HashMap<String, String>) -> Result<RecordFields> {
        match category {
            Category::People => Ok(RecordFields::People {
                name: required(map, "name", category)?,
                context: optional(map, "context"),
                follow_ups: optional(map, "follow_ups"),
            }),
            Category::Projects => {
                let status = optional(map, "status")
                    .map(|s| s.to_lowercase())
                    .unwrap_or_else(|| "active".to_string());
                if !PROJECT_STATUSES.contains(&status.as_str()) {
                    return Err(Error::InvalidInput(format!(
                        "unknown project status '{}'",
                        status
                    )));
                }
                Ok(RecordFields::Projects {
                    name: required(map, "name", category)?,
                    status,
                    next_action: optional(map, "next_action"),
                    notes: optional(map, "notes"),
                })
            }
            Category::Ideas => Ok(RecordFields::Ideas {
                title: required(map, "title", category)?,
                one_liner: optional(map, "one_liner"),
                elaboration: optional(map, "elaboration"),
            }),
            Category::Admin => Ok(RecordFields::Admin {
                name: required(map, "name", category)?,
                due_date: optional(map, "due_date"),
                notes: optional(map, "notes"),
            }),
            Category::Decisions | Category::Howtos | Category::Snippets => {
                Err(Error::InvalidInput(format!(
                    "category '{}' is not classifiable",
                    category
                )))
            }
        }
    }
}

fn required(map: &HashMap<String, String>, key: &str, category: Category) -> Result<String> {
    match map.get(key).map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(Error::InvalidInput(format!(
            "field map for '{}' is missing required field '{}'",
            category, key
        ))),
    }
}

fn optional(map: &HashMap<String, String>, key: &str) -> Option<String> {
    map.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// First [`TITLE_MAX_CHARS`] characters of the text, for derived titles.
pub fn truncate_title(text: &str) -> String {
    text.chars().take(TITLE_MAX_CHARS).collect()
}

/// Serialize a tag list to its stored JSON form.
pub fn tags_to_json(tags: &[String]) -> Result<String> {
    serde_json::to_string(tags).map_err(|e| Error::Internal(format!("tag serialization: {}", e)))
}
