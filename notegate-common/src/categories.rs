//! Category vocabulary shared by the router, clarification and fix flows.
//!
//! The set is closed so dispatch is an exhaustive match rather than a
//! string-keyed lookup. Dynamic categories are chosen by the classification
//! oracle and gated on confidence; reference categories are only ever
//! declared explicitly by the user (capture prefix, clarification token,
//! or fix target) and never come back from the oracle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A record category. The serialized form is the lowercase name, which is
/// also the category's table name in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    People,
    Projects,
    Ideas,
    Admin,
    Decisions,
    Howtos,
    Snippets,
}

/// How records reach a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    /// Assigned by the classification oracle, subject to the confidence gate
    Dynamic,
    /// Declared explicitly by the user; always recorded at confidence 1.0
    Reference,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 7] = [
        Category::People,
        Category::Projects,
        Category::Ideas,
        Category::Admin,
        Category::Decisions,
        Category::Howtos,
        Category::Snippets,
    ];

    pub fn kind(&self) -> CategoryKind {
        match self {
            Category::People | Category::Projects | Category::Ideas | Category::Admin => {
                CategoryKind::Dynamic
            }
            Category::Decisions | Category::Howtos | Category::Snippets => CategoryKind::Reference,
        }
    }

    /// Canonical name: the serialized form and the store table name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::People => "people",
            Category::Projects => "projects",
            Category::Ideas => "ideas",
            Category::Admin => "admin",
            Category::Decisions => "decisions",
            Category::Howtos => "howtos",
            Category::Snippets => "snippets",
        }
    }

    /// Singular label used in user-facing replies.
    pub fn singular(&self) -> &'static str {
        match self {
            Category::People => "person",
            Category::Projects => "project",
            Category::Ideas => "idea",
            Category::Admin => "admin",
            Category::Decisions => "decision",
            Category::Howtos => "howto",
            Category::Snippets => "snippet",
        }
    }

    /// Parse the canonical (stored/serialized) name.
    pub fn parse_canonical(s: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.as_str() == s)
    }

    /// Parse a user-typed category token.
    ///
    /// Accepts singular and plural spellings, case-insensitive, with an
    /// optional trailing colon ("idea", "Ideas", "project:").
    pub fn parse_token(token: &str) -> Option<Category> {
        let t = token.trim().trim_end_matches(':').to_lowercase();
        match t.as_str() {
            "person" | "people" => Some(Category::People),
            "project" | "projects" => Some(Category::Projects),
            "idea" | "ideas" => Some(Category::Ideas),
            "admin" => Some(Category::Admin),
            "decision" | "decisions" => Some(Category::Decisions),
            "howto" | "howtos" => Some(Category::Howtos),
            "snippet" | "snippets" => Some(Category::Snippets),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
