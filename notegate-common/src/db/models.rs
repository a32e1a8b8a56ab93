//! Database models

use crate::categories::Category;
use serde::{Deserialize, Serialize};

/// Terminal-or-open state of an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Filed,
    NeedsReview,
    Fixed,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Filed => "filed",
            AuditStatus::NeedsReview => "needs_review",
            AuditStatus::Fixed => "fixed",
        }
    }

    pub fn parse(s: &str) -> Option<AuditStatus> {
        match s {
            "filed" => Some(AuditStatus::Filed),
            "needs_review" => Some(AuditStatus::NeedsReview),
            "fixed" => Some(AuditStatus::Fixed),
            _ => None,
        }
    }
}

/// One row of the append-only audit log: every captured message gets
/// exactly one, keyed by the transport's unique source_ref.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditEntry {
    pub id: String,
    pub raw_text: String,
    /// Canonical category name; NULL until something is filed
    pub category: Option<String>,
    /// Id of the record in the category table, when filed
    pub record_id: Option<String>,
    /// Classification confidence; 1.0 for user-declared categories
    pub confidence: Option<f64>,
    /// One of 'filed', 'needs_review', 'fixed' (CHECK-constrained)
    pub status: String,
    /// Transport ref of the user's original message (unique)
    pub source_ref: String,
    /// Transport ref of this service's latest reply about the message
    pub response_ref: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl AuditEntry {
    /// Typed status accessor. The column is CHECK-constrained, so `None`
    /// only shows up for rows edited outside the service.
    pub fn status(&self) -> Option<AuditStatus> {
        AuditStatus::parse(&self.status)
    }

    /// Typed category accessor.
    pub fn category(&self) -> Option<Category> {
        self.category.as_deref().and_then(Category::parse_canonical)
    }
}

/// An unanswered clarification question, at most one per audit entry.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PendingClarification {
    pub id: String,
    pub audit_entry_id: String,
    /// Transport ref of the clarification prompt we sent
    pub prompt_ref: String,
    /// Oracle's below-threshold guess, offered back to the user
    pub suggested_category: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
