//! Audit log queries and the transactional capture write sets.
//!
//! One audit entry per captured message, keyed by the transport's unique
//! source_ref. Audit rows are never deleted; status moves between 'filed',
//! 'needs_review' and 'fixed'.

use chrono::{DateTime, Utc};
use notegate_common::categories::Category;
use notegate_common::db::models::AuditEntry;
use notegate_common::records::RecordFields;
use notegate_common::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::db::records;

/// Look up the audit entry for a user message ref.
pub async fn find_by_source_ref(pool: &SqlitePool, source_ref: &str) -> Result<Option<AuditEntry>> {
    let entry = sqlx::query_as::<_, AuditEntry>(
        r#"
        SELECT id, raw_text, category, record_id, confidence, status, source_ref, response_ref, created_at
        FROM audit_log
        WHERE source_ref = ?
        "#,
    )
    .bind(source_ref)
    .fetch_optional(pool)
    .await?;
    Ok(entry)
}

/// Look up the audit entry whose latest outbound reply carries this ref.
pub async fn find_by_response_ref(
    pool: &SqlitePool,
    response_ref: &str,
) -> Result<Option<AuditEntry>> {
    let entry = sqlx::query_as::<_, AuditEntry>(
        r#"
        SELECT id, raw_text, category, record_id, confidence, status, source_ref, response_ref, created_at
        FROM audit_log
        WHERE response_ref = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(response_ref)
    .fetch_optional(pool)
    .await?;
    Ok(entry)
}

pub async fn find_by_id(pool: &SqlitePool, audit_id: &str) -> Result<Option<AuditEntry>> {
    let entry = sqlx::query_as::<_, AuditEntry>(
        r#"
        SELECT id, raw_text, category, record_id, confidence, status, source_ref, response_ref, created_at
        FROM audit_log
        WHERE id = ?
        "#,
    )
    .bind(audit_id)
    .fetch_optional(pool)
    .await?;
    Ok(entry)
}

/// File a capture: insert the category record and its 'filed' audit entry
/// in one transaction.
#[allow(clippy::too_many_arguments)]
pub async fn file_capture(
    pool: &SqlitePool,
    audit_id: &str,
    record_id: &str,
    raw_text: &str,
    source_ref: &str,
    category: Category,
    fields: &RecordFields,
    tags: &[String],
    confidence: f64,
) -> Result<()> {
    let mut tx = pool.begin().await?;

    records::insert_record(&mut *tx, record_id, fields, tags).await?;

    sqlx::query(
        r#"
        INSERT INTO audit_log (id, raw_text, category, record_id, confidence, status, source_ref, created_at)
        VALUES (?, ?, ?, ?, ?, 'filed', ?, ?)
        "#,
    )
    .bind(audit_id)
    .bind(raw_text)
    .bind(category.as_str())
    .bind(record_id)
    .bind(confidence)
    .bind(source_ref)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Record a message that could not be filed. No pending clarification.
pub async fn insert_needs_review(
    pool: &SqlitePool,
    audit_id: &str,
    raw_text: &str,
    source_ref: &str,
    suggested_category: Option<Category>,
    confidence: Option<f64>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_log (id, raw_text, category, confidence, status, source_ref, created_at)
        VALUES (?, ?, ?, ?, 'needs_review', ?, ?)
        "#,
    )
    .bind(audit_id)
    .bind(raw_text)
    .bind(suggested_category.map(|c| c.as_str()))
    .bind(confidence)
    .bind(source_ref)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

/// Record a below-threshold classification together with its open
/// clarification, in one transaction. The audit entry starts at
/// 'needs_review' with the oracle's suggestion and the prompt as its
/// response_ref.
#[allow(clippy::too_many_arguments)]
pub async fn insert_review_with_pending(
    pool: &SqlitePool,
    audit_id: &str,
    raw_text: &str,
    source_ref: &str,
    suggested_category: Category,
    confidence: f64,
    pending_id: &str,
    prompt_ref: &str,
) -> Result<()> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO audit_log (id, raw_text, category, confidence, status, source_ref, response_ref, created_at)
        VALUES (?, ?, ?, ?, 'needs_review', ?, ?, ?)
        "#,
    )
    .bind(audit_id)
    .bind(raw_text)
    .bind(suggested_category.as_str())
    .bind(confidence)
    .bind(source_ref)
    .bind(prompt_ref)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO pending_clarifications (id, audit_entry_id, prompt_ref, suggested_category, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(pending_id)
    .bind(audit_id)
    .bind(prompt_ref)
    .bind(suggested_category.as_str())
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Point the entry at the latest outbound reply about it.
pub async fn set_response_ref(pool: &SqlitePool, audit_id: &str, response_ref: &str) -> Result<()> {
    sqlx::query("UPDATE audit_log SET response_ref = ? WHERE id = ?")
        .bind(response_ref)
        .bind(audit_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Re-file an audited message into a new category in one transaction:
/// insert the replacement record, drop the old one (if any), settle any
/// open clarification, and mark the entry 'fixed'. Confidence is left as
/// originally recorded.
pub async fn apply_fix(
    pool: &SqlitePool,
    entry: &AuditEntry,
    target: Category,
    new_record_id: &str,
    fields: &RecordFields,
    tags: &[String],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    records::insert_record(&mut *tx, new_record_id, fields, tags).await?;

    if let (Some(old_category), Some(old_record_id)) = (entry.category(), entry.record_id.as_deref())
    {
        records::delete_record(&mut *tx, old_category, old_record_id).await?;
    }

    sqlx::query("DELETE FROM pending_clarifications WHERE audit_entry_id = ?")
        .bind(&entry.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE audit_log SET category = ?, record_id = ?, status = 'fixed' WHERE id = ?")
        .bind(target.as_str())
        .bind(new_record_id)
        .bind(&entry.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// One needs_review row for the operator surface
#[derive(Debug, Clone, Serialize)]
pub struct ReviewEntry {
    pub audit_id: String,
    pub raw_text: String,
    pub suggested_category: Option<String>,
    pub confidence: Option<f64>,
    pub has_open_clarification: bool,
    pub created_at: DateTime<Utc>,
}

/// Unresolved captures, newest first.
pub async fn list_needs_review(pool: &SqlitePool, limit: i64) -> Result<Vec<ReviewEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT a.id, a.raw_text, a.category, a.confidence, a.created_at,
               p.id IS NOT NULL AS has_pending
        FROM audit_log a
        LEFT JOIN pending_clarifications p ON p.audit_entry_id = a.id
        WHERE a.status = 'needs_review'
        ORDER BY a.created_at DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ReviewEntry {
            audit_id: row.get("id"),
            raw_text: row.get("raw_text"),
            suggested_category: row.get("category"),
            confidence: row.get("confidence"),
            has_open_clarification: row.get("has_pending"),
            created_at: row.get("created_at"),
        })
        .collect())
}

/// Capture counts by status
#[derive(Debug, Clone, Serialize)]
pub struct StatusCounts {
    pub total: i64,
    pub filed: i64,
    pub needs_review: i64,
    pub fixed: i64,
}

/// Count audit entries by status since a cutoff.
pub async fn status_counts(pool: &SqlitePool, since: DateTime<Utc>) -> Result<StatusCounts> {
    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS total,
            COALESCE(SUM(status = 'filed'), 0) AS filed,
            COALESCE(SUM(status = 'needs_review'), 0) AS needs_review,
            COALESCE(SUM(status = 'fixed'), 0) AS fixed
        FROM audit_log
        WHERE created_at >= ?
        "#,
    )
    .bind(since)
    .fetch_one(pool)
    .await?;

    Ok(StatusCounts {
        total: row.get("total"),
        filed: row.get("filed"),
        needs_review: row.get("needs_review"),
        fixed: row.get("fixed"),
    })
}
