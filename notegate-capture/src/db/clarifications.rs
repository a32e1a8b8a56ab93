//! Pending clarification queries.
//!
//! At most one open clarification exists per audit entry (UNIQUE on
//! audit_entry_id). Deletes are guarded by rows_affected so concurrent
//! answers, fixes and the sweeper settle each clarification exactly once.

use chrono::{DateTime, Utc};
use notegate_common::categories::Category;
use notegate_common::db::models::{AuditEntry, PendingClarification};
use notegate_common::records::RecordFields;
use notegate_common::Result;
use sqlx::SqlitePool;

use crate::db::records;

/// Find the open clarification a reply resolves, with its audit entry.
///
/// The user may answer the original prompt, the latest outbound message
/// for the entry (a re-prompt), or their own original message; all three
/// trace to the same row.
pub async fn find_by_reply_target(
    pool: &SqlitePool,
    reply_ref: &str,
) -> Result<Option<(PendingClarification, AuditEntry)>> {
    let pending = sqlx::query_as::<_, PendingClarification>(
        r#"
        SELECT p.id, p.audit_entry_id, p.prompt_ref, p.suggested_category, p.created_at
        FROM pending_clarifications p
        JOIN audit_log a ON a.id = p.audit_entry_id
        WHERE p.prompt_ref = ? OR a.source_ref = ? OR a.response_ref = ?
        "#,
    )
    .bind(reply_ref)
    .bind(reply_ref)
    .bind(reply_ref)
    .fetch_optional(pool)
    .await?;

    let Some(pending) = pending else {
        return Ok(None);
    };

    let entry = sqlx::query_as::<_, AuditEntry>(
        r#"
        SELECT id, raw_text, category, record_id, confidence, status, source_ref, response_ref, created_at
        FROM audit_log
        WHERE id = ?
        "#,
    )
    .bind(&pending.audit_entry_id)
    .fetch_optional(pool)
    .await?;

    Ok(entry.map(|entry| (pending, entry)))
}

/// Guarded delete. True when this call removed the row.
pub async fn delete_guarded(pool: &SqlitePool, pending_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM pending_clarifications WHERE id = ?")
        .bind(pending_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Resolve a clarification into a filed record in one transaction.
///
/// Returns false without writing anything when the pending row was
/// already gone (another reply, a fix, or the sweeper won the race).
pub async fn resolve_into_record(
    pool: &SqlitePool,
    pending_id: &str,
    audit_id: &str,
    record_id: &str,
    category: Category,
    fields: &RecordFields,
    tags: &[String],
) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM pending_clarifications WHERE id = ?")
        .bind(pending_id)
        .execute(&mut *tx)
        .await?;
    if deleted.rows_affected() != 1 {
        tx.rollback().await?;
        return Ok(false);
    }

    records::insert_record(&mut *tx, record_id, fields, tags).await?;

    // User-declared category: full confidence, entry becomes 'filed'
    sqlx::query(
        "UPDATE audit_log SET category = ?, record_id = ?, confidence = 1.0, status = 'filed' WHERE id = ?",
    )
    .bind(category.as_str())
    .bind(record_id)
    .bind(audit_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(true)
}

/// Drop clarifications older than the cutoff. Returns the count removed.
///
/// Audit entries stay 'needs_review'; a swept question is the same as a
/// discarded one.
pub async fn delete_stale(pool: &SqlitePool, cutoff: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM pending_clarifications WHERE created_at < ?")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Number of open clarifications.
pub async fn count_open(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM pending_clarifications")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
