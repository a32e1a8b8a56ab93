//! The fix protocol: `fix: <category>` as a reply re-files a capture.
//!
//! The reply target is traced in two hops: the user's original message
//! (source_ref) first, then this service's own confirmation or prompt
//! (response_ref). Extraction for the new category happens before the old
//! record is touched, so a failed fix changes nothing.

use notegate_common::db::models::AuditEntry;
use notegate_common::events::CaptureEvent;
use notegate_common::Category;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db::{audit, retry::retry_on_lock, MAX_LOCK_WAIT_MS};
use crate::error::IngestError;
use crate::ingest::{extract_for, note_response_ref, replies, reply_best_effort, AckOutcome, InboundAck};
use crate::AppState;

/// Whether a message is shaped like a fix command at all.
pub fn is_fix_command(text: &str) -> bool {
    let trimmed = text.trim_start();
    matches!(trimmed.get(..4), Some(head) if head.eq_ignore_ascii_case("fix:"))
}

/// Parse the target category out of a fix command.
pub fn parse_fix_target(text: &str) -> Option<Category> {
    let trimmed = text.trim_start();
    if !is_fix_command(trimmed) {
        return None;
    }
    Category::parse_token(&trimmed[4..])
}

/// Trace a reply target to its audit entry: the user's message first,
/// then the latest outbound message for an entry.
pub async fn resolve_audit_entry(
    pool: &SqlitePool,
    reply_ref: &str,
) -> Result<Option<AuditEntry>, IngestError> {
    if let Some(entry) = audit::find_by_source_ref(pool, reply_ref).await? {
        return Ok(Some(entry));
    }
    Ok(audit::find_by_response_ref(pool, reply_ref).await?)
}

/// Apply a fix command sent as a reply.
pub async fn handle_fix(
    state: &AppState,
    text: &str,
    source_ref: &str,
    reply_to: &str,
) -> Result<InboundAck, IngestError> {
    let Some(target) = parse_fix_target(text) else {
        let usage = replies::fix_usage();
        reply_best_effort(state, &usage, Some(source_ref)).await;
        return Ok(InboundAck {
            outcome: AckOutcome::Error,
            audit_id: None,
            detail: Some("unrecognized fix target".to_string()),
        });
    };

    let entry = resolve_audit_entry(&state.db, reply_to)
        .await?
        .ok_or_else(|| IngestError::UnresolvedReference(reply_to.to_string()))?;

    let current = entry.category();
    if current == Some(target) {
        return Err(IngestError::AlreadyInTargetCategory(target.to_string()));
    }

    // Extract first; only a successful extraction may modify state.
    let (fields, tags) = extract_for(state, target, &entry.raw_text).await?;
    let record_id = Uuid::new_v4().to_string();

    retry_on_lock("apply fix", MAX_LOCK_WAIT_MS, || {
        audit::apply_fix(&state.db, &entry, target, &record_id, &fields, &tags)
    })
    .await?;

    info!(
        audit_id = %entry.id,
        from = current.map(|c| c.as_str()).unwrap_or("unfiled"),
        to = %target,
        "Capture fixed"
    );

    let confirmation = replies::fixed(current, target, fields.title());
    if let Some(sent_ref) = reply_best_effort(state, &confirmation, Some(source_ref)).await {
        note_response_ref(state, &entry.id, &sent_ref).await;
    }

    state.event_bus.emit_lossy(CaptureEvent::CaptureFixed {
        audit_id: entry.id.clone(),
        from_category: current,
        to_category: target,
        timestamp: chrono::Utc::now(),
    });

    Ok(InboundAck {
        outcome: AckOutcome::Fixed,
        audit_id: Some(entry.id),
        detail: Some(format!("moved to {}", target)),
    })
}
