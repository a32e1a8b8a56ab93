//! Clarification replies: a category token files the held message, `skip`
//! discards it, anything else re-prompts and leaves the question open.

use notegate_common::db::models::{AuditEntry, PendingClarification};
use notegate_common::events::CaptureEvent;
use notegate_common::Category;
use tracing::info;
use uuid::Uuid;

use crate::db::{clarifications, retry::retry_on_lock, MAX_LOCK_WAIT_MS};
use crate::error::IngestError;
use crate::ingest::{extract_for, note_response_ref, replies, reply_best_effort, AckOutcome, InboundAck};
use crate::AppState;

/// A recognized clarification reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyToken {
    Category(Category),
    Skip,
}

/// Parse a clarification reply. Single tokens only; anything longer is
/// treated as unrecognized so free-text replies never file silently.
pub fn parse_reply_token(text: &str) -> Option<ReplyToken> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("skip") {
        return Some(ReplyToken::Skip);
    }
    if trimmed.split_whitespace().count() != 1 {
        return None;
    }
    Category::parse_token(trimmed).map(ReplyToken::Category)
}

/// Handle a reply that traced to an open clarification.
pub async fn resolve_reply(
    state: &AppState,
    pending: PendingClarification,
    entry: AuditEntry,
    text: &str,
    reply_ref: &str,
) -> Result<InboundAck, IngestError> {
    match parse_reply_token(text) {
        Some(ReplyToken::Category(category)) => {
            resolve(state, &pending, &entry, category, reply_ref).await
        }
        Some(ReplyToken::Skip) => discard(state, &pending, &entry, reply_ref).await,
        None => {
            // Question stays open; point the entry at the re-prompt so a
            // reply to it still traces.
            let retry_text = replies::clarification_retry();
            if let Some(sent_ref) = reply_best_effort(state, &retry_text, Some(reply_ref)).await {
                note_response_ref(state, &entry.id, &sent_ref).await;
            }
            Ok(InboundAck {
                outcome: AckOutcome::Error,
                audit_id: Some(entry.id.clone()),
                detail: Some("unrecognized clarification reply".to_string()),
            })
        }
    }
}

/// File the held message under the user's chosen category.
async fn resolve(
    state: &AppState,
    pending: &PendingClarification,
    entry: &AuditEntry,
    category: Category,
    reply_ref: &str,
) -> Result<InboundAck, IngestError> {
    // Extract before touching state so a classifier failure leaves the
    // clarification open for another try.
    let (fields, tags) = extract_for(state, category, &entry.raw_text).await?;
    let record_id = Uuid::new_v4().to_string();

    let resolved = retry_on_lock("resolve clarification", MAX_LOCK_WAIT_MS, || {
        clarifications::resolve_into_record(
            &state.db,
            &pending.id,
            &entry.id,
            &record_id,
            category,
            &fields,
            &tags,
        )
    })
    .await?;

    if !resolved {
        let text = "That clarification was already settled.";
        reply_best_effort(state, text, Some(reply_ref)).await;
        return Ok(InboundAck {
            outcome: AckOutcome::Noop,
            audit_id: Some(entry.id.clone()),
            detail: Some(text.to_string()),
        });
    }

    info!(
        audit_id = %entry.id,
        category = %category,
        "Clarification resolved"
    );

    let confirmation = replies::resolved(category, fields.title());
    if let Some(sent_ref) = reply_best_effort(state, &confirmation, Some(reply_ref)).await {
        note_response_ref(state, &entry.id, &sent_ref).await;
    }

    state.event_bus.emit_lossy(CaptureEvent::ClarificationResolved {
        audit_id: entry.id.clone(),
        category,
        timestamp: chrono::Utc::now(),
    });

    Ok(InboundAck {
        outcome: AckOutcome::Resolved,
        audit_id: Some(entry.id.clone()),
        detail: Some(format!("filed as {}", category)),
    })
}

/// Drop the question. The audit entry stays in review and can still be
/// filed later with a fix.
async fn discard(
    state: &AppState,
    pending: &PendingClarification,
    entry: &AuditEntry,
    reply_ref: &str,
) -> Result<InboundAck, IngestError> {
    let deleted = retry_on_lock("discard clarification", MAX_LOCK_WAIT_MS, || {
        clarifications::delete_guarded(&state.db, &pending.id)
    })
    .await?;

    if !deleted {
        let text = "That clarification was already settled.";
        reply_best_effort(state, text, Some(reply_ref)).await;
        return Ok(InboundAck {
            outcome: AckOutcome::Noop,
            audit_id: Some(entry.id.clone()),
            detail: Some(text.to_string()),
        });
    }

    info!(audit_id = %entry.id, "Clarification discarded");

    if let Some(sent_ref) = reply_best_effort(state, &replies::discarded(), Some(reply_ref)).await {
        note_response_ref(state, &entry.id, &sent_ref).await;
    }

    state.event_bus.emit_lossy(CaptureEvent::ClarificationDiscarded {
        audit_id: entry.id.clone(),
        timestamp: chrono::Utc::now(),
    });

    Ok(InboundAck {
        outcome: AckOutcome::Discarded,
        audit_id: Some(entry.id.clone()),
        detail: None,
    })
}
