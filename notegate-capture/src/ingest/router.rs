//! The capture path: dedupe, reference prefixes, the classification
//! oracle, and the confidence gate.
//!
//! Ordering is the contract here. Dedupe runs before classification so a
//! redelivered message never spends an oracle call; a reference prefix
//! files directly without one; and a clarification prompt is sent before
//! its pending row exists, so the store never holds a question the user
//! was never asked.

use std::time::Duration;

use notegate_common::events::CaptureEvent;
use notegate_common::records::RecordFields;
use notegate_common::Category;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{audit, is_unique_violation, retry::retry_on_lock, MAX_LOCK_WAIT_MS};
use crate::error::IngestError;
use crate::ingest::{note_response_ref, prefix, replies, reply_best_effort, AckOutcome, InboundAck};
use crate::services::{Classification, ClassifyOutcome};
use crate::AppState;

/// Capture a non-command, non-clarification, non-fix message.
pub async fn route_capture(
    state: &AppState,
    text: &str,
    source_ref: &str,
) -> Result<InboundAck, IngestError> {
    if let Some(existing) = audit::find_by_source_ref(&state.db, source_ref).await? {
        let detail = match &existing.category {
            Some(category) => format!(
                "Already handled that message (status: {}, category: {}).",
                existing.status, category
            ),
            None => format!("Already handled that message (status: {}).", existing.status),
        };
        reply_best_effort(state, &detail, Some(source_ref)).await;
        return Ok(InboundAck {
            outcome: AckOutcome::Duplicate,
            audit_id: Some(existing.id.clone()),
            detail: Some(detail),
        });
    }

    // User-declared category: no oracle, full confidence
    if let Some((category, body)) = prefix::parse_reference(text) {
        let fields = prefix::reference_fields(category, body).ok_or_else(|| {
            IngestError::Common(notegate_common::Error::Internal(format!(
                "no field template for {}",
                category
            )))
        })?;
        return file_capture(state, text, source_ref, category, &fields, &[], 1.0).await;
    }

    let deadline_ms = state.config.classifier.overall_deadline_ms;
    let classify = state.classifier.classify(text, None);
    let outcome = match tokio::time::timeout(Duration::from_millis(deadline_ms), classify).await {
        Ok(outcome) => outcome,
        Err(_) => ClassifyOutcome::Transient {
            reason: format!("classification exceeded {}ms deadline", deadline_ms),
        },
    };

    match outcome {
        ClassifyOutcome::Success(classification) => {
            let threshold = state.config.threshold_for(classification.category);
            // Inclusive gate: confidence equal to the threshold files
            if classification.confidence >= threshold {
                file_capture(
                    state,
                    text,
                    source_ref,
                    classification.category,
                    &classification.fields,
                    &classification.tags,
                    classification.confidence,
                )
                .await
            } else {
                request_clarification(state, text, source_ref, &classification, threshold).await
            }
        }
        ClassifyOutcome::Transient { reason } => {
            record_failure(state, text, source_ref, &reason, true).await
        }
        ClassifyOutcome::Permanent { reason } => {
            record_failure(state, text, source_ref, &reason, false).await
        }
    }
}

/// File a capture: record plus audit entry in one transaction, then the
/// confirmation reply and event.
async fn file_capture(
    state: &AppState,
    text: &str,
    source_ref: &str,
    category: Category,
    fields: &RecordFields,
    tags: &[String],
    confidence: f64,
) -> Result<InboundAck, IngestError> {
    let audit_id = Uuid::new_v4().to_string();
    let record_id = Uuid::new_v4().to_string();

    retry_on_lock("file capture", MAX_LOCK_WAIT_MS, || {
        audit::file_capture(
            &state.db,
            &audit_id,
            &record_id,
            text,
            source_ref,
            category,
            fields,
            tags,
            confidence,
        )
    })
    .await
    .map_err(|err| as_ingest(err, source_ref))?;

    info!(
        audit_id = %audit_id,
        category = %category,
        confidence,
        "Message filed"
    );

    let confirmation = replies::filed(category, fields.title(), confidence);
    if let Some(sent_ref) = reply_best_effort(state, &confirmation, Some(source_ref)).await {
        note_response_ref(state, &audit_id, &sent_ref).await;
    }

    state.event_bus.emit_lossy(CaptureEvent::MessageFiled {
        audit_id: audit_id.clone(),
        category,
        record_id,
        confidence,
        timestamp: chrono::Utc::now(),
    });

    Ok(InboundAck {
        outcome: AckOutcome::Filed,
        audit_id: Some(audit_id),
        detail: Some(format!("filed as {}", category)),
    })
}

/// Below the gate: ask the user, then record the held capture.
///
/// The prompt is sent first. If it cannot be delivered the entry is
/// parked for review with no pending row, since a question the user never
/// saw must not wait for an answer.
async fn request_clarification(
    state: &AppState,
    text: &str,
    source_ref: &str,
    classification: &Classification,
    threshold: f64,
) -> Result<InboundAck, IngestError> {
    let suggested = classification.category;
    let confidence = classification.confidence;
    let audit_id = Uuid::new_v4().to_string();

    info!(
        suggested = %suggested,
        confidence,
        threshold,
        "Confidence below threshold, asking for clarification"
    );

    let prompt = replies::clarification_prompt(suggested, confidence);
    let Some(prompt_ref) = reply_best_effort(state, &prompt, Some(source_ref)).await else {
        warn!("Clarification prompt not delivered, parking message for review");
        retry_on_lock("record needs_review", MAX_LOCK_WAIT_MS, || {
            audit::insert_needs_review(
                &state.db,
                &audit_id,
                text,
                source_ref,
                Some(suggested),
                Some(confidence),
            )
        })
        .await
        .map_err(|err| as_ingest(err, source_ref))?;

        return Ok(InboundAck {
            outcome: AckOutcome::NeedsReview,
            audit_id: Some(audit_id),
            detail: Some("clarification prompt could not be sent".to_string()),
        });
    };

    let pending_id = Uuid::new_v4().to_string();
    retry_on_lock("record clarification", MAX_LOCK_WAIT_MS, || {
        audit::insert_review_with_pending(
            &state.db,
            &audit_id,
            text,
            source_ref,
            suggested,
            confidence,
            &pending_id,
            &prompt_ref,
        )
    })
    .await
    .map_err(|err| as_ingest(err, source_ref))?;

    state.event_bus.emit_lossy(CaptureEvent::ClarificationRequested {
        audit_id: audit_id.clone(),
        suggested_category: Some(suggested),
        suggested_confidence: Some(confidence),
        timestamp: chrono::Utc::now(),
    });

    Ok(InboundAck {
        outcome: AckOutcome::ClarificationRequested,
        audit_id: Some(audit_id),
        detail: Some(format!("best guess {} at {:.2}", suggested, confidence)),
    })
}

/// Oracle trouble: park the message for review and tell the user.
///
/// Terminal for the inbound path either way; `retryable` only colors the
/// event so a dashboard can distinguish outage from nonsense.
async fn record_failure(
    state: &AppState,
    text: &str,
    source_ref: &str,
    reason: &str,
    retryable: bool,
) -> Result<InboundAck, IngestError> {
    warn!(retryable, "Classification failed: {}", reason);

    let audit_id = Uuid::new_v4().to_string();
    retry_on_lock("record needs_review", MAX_LOCK_WAIT_MS, || {
        audit::insert_needs_review(&state.db, &audit_id, text, source_ref, None, None)
    })
    .await
    .map_err(|err| as_ingest(err, source_ref))?;

    let notice = replies::classification_failed();
    if let Some(sent_ref) = reply_best_effort(state, &notice, Some(source_ref)).await {
        note_response_ref(state, &audit_id, &sent_ref).await;
    }

    state.event_bus.emit_lossy(CaptureEvent::ClassificationFailed {
        audit_id: audit_id.clone(),
        retryable,
        timestamp: chrono::Utc::now(),
    });

    Ok(InboundAck {
        outcome: AckOutcome::NeedsReview,
        audit_id: Some(audit_id),
        detail: Some(reason.to_string()),
    })
}

/// Audit inserts race concurrent redeliveries on the UNIQUE source_ref;
/// the loser reports a duplicate, not a storage failure.
fn as_ingest(err: notegate_common::Error, source_ref: &str) -> IngestError {
    if is_unique_violation(&err) {
        IngestError::DuplicateMessage(source_ref.to_string())
    } else {
        IngestError::Common(err)
    }
}
