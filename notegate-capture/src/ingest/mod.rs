//! Inbound message handling.
//!
//! Every message from the gateway flows through [`handle_inbound`], which
//! dispatches in a fixed order: empty check, query commands, then (for
//! replies) fixes and clarification answers, and finally fresh capture.
//! Query commands are answered for replies too, so asking `?projects`
//! while a clarification is open leaves the question open.

pub mod clarify;
pub mod commands;
pub mod fixes;
pub mod prefix;
pub mod replies;
pub mod router;

use notegate_common::records::RecordFields;
use notegate_common::{Category, CategoryKind};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::db::{audit, clarifications};
use crate::error::IngestError;
use crate::services::ClassifyOutcome;
use crate::AppState;

/// A message delivered by the chat gateway webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    pub text: String,
    /// Gateway-assigned ref of this message, unique per delivery.
    pub source_ref: String,
    /// Ref of the message this one replies to, when the user replied.
    #[serde(default)]
    pub reply_to: Option<String>,
}

/// What the service did with one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckOutcome {
    Filed,
    ClarificationRequested,
    NeedsReview,
    Resolved,
    Discarded,
    Fixed,
    Noop,
    Duplicate,
    Command,
    Error,
}

/// Webhook response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundAck {
    pub outcome: AckOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Process one inbound message end to end.
///
/// Errors the user can act on are converted into a chat reply and an
/// `error`-flavored ack; storage errors propagate so the webhook returns
/// 500 and the gateway redelivers (dedupe makes redelivery safe).
pub async fn handle_inbound(
    state: &AppState,
    message: InboundMessage,
) -> Result<InboundAck, IngestError> {
    let text = message.text.trim();
    if text.is_empty() {
        let detail = "Nothing to capture in an empty message.";
        reply_best_effort(state, detail, Some(&message.source_ref)).await;
        return Ok(InboundAck {
            outcome: AckOutcome::Error,
            audit_id: None,
            detail: Some(detail.to_string()),
        });
    }

    if let Some(command) = commands::parse_command(text) {
        let reply = commands::handle_command(&state.db, command).await?;
        reply_best_effort(state, &reply, Some(&message.source_ref)).await;
        return Ok(InboundAck {
            outcome: AckOutcome::Command,
            audit_id: None,
            detail: None,
        });
    }

    let result = match message.reply_to.as_deref() {
        Some(reply_to) => handle_reply(state, text, &message.source_ref, reply_to).await,
        None => handle_fresh(state, text, &message.source_ref).await,
    };

    match result {
        Ok(ack) => Ok(ack),
        Err(err) if err.is_user_recoverable() => {
            Ok(recover_to_reply(state, &message.source_ref, err).await)
        }
        Err(err) => Err(err),
    }
}

async fn handle_fresh(
    state: &AppState,
    text: &str,
    source_ref: &str,
) -> Result<InboundAck, IngestError> {
    // A fix outside a reply has no target to trace.
    if fixes::is_fix_command(text) {
        let detail = "Reply to the message you want to fix.";
        reply_best_effort(state, detail, Some(source_ref)).await;
        return Ok(InboundAck {
            outcome: AckOutcome::Error,
            audit_id: None,
            detail: Some(detail.to_string()),
        });
    }
    router::route_capture(state, text, source_ref).await
}

async fn handle_reply(
    state: &AppState,
    text: &str,
    source_ref: &str,
    reply_to: &str,
) -> Result<InboundAck, IngestError> {
    if fixes::is_fix_command(text) {
        return fixes::handle_fix(state, text, source_ref, reply_to).await;
    }

    if let Some((pending, entry)) =
        clarifications::find_by_reply_target(&state.db, reply_to).await?
    {
        return clarify::resolve_reply(state, pending, entry, text, source_ref).await;
    }

    // A lone category token or `skip` with nothing open is almost always
    // a late answer, not a note. Refuse instead of capturing it.
    if clarify::parse_reply_token(text).is_some() {
        let detail = "Nothing is waiting on that message.";
        reply_best_effort(state, detail, Some(source_ref)).await;
        return Ok(InboundAck {
            outcome: AckOutcome::Error,
            audit_id: None,
            detail: Some(detail.to_string()),
        });
    }

    // Any other reply is ordinary capture; threading carries no meaning
    // beyond fixes and clarifications.
    router::route_capture(state, text, source_ref).await
}

/// Turn a user-recoverable pipeline error into a chat reply and an ack.
async fn recover_to_reply(state: &AppState, source_ref: &str, err: IngestError) -> InboundAck {
    let (outcome, text) = match &err {
        IngestError::AlreadyInTargetCategory(category) => (
            AckOutcome::Noop,
            format!("Already filed as {}.", category),
        ),
        IngestError::UnresolvedReference(_) => (
            AckOutcome::Error,
            "Couldn't trace that reply to a captured message.".to_string(),
        ),
        IngestError::DuplicateMessage(_) => {
            (AckOutcome::Duplicate, "Already captured that one.".to_string())
        }
        IngestError::ClassificationTransient(_) => (
            AckOutcome::Error,
            "The classifier is unavailable right now; try again shortly.".to_string(),
        ),
        IngestError::ClassificationPermanent(_) => (
            AckOutcome::Error,
            "Couldn't extract fields for that category.".to_string(),
        ),
        _ => (
            AckOutcome::Error,
            "Something went wrong handling that message.".to_string(),
        ),
    };
    reply_best_effort(state, &text, Some(source_ref)).await;
    InboundAck {
        outcome,
        audit_id: None,
        detail: Some(err.to_string()),
    }
}

/// Extract fields for a known target category (clarifications and fixes).
///
/// Reference targets are parsed deterministically from the message body;
/// dynamic targets go to the classifier constrained to the category.
pub(crate) async fn extract_for(
    state: &AppState,
    category: Category,
    text: &str,
) -> Result<(RecordFields, Vec<String>), IngestError> {
    match category.kind() {
        CategoryKind::Reference => {
            // The body may still carry a reference prefix when a fix moves
            // a capture between reference categories; the prefix addresses,
            // the body is the content.
            let body = match prefix::parse_reference(text) {
                Some((_, body)) => body,
                None => text.trim(),
            };
            let fields = prefix::reference_fields(category, body).ok_or_else(|| {
                IngestError::Common(notegate_common::Error::Internal(format!(
                    "no field template for {}",
                    category
                )))
            })?;
            Ok((fields, Vec::new()))
        }
        CategoryKind::Dynamic => match state.classifier.classify(text, Some(category)).await {
            ClassifyOutcome::Success(classification) => {
                Ok((classification.fields, classification.tags))
            }
            ClassifyOutcome::Transient { reason } => {
                Err(IngestError::ClassificationTransient(reason))
            }
            ClassifyOutcome::Permanent { reason } => {
                Err(IngestError::ClassificationPermanent(reason))
            }
        },
    }
}

/// Send a chat reply, logging instead of failing. Returns the gateway ref
/// of the sent message when it went through.
pub(crate) async fn reply_best_effort(
    state: &AppState,
    text: &str,
    in_reply_to: Option<&str>,
) -> Option<String> {
    match state.transport.send(text, in_reply_to).await {
        Ok(message_ref) => Some(message_ref),
        Err(err) => {
            warn!("Failed to send chat reply: {}", err);
            None
        }
    }
}

/// Record the latest outbound ref for an entry, best effort.
pub(crate) async fn note_response_ref(state: &AppState, audit_id: &str, sent_ref: &str) {
    if let Err(err) = audit::set_response_ref(&state.db, audit_id, sent_ref).await {
        warn!(audit_id = %audit_id, "Failed to record response ref: {}", err);
    }
}
