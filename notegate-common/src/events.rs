//! Capture event types and the broadcast bus.
//!
//! Events are broadcast via [`EventBus`] and serialized as-is for SSE
//! transmission. All notegate services use this central enum so consumers
//! can match exhaustively.

use crate::categories::Category;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Capture pipeline events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CaptureEvent {
    /// A message was filed into a category store.
    ///
    /// Emitted for direct prefix captures, confident classifications and
    /// clarification resolutions alike.
    MessageFiled {
        /// Audit entry for the source message
        audit_id: String,
        /// Category the record landed in
        category: Category,
        /// New record's id in the category table
        record_id: String,
        /// Recorded confidence (1.0 for user-declared categories)
        confidence: f64,
        /// When the record was filed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Classification confidence fell below the gate and the user was asked.
    ClarificationRequested {
        audit_id: String,
        /// Oracle's best guess, if it produced one
        suggested_category: Option<Category>,
        suggested_confidence: Option<f64>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An open clarification was answered with a category token.
    ClarificationResolved {
        audit_id: String,
        category: Category,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An open clarification was answered with the discard token.
    ClarificationDiscarded {
        audit_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A previously audited message was re-filed via the fix protocol.
    CaptureFixed {
        audit_id: String,
        /// Category before the fix; None when nothing had been filed
        from_category: Option<Category>,
        to_category: Category,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The classification oracle failed for a message.
    ClassificationFailed {
        audit_id: String,
        /// Whether a retry might have helped (transient vs permanent)
        retryable: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl CaptureEvent {
    /// Get event type as string for the SSE `event:` field
    pub fn event_type(&self) -> &str {
        match self {
            CaptureEvent::MessageFiled { .. } => "MessageFiled",
            CaptureEvent::ClarificationRequested { .. } => "ClarificationRequested",
            CaptureEvent::ClarificationResolved { .. } => "ClarificationResolved",
            CaptureEvent::ClarificationDiscarded { .. } => "ClarificationDiscarded",
            CaptureEvent::CaptureFixed { .. } => "CaptureFixed",
            CaptureEvent::ClassificationFailed { .. } => "ClassificationFailed",
        }
    }
}

/// Broadcast bus for capture events.
///
/// Thin wrapper over `tokio::sync::broadcast`: emission never blocks, any
/// number of subscribers may listen, and slow subscribers lag rather than
/// hold up the pipeline.
///
/// # Examples
///
/// ```
/// use notegate_common::events::EventBus;
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CaptureEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events.
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers.
    ///
    /// Returns `Ok(subscriber_count)`, or `Err` when nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: CaptureEvent,
    ) -> Result<usize, broadcast::error::SendError<CaptureEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring whether anyone is listening.
    ///
    /// The capture pipeline uses this form everywhere: events are
    /// observability, never control flow.
    pub fn emit_lossy(&self, event: CaptureEvent) {
        let _ = self.tx.send(event);
    }

    /// Configured channel capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
