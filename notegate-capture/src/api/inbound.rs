//! Gateway webhook endpoint.
//!
//! A non-2xx response tells the gateway to redeliver; dedupe on
//! source_ref makes that safe, so storage failures map to 500 while
//! everything the user can act on comes back 200 with an ack.

use axum::{extract::State, routing::post, Json, Router};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::ingest::{self, InboundAck, InboundMessage};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/message", post(receive_message))
}

/// POST /api/message - one delivered chat message
async fn receive_message(
    State(state): State<AppState>,
    Json(message): Json<InboundMessage>,
) -> ApiResult<Json<InboundAck>> {
    if message.source_ref.trim().is_empty() {
        return Err(ApiError::BadRequest("source_ref is required".to_string()));
    }

    debug!(
        source_ref = %message.source_ref,
        reply_to = ?message.reply_to,
        "Inbound message"
    );

    let ack = ingest::handle_inbound(&state, message)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(Json(ack))
}
