//! Server-Sent Events stream of capture events.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{routing::get, Router};
use futures::Stream;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/events", get(event_stream))
}

/// GET /api/events - live capture events as SSE
///
/// Slow consumers are skipped past, not buffered forever; a lag notice
/// goes to the log and the stream continues from the newest event.
async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.event_bus.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("ConnectionStatus").data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => {
                        yield Ok(Event::default().event(event.event_type()).data(json));
                    }
                    Err(err) => warn!("Failed to serialize capture event: {}", err),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!("SSE subscriber lagged, skipped {} events", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
