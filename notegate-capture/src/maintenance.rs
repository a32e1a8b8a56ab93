//! Background maintenance: the stale clarification sweeper.

use chrono::{Duration, Utc};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::db::clarifications;
use crate::AppState;

/// Spawn the periodic sweep that expires clarifications nobody answered.
///
/// A swept question behaves exactly like a skipped one: the pending row
/// goes away, the audit entry stays in review and remains fixable.
pub fn spawn_stale_clarification_sweeper(state: AppState) -> JoinHandle<()> {
    let sweep_interval =
        std::time::Duration::from_secs(state.config.clarifications.sweep_interval_secs.max(1));
    let stale_after_days = state.config.clarifications.stale_after_days;

    tokio::spawn(async move {
        let mut ticker = interval(sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let cutoff = Utc::now() - Duration::days(stale_after_days as i64);
            match clarifications::delete_stale(&state.db, cutoff).await {
                Ok(0) => {}
                Ok(swept) => info!(swept, "Swept stale clarifications"),
                Err(err) => warn!("Stale clarification sweep failed: {}", err),
            }
        }
    })
}
