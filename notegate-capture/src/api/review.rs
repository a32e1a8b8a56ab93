//! Operator endpoints: the review queue and capture counts.

use axum::extract::{Query, State};
use axum::{routing::get, Json, Router};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{audit, clarifications};
use crate::error::ApiResult;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/review", get(list_review))
        .route("/api/stats", get(stats))
}

#[derive(Debug, Deserialize)]
struct ReviewParams {
    #[serde(default = "default_review_limit")]
    limit: i64,
}

fn default_review_limit() -> i64 {
    50
}

/// GET /api/review - unresolved captures, newest first
async fn list_review(
    State(state): State<AppState>,
    Query(params): Query<ReviewParams>,
) -> ApiResult<Json<Vec<audit::ReviewEntry>>> {
    let limit = params.limit.clamp(1, 500);
    let entries = audit::list_needs_review(&state.db, limit).await?;
    Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
struct StatsParams {
    #[serde(default = "default_stats_days")]
    days: i64,
}

fn default_stats_days() -> i64 {
    7
}

/// Stats response
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub days: i64,
    #[serde(flatten)]
    pub counts: audit::StatusCounts,
    pub open_clarifications: i64,
}

/// GET /api/stats - capture counts over a recent window
async fn stats(
    State(state): State<AppState>,
    Query(params): Query<StatsParams>,
) -> ApiResult<Json<StatsResponse>> {
    let days = params.days.clamp(1, 365);
    let since = Utc::now() - Duration::days(days);
    let counts = audit::status_counts(&state.db, since).await?;
    let open_clarifications = clarifications::count_open(&state.db).await?;
    Ok(Json(StatsResponse {
        days,
        counts,
        open_clarifications,
    }))
}
