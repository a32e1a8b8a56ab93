//! HTTP surface tests: webhook, review queue, stats, health and SSE,
//! driven through the router with tower's oneshot.

mod helpers;

use helpers::*;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health_endpoint() {
    let h = harness(vec![]).await;
    let app = notegate_capture::build_router(h.state.clone());

    let (status, body) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "notegate-capture");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_message_requires_source_ref() {
    let h = harness(vec![]).await;
    let app = notegate_capture::build_router(h.state.clone());

    let (status, body) = post_json(
        app,
        "/api/message",
        json!({ "text": "hello", "source_ref": "" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_message_with_missing_fields_is_client_error() {
    let h = harness(vec![]).await;
    let app = notegate_capture::build_router(h.state.clone());

    let (status, _) = post_json(app, "/api/message", json!({ "text": "hello" })).await;

    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_message_endpoint_files_capture() {
    let h = harness(vec![people_outcome(0.9)]).await;
    let app = notegate_capture::build_router(h.state.clone());

    let (status, body) = post_json(
        app,
        "/api/message",
        json!({ "text": "met Dana at the meetup", "source_ref": "u-1" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "filed");
    assert!(body["audit_id"].is_string());
    assert_eq!(count_rows(&h.state.db, "people").await, 1);
}

#[tokio::test]
async fn test_message_endpoint_reports_clarification() {
    let h = harness(vec![idea_outcome(0.45)]).await;
    let app = notegate_capture::build_router(h.state.clone());

    let (status, body) = post_json(
        app,
        "/api/message",
        json!({ "text": "maybe a newsletter?", "source_ref": "u-1" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "clarification_requested");
}

#[tokio::test]
async fn test_review_endpoint_lists_unresolved() {
    let h = harness(vec![transient("connect refused")]).await;
    let app = notegate_capture::build_router(h.state.clone());

    let (status, _) = post_json(
        app.clone(),
        "/api/message",
        json!({ "text": "some message", "source_ref": "u-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get_json(app, "/api/review").await;

    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["raw_text"], "some message");
    assert_eq!(entries[0]["has_open_clarification"], false);
    assert!(entries[0]["suggested_category"].is_null());
}

#[tokio::test]
async fn test_stats_endpoint_counts_by_status() {
    let h = harness(vec![transient("down")]).await;
    let app = notegate_capture::build_router(h.state.clone());

    post_json(
        app.clone(),
        "/api/message",
        json!({ "text": "decision: use sqlite because zero ops", "source_ref": "u-1" }),
    )
    .await;
    post_json(
        app.clone(),
        "/api/message",
        json!({ "text": "some message", "source_ref": "u-2" }),
    )
    .await;

    let (status, body) = get_json(app, "/api/stats?days=30").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["days"], 30);
    assert_eq!(body["total"], 2);
    assert_eq!(body["filed"], 1);
    assert_eq!(body["needs_review"], 1);
    assert_eq!(body["fixed"], 0);
    assert_eq!(body["open_clarifications"], 0);
}

#[tokio::test]
async fn test_events_endpoint_is_an_event_stream() {
    let h = harness(vec![]).await;
    let app = notegate_capture::build_router(h.state.clone());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/events")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("text/event-stream"));
}
