//! Health and metrics endpoint tests

use axum::http::StatusCode;
use serde_json::Value;

use crate::common::TestApp;

#[tokio::test]
async fn test_health_check_returns_ok() {
    let app = TestApp::new();
    let server = app.server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_readiness_reports_store_and_sessions() {
    let app = TestApp::new();
    app.seed_user(10);
    let _session = app.connect(10);
    let server = app.server();

    let response = server.get("/health/ready").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["store"]["backend"], "memory");
    assert_eq!(body["checks"]["gateway"]["active_sessions"], 1);
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_prometheus_text() {
    let app = TestApp::new();
    app.seed_user(10);
    let _session = app.connect(10);
    let server = app.server();

    let response = server.get("/metrics").await;

    response.assert_status(StatusCode::OK);
    assert!(response.text().contains("groupchat_gateway_sessions_active"));
}

#[tokio::test]
async fn test_gateway_rejects_unknown_token_before_upgrade() {
    let app = TestApp::new();
    let server = app.server();

    let response = server
        .get("/gateway")
        .add_query_param("token", "nope")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_check_through_router_service() {
    use axum::{body::Body, http::Request};
    use groupchat_server::startup::build_router;
    use tower::ServiceExt;

    let app = TestApp::new();
    let response = build_router(app.state.clone())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
