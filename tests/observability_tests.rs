mod common;

use agent_wallet_service::api::routes::{create_router, AppState};
use agent_wallet_service::observability::HealthChecker;
use agent_wallet_service::services::RateLimiter;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;

#[tokio::test]
async fn test_health_endpoint_reports_healthy_with_live_database() {
    let pool = common::setup_test_db().await;

    let state = AppState::new(pool.clone(), Arc::new(RateLimiter::new(10_000.0)));
    let router = create_router(state);

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_detailed_health_reports_database_dependency() {
    let pool = common::setup_test_db().await;

    let state = AppState::new(pool.clone(), Arc::new(RateLimiter::new(10_000.0)))
        .with_health_checker(Arc::new(HealthChecker::new(pool.clone())));
    let router = create_router(state);

    let response = router
        .oneshot(Request::builder().uri("/health/detailed").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["dependencies"][0]["name"], "database");
}

#[tokio::test]
async fn test_readiness_and_liveness_endpoints() {
    let pool = common::setup_test_db().await;
    let state = AppState::new(pool.clone(), Arc::new(RateLimiter::new(10_000.0)));
    let router = create_router(state);

    let ready = router
        .clone()
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(ready.status(), StatusCode::OK);

    let live = router
        .oneshot(Request::builder().uri("/live").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(live.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_endpoint_without_handle_returns_empty_body() {
    let pool = common::setup_test_db().await;
    let state = AppState::new(pool.clone(), Arc::new(RateLimiter::new(10_000.0)));
    let router = create_router(state);

    let response = router
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());
}
