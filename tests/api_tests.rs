mod common;

use agent_wallet_service::api::routes::{create_router, AppState};
use agent_wallet_service::models::WalletType;
use agent_wallet_service::services::RateLimiter;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app_state(pool: &sqlx::PgPool) -> AppState {
    AppState::new(pool.clone(), Arc::new(RateLimiter::new(10_000.0)))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("failed to read body");
    serde_json::from_slice(&bytes).expect("response body was not valid json")
}

#[tokio::test]
async fn test_get_my_wallet_requires_bearer_auth() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let router = create_router(app_state(&pool));
    let response = router
        .oneshot(
            Request::builder()
                .uri("/v1/wallets/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn test_get_my_wallet_returns_caller_wallet() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let wallet = common::create_wallet_with_handle(&pool, WalletType::Customer, "USD", "api-alice").await;
    let (_key, secret) = common::create_api_key_with_secret(&pool, wallet.id, vec!["wallet:read"]).await;

    let router = create_router(app_state(&pool));
    let response = router
        .oneshot(
            Request::builder()
                .uri("/v1/wallets/me")
                .header("authorization", format!("Bearer {}", secret))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["id"], wallet.id.to_string());
    assert_eq!(body["handle"], "@api-alice");

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn test_scope_mismatch_returns_forbidden() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let wallet = common::create_wallet(&pool, WalletType::Customer, "USD").await;
    let (_key, secret) = common::create_api_key_with_secret(&pool, wallet.id, vec!["wallet:read"]).await;

    let router = create_router(app_state(&pool));
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/transfers")
                .header("authorization", format!("Bearer {}", secret))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "to": {"kind": "handle", "value": "@nobody"},
                        "amount": "10.00",
                        "currency": "USD",
                        "idempotency_key": "scope-test-1"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert_eq!(body["error_code"], "FORBIDDEN_SCOPE");

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn test_transfer_endpoint_end_to_end() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let alice = common::create_wallet_with_handle(&pool, WalletType::Customer, "USD", "api-tf-alice").await;
    let _bob = common::create_wallet_with_handle(&pool, WalletType::Customer, "USD", "api-tf-bob").await;
    common::fund_wallet(&pool, alice.id, "USD", dec!(100.00)).await;
    let (_key, secret) = common::create_api_key_with_secret(&pool, alice.id, vec!["transfer:create"]).await;

    let router = create_router(app_state(&pool));
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/transfers")
                .header("authorization", format!("Bearer {}", secret))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "to": {"kind": "handle", "value": "@api-tf-bob"},
                        "amount": "25.00",
                        "currency": "USD",
                        "idempotency_key": "api-transfer-1"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let router = create_router(app_state(&pool));
    let response = router
        .oneshot(
            Request::builder()
                .uri("/v1/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn test_negative_amount_rejected_as_invalid_amount() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let wallet = common::create_wallet(&pool, WalletType::Customer, "USD").await;
    let (_key, secret) = common::create_api_key_with_secret(&pool, wallet.id, vec!["transfer:create"]).await;

    let router = create_router(app_state(&pool));
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/transfers")
                .header("authorization", format!("Bearer {}", secret))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "to": {"kind": "handle", "value": "@nobody"},
                        "amount": "-5.00",
                        "currency": "USD",
                        "idempotency_key": "bad-amount"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error_code"], "INVALID_AMOUNT");

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn test_missing_idempotency_key_returns_validation_error() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let wallet = common::create_wallet(&pool, WalletType::Customer, "USD").await;
    let (_key, secret) = common::create_api_key_with_secret(&pool, wallet.id, vec!["transfer:create"]).await;

    let router = create_router(app_state(&pool));
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/transfers")
                .header("authorization", format!("Bearer {}", secret))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "to": {"kind": "handle", "value": "@nobody"},
                        "amount": "5.00",
                        "currency": "USD",
                        "idempotency_key": ""
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error_code"], "VALIDATION_ERROR");

    common::cleanup_test_data(&pool).await;
}
