use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::propagate_header::PropagateHeaderLayer;
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::observability::HealthChecker;
use crate::services::RateLimiter;

/// Application state shared across handlers. The engine's one real
/// dependency is Postgres; the rate limiter is process-local in-memory
/// state, not an external service.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub rate_limiter: Arc<RateLimiter>,
    pub metrics_handle: Option<PrometheusHandle>,
    pub health_checker: Option<Arc<HealthChecker>>,
}

impl AppState {
    pub fn new(pool: PgPool, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            pool,
            rate_limiter,
            metrics_handle: None,
            health_checker: None,
        }
    }

    /// Adds metrics handle to the state.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Adds health checker to the state.
    pub fn with_health_checker(mut self, checker: Arc<HealthChecker>) -> Self {
        self.health_checker = Some(checker);
        self
    }
}

/// Creates the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/health/detailed", get(handlers::detailed_health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/live", get(handlers::liveness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        // Wallet endpoints
        .route("/v1/wallets/me", get(handlers::get_my_wallet))
        .route("/v1/wallets/me/balance", get(handlers::get_my_balance))
        .route("/v1/wallets/me/transactions", get(handlers::list_my_transactions))
        .route("/v1/resolve", get(handlers::resolve_recipient))
        // Transfer
        .route("/v1/transfers", post(handlers::create_transfer))
        // Holds
        .route("/v1/holds", post(handlers::create_hold))
        .route("/v1/holds/:id/capture", post(handlers::capture_hold))
        .route("/v1/holds/:id/release", post(handlers::release_hold))
        // Payment intents
        .route("/v1/payment_intents", post(handlers::create_payment_intent))
        .route("/v1/payment_intents/:id/pay", post(handlers::pay_payment_intent))
        // Refunds
        .route("/v1/refunds", post(handlers::create_refund))
        // Admin
        .route("/admin/wallets", post(handlers::admin_create_wallet))
        .route("/admin/wallets/:id/freeze", post(handlers::admin_freeze_wallet))
        .route("/admin/api_keys", post(handlers::admin_create_api_key))
        .route("/admin/api_keys/:id/revoke", post(handlers::admin_revoke_api_key))
        .route("/admin/deposits", post(handlers::admin_create_deposit))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateHeaderLayer::new(axum::http::HeaderName::from_static("x-request-id")))
        .layer(SetRequestIdLayer::new(
            axum::http::HeaderName::from_static("x-request-id"),
            MakeRequestUuid,
        ))
        .with_state(state)
}
