use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;
use validator::Validate;

use crate::api::auth::authenticate;
use crate::api::requests::{
    AdminCreateApiKeyRequest, AdminDepositRequest, CaptureHoldRequest, CreateHoldRequest,
    CreatePaymentIntentRequest, CreateWalletRequest, ListTransactionsQuery, PayPaymentIntentRequest,
    RefundRequest, ReleaseHoldRequest, ResolveQuery, TransferRequest,
};
use crate::api::responses::{
    ApiKeyCreatedResponse, ApiKeyResponse, BalanceResponse, CaptureResponse, HealthResponse,
    HoldResponse, PaymentIntentResponse, PostingResponse, RefundResponse, ResolveResponse,
    TransactionListResponse, WalletResponse,
};
use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::{ApiKey, ApiKeyLimits, ApiKeyStatus};
use crate::observability::AggregatedHealth;
use crate::repositories::{
    ApiKeyRepository, CaptureRepository, ExternalIdentityRepository, HoldRepository,
    JournalRepository, PaymentIntentRepository, RefundRepository, WalletRepository,
};
use crate::services::{
    self, DepositService, HoldService, LedgerEngine, PaymentIntentService, RecipientIdentifier,
    RecipientResolver, RefundService, TransactionListingService, TransferService, WalletService,
};

use super::routes::AppState;

fn validation_error(errors: validator::ValidationErrors) -> AppError {
    AppError::domain_with_details(
        ErrorCode::Validation,
        "request validation failed",
        serde_json::to_value(&errors).unwrap_or(serde_json::Value::Null),
    )
}

fn ledger_engine(state: &AppState) -> LedgerEngine {
    LedgerEngine::new(state.pool.clone())
}

fn wallet_service(state: &AppState) -> WalletService {
    WalletService::new(state.pool.clone())
}

fn recipient_resolver(state: &AppState) -> RecipientResolver {
    RecipientResolver::new(
        WalletRepository::new(state.pool.clone()),
        ExternalIdentityRepository::new(state.pool.clone()),
    )
}

fn api_key_repo(state: &AppState) -> ApiKeyRepository {
    ApiKeyRepository::new(state.pool.clone())
}

// ============================================================================
// Health Handlers
// ============================================================================

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = sqlx::query("SELECT 1").fetch_one(&state.pool).await.is_ok();
    let uptime_seconds = state.health_checker.as_ref().map(|c| c.uptime_seconds()).unwrap_or(0);

    Json(HealthResponse {
        status: if db_healthy { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
    })
}

pub async fn detailed_health_check(State(state): State<AppState>) -> Json<AggregatedHealth> {
    match &state.health_checker {
        Some(checker) => Json(checker.check_all().await),
        None => Json(AggregatedHealth::new(env!("CARGO_PKG_VERSION").to_string(), 0, vec![])),
    }
}

pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    let ready = match &state.health_checker {
        Some(checker) => checker.is_ready().await,
        None => sqlx::query("SELECT 1").fetch_one(&state.pool).await.is_ok(),
    };
    if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

pub async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> String {
    state.metrics_handle.as_ref().map(|h| h.render()).unwrap_or_default()
}

// ============================================================================
// Wallet Handlers
// ============================================================================

pub async fn get_my_wallet(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<WalletResponse>> {
    let key = authenticate(&headers, &api_key_repo(&state), &state.rate_limiter, "wallet:read").await?;
    let wallet = wallet_service(&state).find_by_id(key.wallet_id).await?;
    Ok(Json(wallet.into()))
}

pub async fn get_my_balance(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<BalanceResponse>> {
    let key = authenticate(&headers, &api_key_repo(&state), &state.rate_limiter, "wallet:read").await?;
    let service = wallet_service(&state);
    let wallet = service.find_by_id(key.wallet_id).await?;
    let (available, held) = service.balances(key.wallet_id).await?;
    Ok(Json(BalanceResponse::new(key.wallet_id, wallet.currency, available, held)))
}

pub async fn list_my_transactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListTransactionsQuery>,
) -> AppResult<Json<TransactionListResponse>> {
    let key = authenticate(&headers, &api_key_repo(&state), &state.rate_limiter, "wallet:read").await?;
    let service = TransactionListingService::new(JournalRepository::new(state.pool.clone()));
    let page = service
        .list(services::ListTransactionsRequest {
            wallet_id: key.wallet_id,
            entry_type: query.entry_type,
            status: query.status,
            from_date: query.from,
            to_date: query.to,
            cursor: query.cursor,
            limit: query.limit,
        })
        .await?;
    Ok(Json(page.into()))
}

pub async fn resolve_recipient(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ResolveQuery>,
) -> AppResult<Json<ResolveResponse>> {
    authenticate(&headers, &api_key_repo(&state), &state.rate_limiter, "wallet:read").await?;
    let resolved = recipient_resolver(&state)
        .resolve(&RecipientIdentifier {
            kind: query.kind,
            value: query.value,
            provider: query.provider,
        })
        .await?;
    Ok(Json(ResolveResponse {
        wallet_id: resolved.wallet_id,
        handle: resolved.handle,
    }))
}

// ============================================================================
// Transfer Handler
// ============================================================================

pub async fn create_transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<TransferRequest>,
) -> AppResult<Json<PostingResponse>> {
    req.validate().map_err(validation_error)?;
    let key = authenticate(&headers, &api_key_repo(&state), &state.rate_limiter, "transfer:create").await?;

    let service = TransferService::new(ledger_engine(&state), wallet_service(&state), recipient_resolver(&state));
    let outcome = service
        .transfer(services::TransferRequest {
            from_wallet_id: key.wallet_id,
            recipient: RecipientIdentifier {
                kind: req.to.kind,
                value: req.to.value,
                provider: req.to.provider,
            },
            amount: req.amount,
            currency: req.currency,
            idempotency_key: req.idempotency_key,
            created_by_api_key: key,
            reference_id: req.reference_id,
            metadata: req.metadata,
        })
        .await?;
    Ok(Json(outcome.into()))
}

// ============================================================================
// Hold Handlers
// ============================================================================

fn hold_service(state: &AppState) -> HoldService {
    HoldService::new(
        ledger_engine(state),
        wallet_service(state),
        recipient_resolver(state),
        HoldRepository::new(state.pool.clone()),
        CaptureRepository::new(state.pool.clone()),
    )
}

pub async fn create_hold(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateHoldRequest>,
) -> AppResult<Json<HoldResponse>> {
    req.validate().map_err(validation_error)?;
    let key = authenticate(&headers, &api_key_repo(&state), &state.rate_limiter, "hold:create").await?;

    let hold = hold_service(&state)
        .create_hold(services::CreateHoldRequest {
            wallet_id: key.wallet_id,
            amount: req.amount,
            currency: req.currency,
            expires_in_seconds: req.expires_in_seconds,
            idempotency_key: req.idempotency_key,
            created_by_api_key: key,
            metadata: req.metadata,
        })
        .await?;
    Ok(Json(hold.into()))
}

pub async fn capture_hold(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(hold_id): Path<Uuid>,
    Json(req): Json<CaptureHoldRequest>,
) -> AppResult<Json<CaptureResponse>> {
    req.validate().map_err(validation_error)?;
    let key = authenticate(&headers, &api_key_repo(&state), &state.rate_limiter, "hold:capture").await?;

    let capture = hold_service(&state)
        .capture(services::CaptureRequest {
            hold_id,
            recipient: RecipientIdentifier {
                kind: req.to.kind,
                value: req.to.value,
                provider: req.to.provider,
            },
            amount: req.amount,
            idempotency_key: req.idempotency_key,
            created_by_api_key: key,
        })
        .await?;
    Ok(Json(capture.into()))
}

pub async fn release_hold(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(hold_id): Path<Uuid>,
    Json(req): Json<ReleaseHoldRequest>,
) -> AppResult<Json<HoldResponse>> {
    req.validate().map_err(validation_error)?;
    let key = authenticate(&headers, &api_key_repo(&state), &state.rate_limiter, "hold:release").await?;

    let hold = hold_service(&state)
        .release(services::ReleaseRequest {
            hold_id,
            amount: req.amount,
            idempotency_key: req.idempotency_key,
            created_by_api_key: key,
        })
        .await?;
    Ok(Json(hold.into()))
}

// ============================================================================
// Payment Intent Handlers
// ============================================================================

fn payment_intent_service(state: &AppState) -> PaymentIntentService {
    PaymentIntentService::new(
        ledger_engine(state),
        wallet_service(state),
        PaymentIntentRepository::new(state.pool.clone()),
    )
}

pub async fn create_payment_intent(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreatePaymentIntentRequest>,
) -> AppResult<Json<PaymentIntentResponse>> {
    req.validate().map_err(validation_error)?;
    let key = authenticate(&headers, &api_key_repo(&state), &state.rate_limiter, "payment_intent:create").await?;

    let intent = payment_intent_service(&state)
        .create(services::CreateIntentRequest {
            merchant_wallet_id: key.wallet_id,
            amount: req.amount,
            currency: req.currency,
            expires_in_seconds: req.expires_in_seconds,
            metadata: req.metadata,
        })
        .await?;
    Ok(Json(intent.into()))
}

pub async fn pay_payment_intent(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(intent_id): Path<Uuid>,
    Json(req): Json<PayPaymentIntentRequest>,
) -> AppResult<Json<PaymentIntentResponse>> {
    req.validate().map_err(validation_error)?;
    let key = authenticate(&headers, &api_key_repo(&state), &state.rate_limiter, "payment_intent:pay").await?;

    let intent = payment_intent_service(&state)
        .pay(services::PayIntentRequest {
            intent_id,
            payer_wallet_id: key.wallet_id,
            idempotency_key: req.idempotency_key,
            created_by_api_key: key,
        })
        .await?;
    Ok(Json(intent.into()))
}

// ============================================================================
// Refund Handler
// ============================================================================

pub async fn create_refund(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RefundRequest>,
) -> AppResult<Json<RefundResponse>> {
    req.validate().map_err(validation_error)?;
    let key = authenticate(&headers, &api_key_repo(&state), &state.rate_limiter, "refund:create").await?;

    let service = RefundService::new(
        ledger_engine(&state),
        wallet_service(&state),
        CaptureRepository::new(state.pool.clone()),
        RefundRepository::new(state.pool.clone()),
        HoldRepository::new(state.pool.clone()),
    );
    let refund = service
        .refund(services::RefundRequest {
            capture_id: req.capture_id,
            amount: req.amount,
            idempotency_key: req.idempotency_key,
            created_by_api_key: key,
        })
        .await?;
    Ok(Json(refund.into()))
}

// ============================================================================
// Admin Handlers
// ============================================================================

pub async fn admin_create_wallet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateWalletRequest>,
) -> AppResult<Json<WalletResponse>> {
    req.validate().map_err(validation_error)?;
    authenticate(&headers, &api_key_repo(&state), &state.rate_limiter, "admin:wallets").await?;

    let wallet = wallet_service(&state)
        .create_wallet(req.wallet_type, req.currency, req.handle, req.metadata)
        .await?;
    Ok(Json(wallet.into()))
}

pub async fn admin_freeze_wallet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(wallet_id): Path<Uuid>,
) -> AppResult<Json<WalletResponse>> {
    authenticate(&headers, &api_key_repo(&state), &state.rate_limiter, "admin:wallets").await?;
    let wallet = wallet_service(&state).freeze(wallet_id).await?;
    Ok(Json(wallet.into()))
}

pub async fn admin_create_api_key(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AdminCreateApiKeyRequest>,
) -> AppResult<Json<ApiKeyCreatedResponse>> {
    req.validate().map_err(validation_error)?;
    authenticate(&headers, &api_key_repo(&state), &state.rate_limiter, "admin:api_keys").await?;

    let secret = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    let key_hash = hex::encode(Sha256::digest(secret.as_bytes()));

    let limits = if req.per_tx_max.is_some() || req.daily_max.is_some() || req.allowed_counterparties.is_some() {
        Some(ApiKeyLimits {
            per_tx_max: req.per_tx_max,
            daily_max: req.daily_max,
            allowed_counterparties: req.allowed_counterparties,
        })
    } else {
        None
    };

    let key = ApiKey {
        id: Uuid::new_v4(),
        key_hash,
        wallet_id: req.wallet_id,
        scopes: sqlx::types::Json(req.scopes),
        limits: sqlx::types::Json(limits),
        status: ApiKeyStatus::Active,
        last_used_at: None,
        created_at: Utc::now(),
    };
    let created = api_key_repo(&state).create(&key).await?;

    Ok(Json(ApiKeyCreatedResponse {
        key: created.into(),
        secret,
    }))
}

pub async fn admin_revoke_api_key(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(key_id): Path<Uuid>,
) -> AppResult<Json<ApiKeyResponse>> {
    authenticate(&headers, &api_key_repo(&state), &state.rate_limiter, "admin:api_keys").await?;
    let key = api_key_repo(&state)
        .revoke(key_id)
        .await?
        .ok_or_else(|| AppError::domain(ErrorCode::NotFound, "api key not found"))?;
    Ok(Json(key.into()))
}

pub async fn admin_create_deposit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AdminDepositRequest>,
) -> AppResult<Json<PostingResponse>> {
    req.validate().map_err(validation_error)?;
    let key = authenticate(&headers, &api_key_repo(&state), &state.rate_limiter, "admin:deposits").await?;

    let service = DepositService::new(ledger_engine(&state), wallet_service(&state), WalletRepository::new(state.pool.clone()));
    let outcome = service
        .deposit(services::DepositRequest {
            to_wallet_id: req.to_wallet_id,
            amount: req.amount,
            currency: req.currency,
            idempotency_key: req.idempotency_key,
            created_by_api_key_id: key.id,
            reference_id: req.reference_id,
            metadata: req.metadata,
        })
        .await?;
    Ok(Json(outcome.into()))
}
