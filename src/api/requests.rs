use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::{JournalEntryStatus, JournalEntryType, WalletType};
use crate::services::RecipientKind;

/// A typed recipient identifier as it appears in a request body.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipientRequest {
    pub kind: RecipientKind,
    pub value: String,
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateWalletRequest {
    #[serde(rename = "type")]
    pub wallet_type: WalletType,
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: String,
    pub handle: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TransferRequest {
    pub to: RecipientRequest,
    pub amount: Decimal,
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: String,
    #[validate(length(min = 1, message = "idempotency_key is required"))]
    pub idempotency_key: String,
    pub reference_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateHoldRequest {
    pub amount: Decimal,
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: String,
    pub expires_in_seconds: i64,
    #[validate(length(min = 1, message = "idempotency_key is required"))]
    pub idempotency_key: String,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CaptureHoldRequest {
    pub to: RecipientRequest,
    pub amount: Option<Decimal>,
    #[validate(length(min = 1, message = "idempotency_key is required"))]
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReleaseHoldRequest {
    pub amount: Option<Decimal>,
    #[validate(length(min = 1, message = "idempotency_key is required"))]
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePaymentIntentRequest {
    pub amount: Decimal,
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: String,
    pub expires_in_seconds: i64,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PayPaymentIntentRequest {
    #[validate(length(min = 1, message = "idempotency_key is required"))]
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefundRequest {
    pub capture_id: Uuid,
    pub amount: Option<Decimal>,
    #[validate(length(min = 1, message = "idempotency_key is required"))]
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveQuery {
    pub kind: RecipientKind,
    pub value: String,
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListTransactionsQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
    #[serde(rename = "type")]
    pub entry_type: Option<JournalEntryType>,
    pub status: Option<JournalEntryStatus>,
    pub from: Option<chrono::DateTime<chrono::Utc>>,
    pub to: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdminCreateApiKeyRequest {
    pub wallet_id: Uuid,
    #[validate(length(min = 1, message = "at least one scope is required"))]
    pub scopes: Vec<String>,
    pub per_tx_max: Option<Decimal>,
    pub daily_max: Option<Decimal>,
    pub allowed_counterparties: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdminDepositRequest {
    pub to_wallet_id: Uuid,
    pub amount: Decimal,
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: String,
    #[validate(length(min = 1, message = "idempotency_key is required"))]
    pub idempotency_key: String,
    pub reference_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}
