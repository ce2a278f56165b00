use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    ApiKey, ApiKeyStatus, Capture, Hold, HoldStatus, JournalEntryStatus, JournalEntryType,
    JournalLineDirection, PaymentIntent, PaymentIntentStatus, Refund, Wallet, WalletStatus,
    WalletType,
};
use crate::services::{PostOutcome, TransactionListItem, TransactionPage};

/// Error body on the wire: `{ "error_code": "...", "message": "...", "details": {...} }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error_code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_infrastructure() {
            tracing::error!(error = %self, "infrastructure error");
        } else {
            tracing::debug!(error = %self, code = self.code().as_str(), "request rejected");
        }

        let body = ErrorBody {
            error_code: self.code().as_str().to_string(),
            message: self.to_string(),
            details: self.details(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub wallet_type: WalletType,
    pub status: WalletStatus,
    pub currency: String,
    pub handle: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Wallet> for WalletResponse {
    fn from(wallet: Wallet) -> Self {
        Self {
            id: wallet.id,
            wallet_type: wallet.wallet_type,
            status: wallet.status,
            currency: wallet.currency,
            handle: wallet.handle,
            metadata: wallet.metadata,
            created_at: wallet.created_at,
            updated_at: wallet.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub wallet_id: Uuid,
    pub currency: String,
    pub available: Decimal,
    pub held: Decimal,
    pub total: Decimal,
}

impl BalanceResponse {
    pub fn new(wallet_id: Uuid, currency: String, available: Decimal, held: Decimal) -> Self {
        Self {
            wallet_id,
            currency,
            total: available + held,
            available,
            held,
        }
    }
}

/// Generic view of a posted entry's outcome, used by transfer/deposit/
/// payment-intent-pay responses that don't have their own dedicated table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingResponse {
    pub entry_id: Uuid,
    pub entry_type: JournalEntryType,
    pub amount: Decimal,
    pub currency: String,
    pub replayed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<PostOutcome> for PostingResponse {
    fn from(outcome: PostOutcome) -> Self {
        let principal_amount = outcome
            .lines
            .iter()
            .find(|line| line.direction == JournalLineDirection::Credit)
            .map(|line| line.amount)
            .unwrap_or_default();
        let currency = outcome
            .lines
            .first()
            .map(|line| line.currency.clone())
            .unwrap_or_default();
        Self {
            entry_id: outcome.entry.id,
            entry_type: outcome.entry.entry_type,
            amount: principal_amount,
            currency,
            replayed: outcome.replayed,
            created_at: outcome.entry.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldResponse {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub amount: Decimal,
    pub remaining_amount: Decimal,
    pub currency: String,
    pub status: HoldStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Hold> for HoldResponse {
    fn from(hold: Hold) -> Self {
        Self {
            id: hold.id,
            wallet_id: hold.wallet_id,
            amount: hold.amount,
            remaining_amount: hold.remaining_amount,
            currency: hold.currency,
            status: hold.status,
            expires_at: hold.expires_at,
            created_at: hold.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureResponse {
    pub id: Uuid,
    pub hold_id: Uuid,
    pub to_wallet_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub refunded_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<Capture> for CaptureResponse {
    fn from(capture: Capture) -> Self {
        Self {
            id: capture.id,
            hold_id: capture.hold_id,
            to_wallet_id: capture.to_wallet_id,
            amount: capture.amount,
            currency: capture.currency,
            refunded_amount: capture.refunded_amount,
            created_at: capture.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundResponse {
    pub id: Uuid,
    pub capture_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl From<Refund> for RefundResponse {
    fn from(refund: Refund) -> Self {
        Self {
            id: refund.id,
            capture_id: refund.capture_id,
            amount: refund.amount,
            currency: refund.currency,
            created_at: refund.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentResponse {
    pub id: Uuid,
    pub merchant_wallet_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentIntentStatus,
    pub expires_at: DateTime<Utc>,
    pub payer_wallet_id: Option<Uuid>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentIntent> for PaymentIntentResponse {
    fn from(intent: PaymentIntent) -> Self {
        Self {
            id: intent.id,
            merchant_wallet_id: intent.merchant_wallet_id,
            amount: intent.amount,
            currency: intent.currency,
            status: intent.status,
            expires_at: intent.expires_at,
            payer_wallet_id: intent.payer_wallet_id,
            metadata: intent.metadata,
            created_at: intent.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionListItemResponse {
    pub entry_id: Uuid,
    #[serde(rename = "type")]
    pub entry_type: JournalEntryType,
    pub status: JournalEntryStatus,
    pub direction: JournalLineDirection,
    pub amount: Decimal,
    pub currency: String,
    pub counterparty_wallet_id: Option<Uuid>,
    pub counterparty_handle: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<TransactionListItem> for TransactionListItemResponse {
    fn from(item: TransactionListItem) -> Self {
        Self {
            entry_id: item.entry.id,
            entry_type: item.entry.entry_type,
            status: item.entry.status,
            direction: item.direction,
            amount: item.amount,
            currency: item.currency,
            counterparty_wallet_id: item.counterparty_wallet_id,
            counterparty_handle: item.counterparty_handle,
            created_at: item.entry.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionListResponse {
    pub items: Vec<TransactionListItemResponse>,
    pub next_cursor: Option<String>,
}

impl From<TransactionPage> for TransactionListResponse {
    fn from(page: TransactionPage) -> Self {
        Self {
            items: page.items.into_iter().map(Into::into).collect(),
            next_cursor: page.next_cursor,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub wallet_id: Uuid,
    pub handle: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyResponse {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub scopes: Vec<String>,
    pub status: ApiKeyStatus,
    pub created_at: DateTime<Utc>,
}

impl From<ApiKey> for ApiKeyResponse {
    fn from(key: ApiKey) -> Self {
        Self {
            id: key.id,
            wallet_id: key.wallet_id,
            scopes: key.scopes.0,
            status: key.status,
            created_at: key.created_at,
        }
    }
}

/// A freshly minted API key is the only time the plaintext secret is ever
/// returned; it is never recoverable afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyCreatedResponse {
    #[serde(flatten)]
    pub key: ApiKeyResponse,
    pub secret: String,
}
