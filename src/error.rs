use axum::http::StatusCode;
use serde_json::Value as JsonValue;

/// Stable machine-readable error code surfaced on the wire as `error_code`.
///
/// Matches the taxonomy every endpoint is expected to report against; the
/// string form is what actually crosses the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidAmount,
    CurrencyMismatch,
    InsufficientFunds,
    LimitExceeded,
    ForbiddenScope,
    CounterpartyNotAllowed,
    RecipientNotFound,
    WalletNotActive,
    WalletFrozen,
    WalletClosed,
    HoldNotFound,
    HoldExpired,
    HoldNotCapturable,
    HoldNotReleasable,
    AmountExceedsHold,
    AmountExceedsRefundable,
    PaymentIntentNotFound,
    PaymentIntentExpired,
    PaymentIntentNotPayable,
    SelfTransfer,
    SelfPayment,
    IdempotencyConflict,
    RateLimitExceeded,
    Unauthorized,
    NotFound,
    Validation,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidAmount => "INVALID_AMOUNT",
            ErrorCode::CurrencyMismatch => "CURRENCY_MISMATCH",
            ErrorCode::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorCode::LimitExceeded => "LIMIT_EXCEEDED",
            ErrorCode::ForbiddenScope => "FORBIDDEN_SCOPE",
            ErrorCode::CounterpartyNotAllowed => "COUNTERPARTY_NOT_ALLOWED",
            ErrorCode::RecipientNotFound => "RECIPIENT_NOT_FOUND",
            ErrorCode::WalletNotActive => "WALLET_NOT_ACTIVE",
            ErrorCode::WalletFrozen => "WALLET_FROZEN",
            ErrorCode::WalletClosed => "WALLET_CLOSED",
            ErrorCode::HoldNotFound => "HOLD_NOT_FOUND",
            ErrorCode::HoldExpired => "HOLD_EXPIRED",
            ErrorCode::HoldNotCapturable => "HOLD_NOT_CAPTURABLE",
            ErrorCode::HoldNotReleasable => "HOLD_NOT_RELEASABLE",
            ErrorCode::AmountExceedsHold => "AMOUNT_EXCEEDS_HOLD",
            ErrorCode::AmountExceedsRefundable => "AMOUNT_EXCEEDS_REFUNDABLE",
            ErrorCode::PaymentIntentNotFound => "PAYMENT_INTENT_NOT_FOUND",
            ErrorCode::PaymentIntentExpired => "PAYMENT_INTENT_EXPIRED",
            ErrorCode::PaymentIntentNotPayable => "PAYMENT_INTENT_NOT_PAYABLE",
            ErrorCode::SelfTransfer => "SELF_TRANSFER",
            ErrorCode::SelfPayment => "SELF_PAYMENT",
            ErrorCode::IdempotencyConflict => "IDEMPOTENCY_CONFLICT",
            ErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Validation => "VALIDATION_ERROR",
            ErrorCode::Internal => "INTERNAL_ERROR",
        }
    }

    /// HTTP status this code is mapped to per the external interface contract.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidAmount
            | ErrorCode::CurrencyMismatch
            | ErrorCode::InsufficientFunds
            | ErrorCode::LimitExceeded
            | ErrorCode::SelfTransfer
            | ErrorCode::SelfPayment
            | ErrorCode::Validation
            | ErrorCode::HoldExpired
            | ErrorCode::HoldNotCapturable
            | ErrorCode::HoldNotReleasable
            | ErrorCode::AmountExceedsHold
            | ErrorCode::AmountExceedsRefundable
            | ErrorCode::PaymentIntentExpired
            | ErrorCode::PaymentIntentNotPayable => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::ForbiddenScope
            | ErrorCode::WalletNotActive
            | ErrorCode::WalletFrozen
            | ErrorCode::WalletClosed
            | ErrorCode::CounterpartyNotAllowed => StatusCode::FORBIDDEN,
            ErrorCode::RecipientNotFound
            | ErrorCode::HoldNotFound
            | ErrorCode::PaymentIntentNotFound
            | ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::IdempotencyConflict => StatusCode::CONFLICT,
            ErrorCode::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The engine's single error type. Every domain failure carries its wire
/// error code directly so handlers never have to re-derive it.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Domain {
        code: ErrorCode,
        message: String,
        details: Option<JsonValue>,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn domain(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError::Domain {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn domain_with_details(code: ErrorCode, message: impl Into<String>, details: JsonValue) -> Self {
        AppError::Domain {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Domain { code, .. } => *code,
            AppError::Validation(_) => ErrorCode::Validation,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Database(_) => ErrorCode::Internal,
            AppError::Internal(_) => ErrorCode::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.code().status()
    }

    pub fn details(&self) -> Option<JsonValue> {
        match self {
            AppError::Domain { details, .. } => details.clone(),
            _ => None,
        }
    }

    /// True for errors that are expected control flow (insufficiency, state,
    /// validation, conflict) rather than infrastructure failures. Used to
    /// decide whether to log at error level.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, AppError::Database(_) | AppError::Internal(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;
