use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "hold_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldStatus {
    Active,
    Captured,
    Released,
    Expired,
}

/// Funds carved out of a wallet's available balance into its held balance,
/// to be captured (paid out) or released (returned) in whole or in part.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Hold {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub amount: Decimal,
    pub remaining_amount: Decimal,
    pub currency: String,
    pub status: HoldStatus,
    pub expires_at: DateTime<Utc>,
    pub created_by_api_key_id: Uuid,
    pub idempotency_key: String,
    pub journal_entry_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Hold {
    /// A hold past its `expires_at` is no longer capturable regardless of
    /// its persisted status; callers must treat it as expired at touch time
    /// even if no sweep has run yet.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn can_capture(&self, now: DateTime<Utc>) -> bool {
        self.status == HoldStatus::Active && !self.is_expired(now)
    }

    /// Release is allowed even past expiry: funds are never stranded.
    pub fn can_release(&self) -> bool {
        self.status == HoldStatus::Active
    }
}
