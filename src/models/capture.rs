use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A payout taken against a hold's remaining amount, to the hold wallet's
/// creator's chosen recipient. Refundable down to zero independently of
/// the hold's own lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Capture {
    pub id: Uuid,
    pub hold_id: Uuid,
    pub to_wallet_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub journal_entry_id: Uuid,
    pub idempotency_key: String,
    pub created_by_api_key_id: Uuid,
    pub refunded_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Capture {
    pub fn refundable_amount(&self) -> Decimal {
        self.amount - self.refunded_amount
    }
}
