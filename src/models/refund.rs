use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A partial or full reversal of a capture, bounded so the sum of a
/// capture's refunds never exceeds its original amount.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Refund {
    pub id: Uuid,
    pub capture_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub journal_entry_id: Uuid,
    pub idempotency_key: String,
    pub created_by_api_key_id: Uuid,
    pub created_at: DateTime<Utc>,
}
