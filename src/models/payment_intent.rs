use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_intent_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentIntentStatus {
    RequiresPayment,
    Paid,
    Expired,
    Cancelled,
}

/// A merchant-initiated request for payment. Created without touching the
/// ledger; transitions to `Paid` atomically with posting the underlying
/// transfer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentIntent {
    pub id: Uuid,
    pub merchant_wallet_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentIntentStatus,
    pub expires_at: DateTime<Utc>,
    pub payer_wallet_id: Option<Uuid>,
    pub journal_entry_id: Option<Uuid>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl PaymentIntent {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn can_pay(&self, now: DateTime<Utc>) -> bool {
        self.status == PaymentIntentStatus::RequiresPayment && !self.is_expired(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn sample(status: PaymentIntentStatus, expires_in: Duration) -> PaymentIntent {
        PaymentIntent {
            id: Uuid::new_v4(),
            merchant_wallet_id: Uuid::new_v4(),
            amount: dec!(25.00),
            currency: "USD".to_string(),
            status,
            expires_at: Utc::now() + expires_in,
            payer_wallet_id: None,
            journal_entry_id: None,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_expired_intent_not_payable() {
        let intent = sample(PaymentIntentStatus::RequiresPayment, Duration::seconds(-1));
        assert!(!intent.can_pay(Utc::now()));
    }

    #[test]
    fn test_paid_intent_not_payable_again() {
        let intent = sample(PaymentIntentStatus::Paid, Duration::seconds(3600));
        assert!(!intent.can_pay(Utc::now()));
    }

    #[test]
    fn test_fresh_intent_payable() {
        let intent = sample(PaymentIntentStatus::RequiresPayment, Duration::seconds(3600));
        assert!(intent.can_pay(Utc::now()));
    }
}
