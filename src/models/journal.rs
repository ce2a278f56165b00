use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The operation family that produced an entry. Idempotency matching is
/// scoped by this type: replaying a key against the wrong family is a
/// conflict, not a silent accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "journal_entry_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JournalEntryType {
    DepositExternal,
    Transfer,
    Hold,
    Capture,
    Release,
    Refund,
    Reversal,
    Adjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "journal_entry_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JournalEntryStatus {
    Pending,
    Posted,
    Reversed,
    Failed,
}

/// The atomic unit of posting. Once `Posted`, an entry and its lines are
/// immutable; nothing ever updates a line in place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JournalEntry {
    pub id: Uuid,
    #[sqlx(rename = "type")]
    pub entry_type: JournalEntryType,
    pub status: JournalEntryStatus,
    pub idempotency_key: String,
    pub reference_id: Option<String>,
    pub created_by_api_key_id: Uuid,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "journal_line_direction", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JournalLineDirection {
    Debit,
    Credit,
}

/// One leg of a balanced entry: always a strictly positive amount against a
/// single ledger account, signed by `direction` rather than by the amount
/// itself.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JournalLine {
    pub id: Uuid,
    pub journal_entry_id: Uuid,
    pub ledger_account_id: Uuid,
    pub direction: JournalLineDirection,
    pub amount: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// One line to be posted, before it has an id or a parent entry. The input
/// shape the ledger engine's posting primitive accepts.
#[derive(Debug, Clone)]
pub struct PendingLine {
    pub ledger_account_id: Uuid,
    pub direction: JournalLineDirection,
    pub amount: Decimal,
    pub currency: String,
}

impl PendingLine {
    pub fn debit(ledger_account_id: Uuid, amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            ledger_account_id,
            direction: JournalLineDirection::Debit,
            amount,
            currency: currency.into(),
        }
    }

    pub fn credit(ledger_account_id: Uuid, amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            ledger_account_id,
            direction: JournalLineDirection::Credit,
            amount,
            currency: currency.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pending_line_constructors() {
        let account = Uuid::new_v4();
        let debit = PendingLine::debit(account, dec!(10.00), "USD");
        let credit = PendingLine::credit(account, dec!(10.00), "USD");
        assert_eq!(debit.direction, JournalLineDirection::Debit);
        assert_eq!(credit.direction, JournalLineDirection::Credit);
        assert_eq!(debit.amount, credit.amount);
    }
}
