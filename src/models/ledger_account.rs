use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Exactly one of each kind exists per wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ledger_account_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerAccountKind {
    Available,
    Held,
}

/// A ledger account is a lock handle and a posting target, never a balance
/// holder: its balance is always derived from posted journal lines.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LedgerAccount {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub kind: LedgerAccountKind,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl LedgerAccount {
    pub fn new(wallet_id: Uuid, kind: LedgerAccountKind, currency: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet_id,
            kind,
            currency,
            created_at: Utc::now(),
        }
    }
}
