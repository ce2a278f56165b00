use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The kind of principal a wallet represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "wallet_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletType {
    Customer,
    Business,
    System,
}

/// Wallet lifecycle status. Wallets are never deleted, only transitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "wallet_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletStatus {
    Active,
    Frozen,
    Closed,
}

impl WalletStatus {
    /// Frozen blocks both initiating and receiving money; closed is terminal.
    pub fn is_operational(&self) -> bool {
        matches!(self, WalletStatus::Active)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, WalletStatus::Closed)
    }
}

/// A wallet belonging to an agent, merchant, or the system itself.
///
/// Currency is fixed at creation and never changes. The handle, when set,
/// is a unique `@`-prefixed alias usable as a transfer recipient.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Wallet {
    pub id: Uuid,
    #[sqlx(rename = "type")]
    pub wallet_type: WalletType,
    pub status: WalletStatus,
    pub currency: String,
    pub handle: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(wallet_type: WalletType, currency: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            wallet_type,
            status: WalletStatus::Active,
            currency,
            handle: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_handle(mut self, handle: String) -> Self {
        self.handle = Some(normalize_handle(&handle));
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Prepends `@` to a handle if it is missing, per the resolver's normalization rule.
pub fn normalize_handle(handle: &str) -> String {
    if handle.starts_with('@') {
        handle.to_string()
    } else {
        format!("@{}", handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_status_operational() {
        assert!(WalletStatus::Active.is_operational());
        assert!(!WalletStatus::Frozen.is_operational());
        assert!(!WalletStatus::Closed.is_operational());
        assert!(WalletStatus::Closed.is_closed());
    }

    #[test]
    fn test_normalize_handle() {
        assert_eq!(normalize_handle("alice"), "@alice");
        assert_eq!(normalize_handle("@alice"), "@alice");
    }

    #[test]
    fn test_wallet_new_defaults_active() {
        let wallet = Wallet::new(WalletType::Customer, "USD".to_string());
        assert_eq!(wallet.status, WalletStatus::Active);
        assert!(wallet.handle.is_none());
    }

    #[test]
    fn test_wallet_with_handle_normalizes() {
        let wallet = Wallet::new(WalletType::Customer, "USD".to_string())
            .with_handle("bob".to_string());
        assert_eq!(wallet.handle.as_deref(), Some("@bob"));
    }
}
