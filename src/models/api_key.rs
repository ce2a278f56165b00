use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "api_key_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiKeyStatus {
    Active,
    Revoked,
}

/// Named spending caps carried on a key. Any field left `None` means no
/// cap of that kind applies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApiKeyLimits {
    pub per_tx_max: Option<Decimal>,
    pub daily_max: Option<Decimal>,
    pub allowed_counterparties: Option<Vec<String>>,
}

/// A credential bound to exactly one wallet, carrying the scopes and
/// spending limits that gate every mutating call it authenticates.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApiKey {
    pub id: Uuid,
    pub key_hash: String,
    pub wallet_id: Uuid,
    #[sqlx(json)]
    pub scopes: sqlx::types::Json<Vec<String>>,
    #[sqlx(json)]
    pub limits: sqlx::types::Json<Option<ApiKeyLimits>>,
    pub status: ApiKeyStatus,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ApiKey {
    pub fn is_active(&self) -> bool {
        self.status == ApiKeyStatus::Active
    }

    pub fn limits(&self) -> Option<&ApiKeyLimits> {
        self.limits.as_ref().as_ref()
    }

    /// A key's scope set authorizes a required scope if it contains the
    /// exact string, or a wildcard entry `prefix:*` whose `prefix:` is a
    /// prefix of the required scope. Matching is on the literal `:*`
    /// suffix, not a general glob: `admin:*` matches `admin:wallets` and
    /// `admin:wallets:freeze`, but `admin*` matches nothing by wildcard.
    pub fn has_scope(&self, required: &str) -> bool {
        self.scopes.iter().any(|granted| scope_matches(granted, required))
    }
}

fn scope_matches(granted: &str, required: &str) -> bool {
    if granted == required {
        return true;
    }
    if let Some(prefix) = granted.strip_suffix(":*") {
        let prefix_with_colon = format!("{}:", prefix);
        return required.starts_with(&prefix_with_colon);
    }
    false
}
