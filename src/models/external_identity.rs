use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Maps a third-party identity, e.g. `(provider="discord", external_user_id="12345")`,
/// to the wallet that owns it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExternalIdentity {
    pub id: Uuid,
    pub provider: String,
    pub external_user_id: String,
    pub wallet_id: Uuid,
    pub created_at: DateTime<Utc>,
}
