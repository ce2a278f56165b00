use crate::error::AppError;
use crate::models::ApiKey;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

pub struct ApiKeyRepository {
    pool: PgPool,
}

impl ApiKeyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, key: &ApiKey) -> Result<ApiKey, AppError> {
        sqlx::query_as::<_, ApiKey>(
            r#"
            INSERT INTO api_keys (id, key_hash, wallet_id, scopes, limits, status, last_used_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, key_hash, wallet_id, scopes, limits, status, last_used_at, created_at
            "#,
        )
        .bind(key.id)
        .bind(&key.key_hash)
        .bind(key.wallet_id)
        .bind(&key.scopes)
        .bind(&key.limits)
        .bind(key.status)
        .bind(key.last_used_at)
        .bind(key.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ApiKey>, AppError> {
        sqlx::query_as::<_, ApiKey>(
            r#"
            SELECT id, key_hash, wallet_id, scopes, limits, status, last_used_at, created_at
            FROM api_keys WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    /// Looks a key up by the SHA-256 hex digest of the presented secret.
    /// The plaintext key and hash algorithm choice are provisioning
    /// concerns outside this service; this only ever sees the digest.
    pub async fn find_by_key_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, AppError> {
        sqlx::query_as::<_, ApiKey>(
            r#"
            SELECT id, key_hash, wallet_id, scopes, limits, status, last_used_at, created_at
            FROM api_keys WHERE key_hash = $1
            "#,
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn touch_last_used(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE api_keys SET last_used_at = $2 WHERE id = $1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    pub async fn revoke(&self, id: Uuid) -> Result<Option<ApiKey>, AppError> {
        sqlx::query_as::<_, ApiKey>(
            r#"
            UPDATE api_keys SET status = 'REVOKED'
            WHERE id = $1
            RETURNING id, key_hash, wallet_id, scopes, limits, status, last_used_at, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }
}
