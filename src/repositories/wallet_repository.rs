use crate::error::AppError;
use crate::models::{Wallet, WalletStatus, WalletType};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Raw-SQL CRUD over `wallets`. Freezing/closing are plain status updates;
/// the business rules around what a frozen or closed wallet may still do
/// live in the service layer, not here.
pub struct WalletRepository {
    pool: PgPool,
}

impl WalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, wallet: &Wallet) -> Result<Wallet, AppError> {
        sqlx::query_as::<_, Wallet>(
            r#"
            INSERT INTO wallets (id, type, status, currency, handle, metadata, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, type, status, currency, handle, metadata, created_at, updated_at
            "#,
        )
        .bind(wallet.id)
        .bind(wallet.wallet_type)
        .bind(wallet.status)
        .bind(&wallet.currency)
        .bind(&wallet.handle)
        .bind(&wallet.metadata)
        .bind(wallet.created_at)
        .bind(wallet.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Wallet>, AppError> {
        sqlx::query_as::<_, Wallet>(
            r#"
            SELECT id, type, status, currency, handle, metadata, created_at, updated_at
            FROM wallets WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_handle(&self, handle: &str) -> Result<Option<Wallet>, AppError> {
        sqlx::query_as::<_, Wallet>(
            r#"
            SELECT id, type, status, currency, handle, metadata, created_at, updated_at
            FROM wallets WHERE handle = $1
            "#,
        )
        .bind(handle)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list(
        &self,
        wallet_type: Option<WalletType>,
        status: Option<WalletStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Wallet>, AppError> {
        sqlx::query_as::<_, Wallet>(
            r#"
            SELECT id, type, status, currency, handle, metadata, created_at, updated_at
            FROM wallets
            WHERE ($1::wallet_type IS NULL OR type = $1)
              AND ($2::wallet_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(wallet_type)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn update_status(&self, id: Uuid, status: WalletStatus) -> Result<Option<Wallet>, AppError> {
        sqlx::query_as::<_, Wallet>(
            r#"
            UPDATE wallets SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, type, status, currency, handle, metadata, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn update_metadata(
        &self,
        id: Uuid,
        metadata: serde_json::Value,
    ) -> Result<Option<Wallet>, AppError> {
        sqlx::query_as::<_, Wallet>(
            r#"
            UPDATE wallets SET metadata = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, type, status, currency, handle, metadata, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(metadata)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    /// The system wallet acting as the external-value source for a given
    /// currency's deposits. Exactly one is expected to exist per currency.
    pub async fn find_by_type_and_currency(
        &self,
        wallet_type: WalletType,
        currency: &str,
    ) -> Result<Option<Wallet>, AppError> {
        sqlx::query_as::<_, Wallet>(
            r#"
            SELECT id, type, status, currency, handle, metadata, created_at, updated_at
            FROM wallets WHERE type = $1 AND currency = $2
            LIMIT 1
            "#,
        )
        .bind(wallet_type)
        .bind(currency)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn exists_by_handle(&self, handle: &str) -> Result<bool, AppError> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM wallets WHERE handle = $1)")
            .bind(handle)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(row.0)
    }

    pub async fn find_by_id_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Wallet>, AppError> {
        sqlx::query_as::<_, Wallet>(
            r#"
            SELECT id, type, status, currency, handle, metadata, created_at, updated_at
            FROM wallets WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::Database)
    }
}
