use crate::error::AppError;
use crate::models::{Hold, HoldStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

pub struct HoldRepository {
    pool: PgPool,
}

impl HoldRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        hold: &Hold,
    ) -> Result<Hold, AppError> {
        sqlx::query_as::<_, Hold>(
            r#"
            INSERT INTO holds
                (id, wallet_id, amount, remaining_amount, currency, status, expires_at,
                 created_by_api_key_id, idempotency_key, journal_entry_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, wallet_id, amount, remaining_amount, currency, status, expires_at,
                      created_by_api_key_id, idempotency_key, journal_entry_id, created_at
            "#,
        )
        .bind(hold.id)
        .bind(hold.wallet_id)
        .bind(hold.amount)
        .bind(hold.remaining_amount)
        .bind(&hold.currency)
        .bind(hold.status)
        .bind(hold.expires_at)
        .bind(hold.created_by_api_key_id)
        .bind(&hold.idempotency_key)
        .bind(hold.journal_entry_id)
        .bind(hold.created_at)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Hold>, AppError> {
        sqlx::query_as::<_, Hold>(
            r#"
            SELECT id, wallet_id, amount, remaining_amount, currency, status, expires_at,
                   created_by_api_key_id, idempotency_key, journal_entry_id, created_at
            FROM holds WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    /// Locks the hold row for a capture/release so concurrent partial
    /// operations against the same hold serialize on its remaining_amount.
    pub async fn find_by_id_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Hold>, AppError> {
        sqlx::query_as::<_, Hold>(
            r#"
            SELECT id, wallet_id, amount, remaining_amount, currency, status, expires_at,
                   created_by_api_key_id, idempotency_key, journal_entry_id, created_at
            FROM holds WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_idempotency(
        &self,
        idempotency_key: &str,
        created_by_api_key_id: Uuid,
    ) -> Result<Option<Hold>, AppError> {
        sqlx::query_as::<_, Hold>(
            r#"
            SELECT id, wallet_id, amount, remaining_amount, currency, status, expires_at,
                   created_by_api_key_id, idempotency_key, journal_entry_id, created_at
            FROM holds WHERE idempotency_key = $1 AND created_by_api_key_id = $2
            "#,
        )
        .bind(idempotency_key)
        .bind(created_by_api_key_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    /// Applies a partial capture/release: decrements remaining_amount and,
    /// if it reaches zero, transitions status. Call only while the row's
    /// lock (from `find_by_id_for_update`) is held in the same transaction.
    pub async fn apply_remaining_delta(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        new_remaining: Decimal,
        new_status: HoldStatus,
    ) -> Result<Hold, AppError> {
        sqlx::query_as::<_, Hold>(
            r#"
            UPDATE holds SET remaining_amount = $2, status = $3
            WHERE id = $1
            RETURNING id, wallet_id, amount, remaining_amount, currency, status, expires_at,
                      created_by_api_key_id, idempotency_key, journal_entry_id, created_at
            "#,
        )
        .bind(id)
        .bind(new_remaining)
        .bind(new_status)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::Database)
    }

    pub async fn mark_expired(&self, tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE holds SET status = 'EXPIRED' WHERE id = $1 AND status = 'ACTIVE'")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    /// Active holds whose `expires_at` has passed, for the background sweep.
    pub async fn find_expired_active(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Hold>, AppError> {
        sqlx::query_as::<_, Hold>(
            r#"
            SELECT id, wallet_id, amount, remaining_amount, currency, status, expires_at,
                   created_by_api_key_id, idempotency_key, journal_entry_id, created_at
            FROM holds WHERE status = 'ACTIVE' AND expires_at < $1
            ORDER BY expires_at ASC
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }
}
