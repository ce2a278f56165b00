use crate::error::AppError;
use crate::models::Capture;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

pub struct CaptureRepository {
    pool: PgPool,
}

impl CaptureRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        capture: &Capture,
    ) -> Result<Capture, AppError> {
        sqlx::query_as::<_, Capture>(
            r#"
            INSERT INTO captures
                (id, hold_id, to_wallet_id, amount, currency, journal_entry_id,
                 idempotency_key, created_by_api_key_id, refunded_amount, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, hold_id, to_wallet_id, amount, currency, journal_entry_id,
                      idempotency_key, created_by_api_key_id, refunded_amount, created_at
            "#,
        )
        .bind(capture.id)
        .bind(capture.hold_id)
        .bind(capture.to_wallet_id)
        .bind(capture.amount)
        .bind(&capture.currency)
        .bind(capture.journal_entry_id)
        .bind(&capture.idempotency_key)
        .bind(capture.created_by_api_key_id)
        .bind(capture.refunded_amount)
        .bind(capture.created_at)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Capture>, AppError> {
        sqlx::query_as::<_, Capture>(
            r#"
            SELECT id, hold_id, to_wallet_id, amount, currency, journal_entry_id,
                   idempotency_key, created_by_api_key_id, refunded_amount, created_at
            FROM captures WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    /// Locks the capture row so concurrent refunds against it serialize.
    pub async fn find_by_id_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Capture>, AppError> {
        sqlx::query_as::<_, Capture>(
            r#"
            SELECT id, hold_id, to_wallet_id, amount, currency, journal_entry_id,
                   idempotency_key, created_by_api_key_id, refunded_amount, created_at
            FROM captures WHERE id = $1
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
    ) -> Result<Option<Capture>, AppError> {
        sqlx::query_as::<_, Capture>(
            r#"
            SELECT id, hold_id, to_wallet_id, amount, currency, journal_entry_id,
                   idempotency_key, created_by_api_key_id, refunded_amount, created_at
            FROM captures WHERE idempotency_key = $1 AND created_by_api_key_id = $2
            "#,
        )
        .bind(idempotency_key)
        .bind(created_by_api_key_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn add_refunded_amount(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        delta: Decimal,
    ) -> Result<Capture, AppError> {
        sqlx::query_as::<_, Capture>(
            r#"
            UPDATE captures SET refunded_amount = refunded_amount + $2
            WHERE id = $1
            RETURNING id, hold_id, to_wallet_id, amount, currency, journal_entry_id,
                      idempotency_key, created_by_api_key_id, refunded_amount, created_at
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::Database)
    }
}
