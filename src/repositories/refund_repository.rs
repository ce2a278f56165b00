use crate::error::AppError;
use crate::models::Refund;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

pub struct RefundRepository {
    pool: PgPool,
}

impl RefundRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        refund: &Refund,
    ) -> Result<Refund, AppError> {
        sqlx::query_as::<_, Refund>(
            r#"
            INSERT INTO refunds
                (id, capture_id, amount, currency, journal_entry_id, idempotency_key, created_by_api_key_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, capture_id, amount, currency, journal_entry_id, idempotency_key, created_by_api_key_id, created_at
            "#,
        )
        .bind(refund.id)
        .bind(refund.capture_id)
        .bind(refund.amount)
        .bind(&refund.currency)
        .bind(refund.journal_entry_id)
        .bind(&refund.idempotency_key)
        .bind(refund.created_by_api_key_id)
        .bind(refund.created_at)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Refund>, AppError> {
        sqlx::query_as::<_, Refund>(
            r#"
            SELECT id, capture_id, amount, currency, journal_entry_id, idempotency_key, created_by_api_key_id, created_at
            FROM refunds WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_idempotency(
        &self,
        idempotency_key: &str,
        created_by_api_key_id: Uuid,
    ) -> Result<Option<Refund>, AppError> {
        sqlx::query_as::<_, Refund>(
            r#"
            SELECT id, capture_id, amount, currency, journal_entry_id, idempotency_key, created_by_api_key_id, created_at
            FROM refunds WHERE idempotency_key = $1 AND created_by_api_key_id = $2
            "#,
        )
        .bind(idempotency_key)
        .bind(created_by_api_key_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }
}
