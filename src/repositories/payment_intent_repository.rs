use crate::error::AppError;
use crate::models::PaymentIntent;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

pub struct PaymentIntentRepository {
    pool: PgPool,
}

impl PaymentIntentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, intent: &PaymentIntent) -> Result<PaymentIntent, AppError> {
        sqlx::query_as::<_, PaymentIntent>(
            r#"
            INSERT INTO payment_intents
                (id, merchant_wallet_id, amount, currency, status, expires_at,
                 payer_wallet_id, journal_entry_id, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, merchant_wallet_id, amount, currency, status, expires_at,
                      payer_wallet_id, journal_entry_id, metadata, created_at
            "#,
        )
        .bind(intent.id)
        .bind(intent.merchant_wallet_id)
        .bind(intent.amount)
        .bind(&intent.currency)
        .bind(intent.status)
        .bind(intent.expires_at)
        .bind(intent.payer_wallet_id)
        .bind(intent.journal_entry_id)
        .bind(&intent.metadata)
        .bind(intent.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<PaymentIntent>, AppError> {
        sqlx::query_as::<_, PaymentIntent>(
            r#"
            SELECT id, merchant_wallet_id, amount, currency, status, expires_at,
                   payer_wallet_id, journal_entry_id, metadata, created_at
            FROM payment_intents WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<PaymentIntent>, AppError> {
        sqlx::query_as::<_, PaymentIntent>(
            r#"
            SELECT id, merchant_wallet_id, amount, currency, status, expires_at,
                   payer_wallet_id, journal_entry_id, metadata, created_at
            FROM payment_intents WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::Database)
    }

    /// Atomic transition to `PAID`, guarded by the current status so two
    /// concurrent `pay` calls can't both succeed.
    pub async fn mark_paid(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        payer_wallet_id: Uuid,
        journal_entry_id: Uuid,
    ) -> Result<Option<PaymentIntent>, AppError> {
        sqlx::query_as::<_, PaymentIntent>(
            r#"
            UPDATE payment_intents
            SET status = 'PAID', payer_wallet_id = $2, journal_entry_id = $3
            WHERE id = $1 AND status = 'REQUIRES_PAYMENT'
            RETURNING id, merchant_wallet_id, amount, currency, status, expires_at,
                      payer_wallet_id, journal_entry_id, metadata, created_at
            "#,
        )
        .bind(id)
        .bind(payer_wallet_id)
        .bind(journal_entry_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::Database)
    }

    pub async fn mark_cancelled(&self, id: Uuid) -> Result<Option<PaymentIntent>, AppError> {
        sqlx::query_as::<_, PaymentIntent>(
            r#"
            UPDATE payment_intents SET status = 'CANCELLED'
            WHERE id = $1 AND status = 'REQUIRES_PAYMENT'
            RETURNING id, merchant_wallet_id, amount, currency, status, expires_at,
                      payer_wallet_id, journal_entry_id, metadata, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn mark_expired(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE payment_intents SET status = 'EXPIRED' WHERE id = $1 AND status = 'REQUIRES_PAYMENT'",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;
        Ok(())
    }
}
