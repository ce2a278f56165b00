use crate::error::AppError;
use crate::models::{LedgerAccount, LedgerAccountKind};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// CRUD plus the two queries the ledger engine's lock discipline depends
/// on: taking row locks in ascending account-id order, and deriving a
/// balance by summing posted lines after those locks are held.
pub struct LedgerAccountRepository {
    pool: PgPool,
}

impl LedgerAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, account: &LedgerAccount) -> Result<LedgerAccount, AppError> {
        sqlx::query_as::<_, LedgerAccount>(
            r#"
            INSERT INTO ledger_accounts (id, wallet_id, kind, currency, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, wallet_id, kind, currency, created_at
            "#,
        )
        .bind(account.id)
        .bind(account.wallet_id)
        .bind(account.kind)
        .bind(&account.currency)
        .bind(account.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_wallet_and_kind(
        &self,
        wallet_id: Uuid,
        kind: LedgerAccountKind,
    ) -> Result<Option<LedgerAccount>, AppError> {
        sqlx::query_as::<_, LedgerAccount>(
            r#"
            SELECT id, wallet_id, kind, currency, created_at
            FROM ledger_accounts WHERE wallet_id = $1 AND kind = $2
            "#,
        )
        .bind(wallet_id)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<LedgerAccount>, AppError> {
        sqlx::query_as::<_, LedgerAccount>(
            "SELECT id, wallet_id, kind, currency, created_at FROM ledger_accounts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    /// Locks the given ledger account rows inside `tx`, always in ascending
    /// id order, regardless of the order ids were supplied in. This is the
    /// only permitted lock order; callers must never lock out of sequence.
    pub async fn lock_accounts_sorted(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        account_ids: &[Uuid],
    ) -> Result<Vec<LedgerAccount>, AppError> {
        let mut sorted = account_ids.to_vec();
        sorted.sort();
        sorted.dedup();

        let mut locked = Vec::with_capacity(sorted.len());
        for id in sorted {
            let row = sqlx::query_as::<_, LedgerAccount>(
                r#"
                SELECT id, wallet_id, kind, currency, created_at
                FROM ledger_accounts WHERE id = $1
                FOR UPDATE
                "#,
            )
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("ledger account {} not found", id)))?;
            locked.push(row);
        }
        Ok(locked)
    }

    /// Derives the posted balance of an account: sum(posted credits) minus
    /// sum(posted debits). MUST be called only after the account's row lock
    /// is held, never before.
    pub async fn derive_balance(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ledger_account_id: Uuid,
    ) -> Result<Decimal, AppError> {
        let row: (Decimal,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(
                CASE jl.direction
                    WHEN 'CREDIT' THEN jl.amount
                    WHEN 'DEBIT' THEN -jl.amount
                END
            ), 0)
            FROM journal_lines jl
            JOIN journal_entries je ON je.id = jl.journal_entry_id
            WHERE jl.ledger_account_id = $1 AND je.status = 'POSTED'
            "#,
        )
        .bind(ledger_account_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::Database)?;
        Ok(row.0)
    }

    /// Derives an account's posted balance without taking a lock, for plain
    /// reads (e.g. `GET /wallets/me/balance`) outside of a posting
    /// transaction. Eventually consistent with the most recent commit.
    pub async fn derive_balance_unlocked(&self, ledger_account_id: Uuid) -> Result<Decimal, AppError> {
        let row: (Decimal,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(
                CASE jl.direction
                    WHEN 'CREDIT' THEN jl.amount
                    WHEN 'DEBIT' THEN -jl.amount
                END
            ), 0)
            FROM journal_lines jl
            JOIN journal_entries je ON je.id = jl.journal_entry_id
            WHERE jl.ledger_account_id = $1 AND je.status = 'POSTED'
            "#,
        )
        .bind(ledger_account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;
        Ok(row.0)
    }

    /// Sum of posted debit lines on an account since a given instant, used
    /// to compute a key's spend-today against its daily cap. Call inside
    /// the same transaction/lock scope as the operation being checked.
    pub async fn sum_posted_debits_since(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ledger_account_id: Uuid,
        since: chrono::DateTime<chrono::Utc>,
    ) -> Result<Decimal, AppError> {
        let row: (Decimal,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(jl.amount), 0)
            FROM journal_lines jl
            JOIN journal_entries je ON je.id = jl.journal_entry_id
            WHERE jl.ledger_account_id = $1
              AND jl.direction = 'DEBIT'
              AND je.status = 'POSTED'
              AND je.created_at >= $2
            "#,
        )
        .bind(ledger_account_id)
        .bind(since)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::Database)?;
        Ok(row.0)
    }
}
