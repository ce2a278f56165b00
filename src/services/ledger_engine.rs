use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::{
    JournalEntry, JournalEntryStatus, JournalEntryType, JournalLine, JournalLineDirection,
    LedgerAccount, PendingLine,
};
use crate::repositories::{JournalRepository, LedgerAccountRepository};
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Outcome of posting an entry: either it was posted for the first time, or
/// an idempotent replay returned the original.
pub struct PostOutcome {
    pub entry: JournalEntry,
    pub lines: Vec<JournalLine>,
    pub replayed: bool,
}

/// The posting primitive every mutating operation funnels through.
///
/// Call sequence a service is expected to follow inside one DB transaction:
/// probe idempotency, resolve/validate business state, `lock_accounts` in
/// sorted order, `balance_of` to read post-lock balances, check limits and
/// sufficiency, then `post` the balanced lines and commit.
pub struct LedgerEngine {
    pool: PgPool,
    journal_repo: JournalRepository,
    ledger_account_repo: LedgerAccountRepository,
}

impl LedgerEngine {
    pub fn new(pool: PgPool) -> Self {
        Self {
            journal_repo: JournalRepository::new(pool.clone()),
            ledger_account_repo: LedgerAccountRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn begin(&self) -> AppResult<Transaction<'_, Postgres>> {
        self.pool.begin().await.map_err(AppError::Database)
    }

    /// Pre-flight idempotency probe, scoped to `(idempotency_key, creator)`
    /// and to the caller's operation family. A hit against the wrong family
    /// is a conflict, never a silent accept.
    pub async fn probe_idempotency(
        &self,
        idempotency_key: &str,
        created_by_api_key_id: Uuid,
        expected_type: JournalEntryType,
    ) -> AppResult<Option<PostOutcome>> {
        let Some(existing) = self
            .journal_repo
            .find_by_idempotency(idempotency_key, created_by_api_key_id)
            .await?
        else {
            return Ok(None);
        };

        if existing.entry_type != expected_type {
            return Err(AppError::domain(
                ErrorCode::IdempotencyConflict,
                "idempotency key already used for a different operation",
            ));
        }

        let lines = self.journal_repo.find_lines_by_entry(existing.id).await?;
        Ok(Some(PostOutcome {
            entry: existing,
            lines,
            replayed: true,
        }))
    }

    /// Locks the given ledger accounts in ascending id order. This is the
    /// only permitted lock order; it must happen before any balance read.
    pub async fn lock_accounts(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        account_ids: &[Uuid],
    ) -> AppResult<Vec<LedgerAccount>> {
        self.ledger_account_repo.lock_accounts_sorted(tx, account_ids).await
    }

    /// Derives an account's posted balance. Only meaningful once the
    /// account's lock is held.
    pub async fn balance_of(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ledger_account_id: Uuid,
    ) -> AppResult<Decimal> {
        self.ledger_account_repo.derive_balance(tx, ledger_account_id).await
    }

    pub async fn posted_debits_since(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ledger_account_id: Uuid,
        since: chrono::DateTime<Utc>,
    ) -> AppResult<Decimal> {
        self.ledger_account_repo
            .sum_posted_debits_since(tx, ledger_account_id, since)
            .await
    }

    /// Validates that a set of pending lines forms a legal balanced entry:
    /// at least two lines, at least one debit and one credit, every amount
    /// strictly positive, every line the same currency, and debits summing
    /// to exactly the credits.
    pub fn validate_lines(&self, lines: &[PendingLine]) -> AppResult<()> {
        if lines.len() < 2 {
            return Err(AppError::domain(
                ErrorCode::Validation,
                "an entry requires at least one debit and one credit line",
            ));
        }

        let mut debit_total = Decimal::ZERO;
        let mut credit_total = Decimal::ZERO;
        let mut has_debit = false;
        let mut has_credit = false;
        let currency = lines[0].currency.clone();

        for line in lines {
            if line.amount <= Decimal::ZERO {
                return Err(AppError::domain(ErrorCode::InvalidAmount, "line amounts must be positive"));
            }
            if line.currency != currency {
                return Err(AppError::domain(ErrorCode::CurrencyMismatch, "all lines in an entry must share a currency"));
            }
            match line.direction {
                JournalLineDirection::Debit => {
                    has_debit = true;
                    debit_total += line.amount;
                }
                JournalLineDirection::Credit => {
                    has_credit = true;
                    credit_total += line.amount;
                }
            }
        }

        if !has_debit || !has_credit {
            return Err(AppError::domain(
                ErrorCode::Validation,
                "an entry requires at least one debit and one credit line",
            ));
        }

        if debit_total != credit_total {
            return Err(AppError::domain(
                ErrorCode::Validation,
                "debits and credits in an entry must balance exactly",
            ));
        }

        Ok(())
    }

    /// Posts a balanced entry inside an already-open transaction. On a
    /// unique-constraint violation on `(idempotency_key, creator)` - the
    /// probe/insert race the prior check can't fully close - retries the
    /// probe once and returns the original result instead of propagating.
    pub async fn post(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entry_type: JournalEntryType,
        created_by_api_key_id: Uuid,
        idempotency_key: &str,
        lines: &[PendingLine],
        reference_id: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> AppResult<PostOutcome> {
        self.validate_lines(lines)?;

        let entry = JournalEntry {
            id: Uuid::new_v4(),
            entry_type,
            status: JournalEntryStatus::Posted,
            idempotency_key: idempotency_key.to_string(),
            reference_id,
            created_by_api_key_id,
            metadata,
            created_at: Utc::now(),
        };

        match self.journal_repo.insert_entry(tx, &entry).await {
            Ok(inserted) => {
                let inserted_lines = self.journal_repo.insert_lines(tx, inserted.id, lines).await?;
                Ok(PostOutcome {
                    entry: inserted,
                    lines: inserted_lines,
                    replayed: false,
                })
            }
            Err(AppError::Database(db_err)) if is_unique_violation(&db_err) => {
                let existing = self
                    .journal_repo
                    .find_by_idempotency_tx(tx, idempotency_key, created_by_api_key_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal(anyhow::anyhow!(
                            "unique violation on idempotency key but no matching entry found on retry"
                        ))
                    })?;
                if existing.entry_type != entry_type {
                    return Err(AppError::domain(
                        ErrorCode::IdempotencyConflict,
                        "idempotency key already used for a different operation",
                    ));
                }
                let lines = self.journal_repo.find_lines_by_entry(existing.id).await?;
                Ok(PostOutcome {
                    entry: existing,
                    lines,
                    replayed: true,
                })
            }
            Err(other) => Err(other),
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err.as_database_error().and_then(|e| e.code()),
        Some(code) if code == "23505"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn make_pool() -> PgPool {
        // Construction only; these tests never execute a query.
        PgPool::connect_lazy("postgres://localhost/test").unwrap()
    }

    #[test]
    fn test_validate_lines_requires_balance() {
        let engine = LedgerEngine::new(make_pool());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let lines = vec![
            PendingLine::debit(a, dec!(10.00), "USD"),
            PendingLine::credit(b, dec!(9.00), "USD"),
        ];
        let err = engine.validate_lines(&lines).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Validation);
    }

    #[test]
    fn test_validate_lines_requires_both_directions() {
        let engine = LedgerEngine::new(make_pool());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let lines = vec![
            PendingLine::debit(a, dec!(10.00), "USD"),
            PendingLine::debit(b, dec!(10.00), "USD"),
        ];
        assert!(engine.validate_lines(&lines).is_err());
    }

    #[test]
    fn test_validate_lines_rejects_mixed_currency() {
        let engine = LedgerEngine::new(make_pool());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let lines = vec![
            PendingLine::debit(a, dec!(10.00), "USD"),
            PendingLine::credit(b, dec!(10.00), "EUR"),
        ];
        let err = engine.validate_lines(&lines).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CurrencyMismatch);
    }

    #[test]
    fn test_validate_lines_rejects_nonpositive_amount() {
        let engine = LedgerEngine::new(make_pool());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let lines = vec![
            PendingLine::debit(a, dec!(0), "USD"),
            PendingLine::credit(b, dec!(0), "USD"),
        ];
        let err = engine.validate_lines(&lines).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidAmount);
    }

    #[test]
    fn test_validate_lines_accepts_balanced_pair() {
        let engine = LedgerEngine::new(make_pool());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let lines = vec![
            PendingLine::debit(a, dec!(10.00), "USD"),
            PendingLine::credit(b, dec!(10.00), "USD"),
        ];
        assert!(engine.validate_lines(&lines).is_ok());
    }
}
