use crate::error::AppError;
use crate::models::{JournalEntry, JournalEntryType, JournalLine, PendingLine};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Persists journal entries and their lines, and answers the queries the
/// transaction feed and idempotency probes need. Entries are append-only:
/// nothing here ever updates a posted entry or line.
pub struct JournalRepository {
    pool: PgPool,
}

impl JournalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_entry(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entry: &JournalEntry,
    ) -> Result<JournalEntry, AppError> {
        sqlx::query_as::<_, JournalEntry>(
            r#"
            INSERT INTO journal_entries
                (id, type, status, idempotency_key, reference_id, created_by_api_key_id, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, type, status, idempotency_key, reference_id, created_by_api_key_id, metadata, created_at
            "#,
        )
        .bind(entry.id)
        .bind(entry.entry_type)
        .bind(entry.status)
        .bind(&entry.idempotency_key)
        .bind(&entry.reference_id)
        .bind(entry.created_by_api_key_id)
        .bind(&entry.metadata)
        .bind(entry.created_at)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::Database)
    }

    pub async fn insert_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entry_id: Uuid,
        lines: &[PendingLine],
    ) -> Result<Vec<JournalLine>, AppError> {
        let mut inserted = Vec::with_capacity(lines.len());
        for line in lines {
            let row = sqlx::query_as::<_, JournalLine>(
                r#"
                INSERT INTO journal_lines (id, journal_entry_id, ledger_account_id, direction, amount, currency, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, journal_entry_id, ledger_account_id, direction, amount, currency, created_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(entry_id)
            .bind(line.ledger_account_id)
            .bind(line.direction)
            .bind(line.amount)
            .bind(&line.currency)
            .bind(Utc::now())
            .fetch_one(&mut **tx)
            .await
            .map_err(AppError::Database)?;
            inserted.push(row);
        }
        Ok(inserted)
    }

    /// Finds a prior entry matching `(idempotency_key, creator)` scoped to
    /// an operation family. Used both as the pre-flight probe and as the
    /// single retry after a unique-constraint violation on insert.
    pub async fn find_by_idempotency(
        &self,
        idempotency_key: &str,
        created_by_api_key_id: Uuid,
    ) -> Result<Option<JournalEntry>, AppError> {
        sqlx::query_as::<_, JournalEntry>(
            r#"
            SELECT id, type, status, idempotency_key, reference_id, created_by_api_key_id, metadata, created_at
            FROM journal_entries
            WHERE idempotency_key = $1 AND created_by_api_key_id = $2
            "#,
        )
        .bind(idempotency_key)
        .bind(created_by_api_key_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_idempotency_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        idempotency_key: &str,
        created_by_api_key_id: Uuid,
    ) -> Result<Option<JournalEntry>, AppError> {
        sqlx::query_as::<_, JournalEntry>(
            r#"
            SELECT id, type, status, idempotency_key, reference_id, created_by_api_key_id, metadata, created_at
            FROM journal_entries
            WHERE idempotency_key = $1 AND created_by_api_key_id = $2
            "#,
        )
        .bind(idempotency_key)
        .bind(created_by_api_key_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<JournalEntry>, AppError> {
        sqlx::query_as::<_, JournalEntry>(
            r#"
            SELECT id, type, status, idempotency_key, reference_id, created_by_api_key_id, metadata, created_at
            FROM journal_entries WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_lines_by_entry(&self, entry_id: Uuid) -> Result<Vec<JournalLine>, AppError> {
        sqlx::query_as::<_, JournalLine>(
            r#"
            SELECT id, journal_entry_id, ledger_account_id, direction, amount, currency, created_at
            FROM journal_lines WHERE journal_entry_id = $1
            "#,
        )
        .bind(entry_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    /// One row per journal entry touching any ledger account owned by
    /// `wallet_id`, newest first, keyed by a `(created_at, entry_id)`
    /// cursor. `after` excludes everything at or after the given position.
    #[allow(clippy::too_many_arguments)]
    pub async fn list_for_wallet(
        &self,
        wallet_id: Uuid,
        entry_type: Option<JournalEntryType>,
        status: Option<crate::models::JournalEntryStatus>,
        from_date: Option<DateTime<Utc>>,
        to_date: Option<DateTime<Utc>>,
        after: Option<(DateTime<Utc>, Uuid)>,
        limit: i64,
    ) -> Result<Vec<(JournalEntry, JournalLine)>, AppError> {
        let (after_created_at, after_id) = match after {
            Some((c, i)) => (Some(c), Some(i)),
            None => (None, None),
        };

        let rows = sqlx::query_as::<_, (
            Uuid, JournalEntryType, crate::models::JournalEntryStatus, String, Option<String>,
            Uuid, Option<serde_json::Value>, DateTime<Utc>,
            Uuid, Uuid, Uuid, crate::models::JournalLineDirection, rust_decimal::Decimal, String, DateTime<Utc>,
        )>(
            r#"
            SELECT
                je.id, je.type, je.status, je.idempotency_key, je.reference_id,
                je.created_by_api_key_id, je.metadata, je.created_at,
                jl.id, jl.journal_entry_id, jl.ledger_account_id, jl.direction, jl.amount, jl.currency, jl.created_at
            FROM journal_lines jl
            JOIN journal_entries je ON je.id = jl.journal_entry_id
            JOIN ledger_accounts la ON la.id = jl.ledger_account_id
            WHERE la.wallet_id = $1
              AND ($2::journal_entry_type IS NULL OR je.type = $2)
              AND ($3::journal_entry_status IS NULL OR je.status = $3)
              AND ($4::timestamptz IS NULL OR je.created_at >= $4)
              AND ($5::timestamptz IS NULL OR je.created_at <= $5)
              AND ($6::timestamptz IS NULL OR (je.created_at, je.id) < ($6, $7))
            ORDER BY je.created_at DESC, je.id DESC
            LIMIT $8
            "#,
        )
        .bind(wallet_id)
        .bind(entry_type)
        .bind(status)
        .bind(from_date)
        .bind(to_date)
        .bind(after_created_at)
        .bind(after_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows
            .into_iter()
            .map(|(eid, etype, estatus, ikey, rid, creator, meta, ecreated, lid, ljid, laid, dir, amt, cur, lcreated)| {
                (
                    JournalEntry {
                        id: eid,
                        entry_type: etype,
                        status: estatus,
                        idempotency_key: ikey,
                        reference_id: rid,
                        created_by_api_key_id: creator,
                        metadata: meta,
                        created_at: ecreated,
                    },
                    JournalLine {
                        id: lid,
                        journal_entry_id: ljid,
                        ledger_account_id: laid,
                        direction: dir,
                        amount: amt,
                        currency: cur,
                        created_at: lcreated,
                    },
                )
            })
            .collect())
    }

    /// All lines belonging to one entry, used to find the counterparty leg
    /// (the line whose ledger account is not the caller's own).
    pub async fn find_other_lines_for_entry(
        &self,
        entry_id: Uuid,
        exclude_wallet_id: Uuid,
    ) -> Result<Vec<(JournalLine, Uuid, Option<String>)>, AppError> {
        let rows = sqlx::query_as::<_, (
            Uuid, Uuid, Uuid, crate::models::JournalLineDirection, rust_decimal::Decimal, String, DateTime<Utc>,
            Uuid, Option<String>,
        )>(
            r#"
            SELECT jl.id, jl.journal_entry_id, jl.ledger_account_id, jl.direction, jl.amount, jl.currency, jl.created_at,
                   la.wallet_id, w.handle
            FROM journal_lines jl
            JOIN ledger_accounts la ON la.id = jl.ledger_account_id
            JOIN wallets w ON w.id = la.wallet_id
            WHERE jl.journal_entry_id = $1 AND la.wallet_id != $2
            "#,
        )
        .bind(entry_id)
        .bind(exclude_wallet_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows
            .into_iter()
            .map(|(id, jeid, laid, dir, amt, cur, created, wallet_id, handle)| {
                (
                    JournalLine {
                        id,
                        journal_entry_id: jeid,
                        ledger_account_id: laid,
                        direction: dir,
                        amount: amt,
                        currency: cur,
                        created_at: created,
                    },
                    wallet_id,
                    handle,
                )
            })
            .collect())
    }
}
