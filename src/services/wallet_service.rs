use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::{LedgerAccount, LedgerAccountKind, Wallet, WalletStatus, WalletType};
use crate::repositories::{LedgerAccountRepository, WalletRepository};
use sqlx::PgPool;
use uuid::Uuid;

/// Wallet lifecycle and the ledger-account bootstrap every wallet needs:
/// exactly one available and one held account, created alongside it.
pub struct WalletService {
    pool: PgPool,
    wallet_repo: WalletRepository,
    ledger_account_repo: LedgerAccountRepository,
}

impl WalletService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            wallet_repo: WalletRepository::new(pool.clone()),
            ledger_account_repo: LedgerAccountRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn create_wallet(
        &self,
        wallet_type: WalletType,
        currency: String,
        handle: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> AppResult<Wallet> {
        if currency.len() != 3 {
            return Err(AppError::domain(ErrorCode::Validation, "currency must be a 3-letter code"));
        }

        if let Some(handle) = &handle {
            let normalized = crate::models::normalize_handle(handle);
            if self.wallet_repo.exists_by_handle(&normalized).await? {
                return Err(AppError::domain(ErrorCode::Validation, "handle already in use"));
            }
        }

        let mut wallet = Wallet::new(wallet_type, currency.clone());
        if let Some(handle) = handle {
            wallet = wallet.with_handle(handle);
        }
        if let Some(metadata) = metadata {
            wallet = wallet.with_metadata(metadata);
        }

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let wallet = sqlx::query_as::<_, Wallet>(
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
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        for kind in [LedgerAccountKind::Available, LedgerAccountKind::Held] {
            let account = LedgerAccount::new(wallet.id, kind, currency.clone());
            sqlx::query(
                r#"
                INSERT INTO ledger_accounts (id, wallet_id, kind, currency, created_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(account.id)
            .bind(account.wallet_id)
            .bind(account.kind)
            .bind(&account.currency)
            .bind(account.created_at)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;

        Ok(wallet)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Wallet> {
        self.wallet_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::domain(ErrorCode::NotFound, "wallet not found"))
    }

    pub async fn available_account(&self, wallet_id: Uuid) -> AppResult<LedgerAccount> {
        self.ledger_account_repo
            .find_by_wallet_and_kind(wallet_id, LedgerAccountKind::Available)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("wallet {} missing available account", wallet_id)))
    }

    pub async fn held_account(&self, wallet_id: Uuid) -> AppResult<LedgerAccount> {
        self.ledger_account_repo
            .find_by_wallet_and_kind(wallet_id, LedgerAccountKind::Held)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("wallet {} missing held account", wallet_id)))
    }

    /// Available and held balances, each derived independently without a
    /// lock. For display only - never read this to gate a posting.
    pub async fn balances(&self, wallet_id: Uuid) -> AppResult<(rust_decimal::Decimal, rust_decimal::Decimal)> {
        let available = self.available_account(wallet_id).await?;
        let held = self.held_account(wallet_id).await?;
        let available_balance = self.ledger_account_repo.derive_balance_unlocked(available.id).await?;
        let held_balance = self.ledger_account_repo.derive_balance_unlocked(held.id).await?;
        Ok((available_balance, held_balance))
    }

    /// Frozen blocks both initiating and receiving transactions.
    pub async fn freeze(&self, id: Uuid) -> AppResult<Wallet> {
        let wallet = self.find_by_id(id).await?;
        if wallet.status.is_closed() {
            return Err(AppError::domain(ErrorCode::WalletClosed, "cannot freeze a closed wallet"));
        }
        self.wallet_repo
            .update_status(id, WalletStatus::Frozen)
            .await?
            .ok_or_else(|| AppError::domain(ErrorCode::NotFound, "wallet not found"))
    }

    pub async fn unfreeze(&self, id: Uuid) -> AppResult<Wallet> {
        let wallet = self.find_by_id(id).await?;
        if wallet.status.is_closed() {
            return Err(AppError::domain(ErrorCode::WalletClosed, "cannot unfreeze a closed wallet"));
        }
        self.wallet_repo
            .update_status(id, WalletStatus::Active)
            .await?
            .ok_or_else(|| AppError::domain(ErrorCode::NotFound, "wallet not found"))
    }

    /// Closing is terminal: a closed wallet never transitions again.
    pub async fn close(&self, id: Uuid) -> AppResult<Wallet> {
        let wallet = self.find_by_id(id).await?;
        if wallet.status.is_closed() {
            return Ok(wallet);
        }
        self.wallet_repo
            .update_status(id, WalletStatus::Closed)
            .await?
            .ok_or_else(|| AppError::domain(ErrorCode::NotFound, "wallet not found"))
    }

    /// Ensures a wallet is active, mapping its non-operational states to the
    /// precise wire error code a caller expects.
    pub fn ensure_active(&self, wallet: &Wallet) -> AppResult<()> {
        match wallet.status {
            WalletStatus::Active => Ok(()),
            WalletStatus::Frozen => Err(AppError::domain(ErrorCode::WalletFrozen, "wallet is frozen")),
            WalletStatus::Closed => Err(AppError::domain(ErrorCode::WalletClosed, "wallet is closed")),
        }
    }
}
