use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::{JournalEntryType, PendingLine, WalletType};
use crate::repositories::WalletRepository;
use crate::services::ledger_engine::{LedgerEngine, PostOutcome};
use crate::services::wallet_service::WalletService;
use rust_decimal::Decimal;
use uuid::Uuid;

pub struct DepositRequest {
    pub to_wallet_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub idempotency_key: String,
    pub created_by_api_key_id: Uuid,
    pub reference_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Credits a wallet from the system source wallet for its currency. The
/// only operation that introduces value into the ledger rather than moving
/// it between existing wallets; the system wallet's available balance is
/// allowed to go negative since it is the conservation counterweight, not
/// a spendable balance.
pub struct DepositService {
    engine: LedgerEngine,
    wallet_service: WalletService,
    wallet_repo: WalletRepository,
}

impl DepositService {
    pub fn new(engine: LedgerEngine, wallet_service: WalletService, wallet_repo: WalletRepository) -> Self {
        Self {
            engine,
            wallet_service,
            wallet_repo,
        }
    }

    pub async fn deposit(&self, req: DepositRequest) -> AppResult<PostOutcome> {
        if req.amount <= Decimal::ZERO {
            return Err(AppError::domain(ErrorCode::InvalidAmount, "amount must be positive"));
        }

        if let Some(outcome) = self
            .engine
            .probe_idempotency(&req.idempotency_key, req.created_by_api_key_id, JournalEntryType::DepositExternal)
            .await?
        {
            return Ok(outcome);
        }

        let recipient = self.wallet_service.find_by_id(req.to_wallet_id).await?;
        self.wallet_service.ensure_active(&recipient)?;

        if recipient.currency != req.currency {
            return Err(AppError::domain(ErrorCode::CurrencyMismatch, "deposit currency does not match recipient wallet"));
        }

        let system_wallet = self
            .wallet_repo
            .find_by_type_and_currency(WalletType::System, &req.currency)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("no system wallet configured for currency {}", req.currency)))?;

        let system_account = self.wallet_service.available_account(system_wallet.id).await?;
        let recipient_account = self.wallet_service.available_account(req.to_wallet_id).await?;

        let mut tx = self.engine.begin().await?;

        self.engine
            .lock_accounts(&mut tx, &[system_account.id, recipient_account.id])
            .await?;

        let lines = vec![
            PendingLine::debit(system_account.id, req.amount, req.currency.clone()),
            PendingLine::credit(recipient_account.id, req.amount, req.currency.clone()),
        ];

        let outcome = self
            .engine
            .post(
                &mut tx,
                JournalEntryType::DepositExternal,
                req.created_by_api_key_id,
                &req.idempotency_key,
                &lines,
                req.reference_id,
                req.metadata,
            )
            .await?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(outcome)
    }
}
