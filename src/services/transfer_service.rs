use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::{ApiKey, JournalEntryType, PendingLine};
use crate::services::ledger_engine::{LedgerEngine, PostOutcome};
use crate::services::limits::{check_counterparty_allowed, check_daily_max, check_per_tx_max};
use crate::services::recipient_resolver::{RecipientIdentifier, RecipientResolver};
use crate::services::wallet_service::WalletService;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

pub struct TransferRequest {
    pub from_wallet_id: Uuid,
    pub recipient: RecipientIdentifier,
    pub amount: Decimal,
    pub currency: String,
    pub idempotency_key: String,
    pub created_by_api_key: ApiKey,
    pub reference_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Moves funds between two wallets' available balances in a single
/// balanced entry: debit source, credit recipient.
pub struct TransferService {
    engine: LedgerEngine,
    wallet_service: WalletService,
    resolver: RecipientResolver,
}

impl TransferService {
    pub fn new(engine: LedgerEngine, wallet_service: WalletService, resolver: RecipientResolver) -> Self {
        Self {
            engine,
            wallet_service,
            resolver,
        }
    }

    pub async fn transfer(&self, req: TransferRequest) -> AppResult<PostOutcome> {
        if req.amount <= Decimal::ZERO {
            return Err(AppError::domain(ErrorCode::InvalidAmount, "amount must be positive"));
        }

        if let Some(outcome) = self
            .engine
            .probe_idempotency(&req.idempotency_key, req.created_by_api_key.id, JournalEntryType::Transfer)
            .await?
        {
            return Ok(outcome);
        }

        let recipient = self.resolver.resolve(&req.recipient).await?;

        if recipient.wallet_id == req.from_wallet_id {
            return Err(AppError::domain(ErrorCode::SelfTransfer, "cannot transfer to the same wallet"));
        }

        let source_wallet = self.wallet_service.find_by_id(req.from_wallet_id).await?;
        self.wallet_service.ensure_active(&source_wallet)?;

        if source_wallet.currency != req.currency {
            return Err(AppError::domain(ErrorCode::CurrencyMismatch, "transfer currency does not match source wallet"));
        }
        if recipient.currency != req.currency {
            return Err(AppError::domain(ErrorCode::CurrencyMismatch, "transfer currency does not match recipient wallet"));
        }

        check_per_tx_max(&req.created_by_api_key, req.amount)?;
        check_counterparty_allowed(
            &req.created_by_api_key,
            &recipient.wallet_id.to_string(),
            recipient.handle.as_deref(),
        )?;

        let source_account = self.wallet_service.available_account(req.from_wallet_id).await?;
        let dest_account = self.wallet_service.available_account(recipient.wallet_id).await?;

        let mut tx = self.engine.begin().await?;

        self.engine
            .lock_accounts(&mut tx, &[source_account.id, dest_account.id])
            .await?;

        let source_balance = self.engine.balance_of(&mut tx, source_account.id).await?;

        if let Some(limits) = req.created_by_api_key.limits() {
            if limits.daily_max.is_some() {
                let start_of_day = Utc::now().date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc();
                let spent_today = self
                    .engine
                    .posted_debits_since(&mut tx, source_account.id, start_of_day)
                    .await?;
                check_daily_max(&req.created_by_api_key, spent_today, req.amount)?;
            }
        }

        if source_balance < req.amount {
            return Err(AppError::domain(ErrorCode::InsufficientFunds, "insufficient available balance"));
        }

        let lines = vec![
            PendingLine::debit(source_account.id, req.amount, req.currency.clone()),
            PendingLine::credit(dest_account.id, req.amount, req.currency.clone()),
        ];

        let outcome = self
            .engine
            .post(
                &mut tx,
                JournalEntryType::Transfer,
                req.created_by_api_key.id,
                &req.idempotency_key,
                &lines,
                req.reference_id,
                req.metadata,
            )
            .await?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(outcome)
    }

    pub fn resolver(&self) -> &RecipientResolver {
        &self.resolver
    }
}
