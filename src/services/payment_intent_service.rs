use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::{ApiKey, JournalEntryType, PaymentIntent, PaymentIntentStatus, PendingLine};
use crate::repositories::PaymentIntentRepository;
use crate::services::ledger_engine::LedgerEngine;
use crate::services::limits::{check_counterparty_allowed, check_daily_max, check_per_tx_max};
use crate::services::wallet_service::WalletService;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

const MIN_INTENT_EXPIRES_IN_SECONDS: i64 = 60;
const MAX_INTENT_EXPIRES_IN_SECONDS: i64 = 24 * 60 * 60;

pub struct CreateIntentRequest {
    pub merchant_wallet_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub expires_in_seconds: i64,
    pub metadata: Option<serde_json::Value>,
}

pub struct PayIntentRequest {
    pub intent_id: Uuid,
    pub payer_wallet_id: Uuid,
    pub idempotency_key: String,
    pub created_by_api_key: ApiKey,
}

/// A merchant-initiated request for payment. Creation never touches the
/// ledger - only `pay` does, atomically with the status transition.
pub struct PaymentIntentService {
    engine: LedgerEngine,
    wallet_service: WalletService,
    intent_repo: PaymentIntentRepository,
}

impl PaymentIntentService {
    pub fn new(engine: LedgerEngine, wallet_service: WalletService, intent_repo: PaymentIntentRepository) -> Self {
        Self {
            engine,
            wallet_service,
            intent_repo,
        }
    }

    pub async fn create(&self, req: CreateIntentRequest) -> AppResult<PaymentIntent> {
        if req.amount <= Decimal::ZERO {
            return Err(AppError::domain(ErrorCode::InvalidAmount, "amount must be positive"));
        }
        if req.expires_in_seconds < MIN_INTENT_EXPIRES_IN_SECONDS
            || req.expires_in_seconds > MAX_INTENT_EXPIRES_IN_SECONDS
        {
            return Err(AppError::domain(
                ErrorCode::Validation,
                "expires_in must be between 60 seconds and 24 hours",
            ));
        }

        let merchant = self.wallet_service.find_by_id(req.merchant_wallet_id).await?;
        self.wallet_service.ensure_active(&merchant)?;

        if merchant.currency != req.currency {
            return Err(AppError::domain(
                ErrorCode::CurrencyMismatch,
                "intent currency does not match merchant wallet",
            ));
        }

        let intent = PaymentIntent {
            id: Uuid::new_v4(),
            merchant_wallet_id: req.merchant_wallet_id,
            amount: req.amount,
            currency: req.currency,
            status: PaymentIntentStatus::RequiresPayment,
            expires_at: Utc::now() + Duration::seconds(req.expires_in_seconds),
            payer_wallet_id: None,
            journal_entry_id: None,
            metadata: req.metadata,
            created_at: Utc::now(),
        };

        self.intent_repo.create(&intent).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<PaymentIntent> {
        let intent = self
            .intent_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::domain(ErrorCode::PaymentIntentNotFound, "payment intent not found"))?;

        if intent.status == PaymentIntentStatus::RequiresPayment && intent.is_expired(Utc::now()) {
            self.intent_repo.mark_expired(id).await?;
            return Ok(PaymentIntent {
                status: PaymentIntentStatus::Expired,
                ..intent
            });
        }

        Ok(intent)
    }

    pub async fn pay(&self, req: PayIntentRequest) -> AppResult<PaymentIntent> {
        if let Some(outcome) = self
            .engine
            .probe_idempotency(&req.idempotency_key, req.created_by_api_key.id, JournalEntryType::Transfer)
            .await?
        {
            if let Some(paid) = self.intent_repo.find_by_id(req.intent_id).await? {
                if paid.journal_entry_id == Some(outcome.entry.id) {
                    return Ok(paid);
                }
            }
            return Err(AppError::domain(
                ErrorCode::IdempotencyConflict,
                "idempotency key already used for a different operation",
            ));
        }

        let payer_wallet = self.wallet_service.find_by_id(req.payer_wallet_id).await?;
        self.wallet_service.ensure_active(&payer_wallet)?;

        let mut tx = self.engine.begin().await?;

        let intent = self
            .intent_repo
            .find_by_id_for_update(&mut tx, req.intent_id)
            .await?
            .ok_or_else(|| AppError::domain(ErrorCode::PaymentIntentNotFound, "payment intent not found"))?;

        let now = Utc::now();
        if !intent.can_pay(now) {
            if intent.is_expired(now) && intent.status == PaymentIntentStatus::RequiresPayment {
                return Err(AppError::domain(ErrorCode::PaymentIntentExpired, "payment intent has expired"));
            }
            return Err(AppError::domain(
                ErrorCode::PaymentIntentNotPayable,
                "payment intent is not in a payable state",
            ));
        }

        if intent.merchant_wallet_id == req.payer_wallet_id {
            return Err(AppError::domain(ErrorCode::SelfPayment, "cannot pay your own payment intent"));
        }

        if payer_wallet.currency != intent.currency {
            return Err(AppError::domain(
                ErrorCode::CurrencyMismatch,
                "payer wallet currency does not match the intent",
            ));
        }

        check_per_tx_max(&req.created_by_api_key, intent.amount)?;
        check_counterparty_allowed(
            &req.created_by_api_key,
            &intent.merchant_wallet_id.to_string(),
            None,
        )?;

        let payer_account = self.wallet_service.available_account(req.payer_wallet_id).await?;
        let merchant_account = self.wallet_service.available_account(intent.merchant_wallet_id).await?;

        self.engine
            .lock_accounts(&mut tx, &[payer_account.id, merchant_account.id])
            .await?;

        if let Some(limits) = req.created_by_api_key.limits() {
            if limits.daily_max.is_some() {
                let start_of_day = Utc::now().date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc();
                let spent_today = self
                    .engine
                    .posted_debits_since(&mut tx, payer_account.id, start_of_day)
                    .await?;
                check_daily_max(&req.created_by_api_key, spent_today, intent.amount)?;
            }
        }

        let payer_balance = self.engine.balance_of(&mut tx, payer_account.id).await?;
        if payer_balance < intent.amount {
            return Err(AppError::domain(ErrorCode::InsufficientFunds, "insufficient available balance"));
        }

        let lines = vec![
            PendingLine::debit(payer_account.id, intent.amount, intent.currency.clone()),
            PendingLine::credit(merchant_account.id, intent.amount, intent.currency.clone()),
        ];

        let outcome = self
            .engine
            .post(
                &mut tx,
                JournalEntryType::Transfer,
                req.created_by_api_key.id,
                &req.idempotency_key,
                &lines,
                Some(intent.id.to_string()),
                None,
            )
            .await?;

        let paid = self
            .intent_repo
            .mark_paid(&mut tx, intent.id, req.payer_wallet_id, outcome.entry.id)
            .await?
            .ok_or_else(|| AppError::domain(ErrorCode::PaymentIntentNotPayable, "payment intent was already paid"))?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(paid)
    }

    pub async fn cancel(&self, id: Uuid) -> AppResult<PaymentIntent> {
        self.intent_repo
            .mark_cancelled(id)
            .await?
            .ok_or_else(|| AppError::domain(ErrorCode::PaymentIntentNotPayable, "payment intent cannot be cancelled"))
    }
}
