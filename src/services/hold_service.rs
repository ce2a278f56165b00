use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::{ApiKey, Capture, Hold, HoldStatus, JournalEntryType, PendingLine};
use crate::repositories::{CaptureRepository, HoldRepository};
use crate::services::ledger_engine::LedgerEngine;
use crate::services::limits::{check_counterparty_allowed, check_daily_max, check_per_tx_max};
use crate::services::recipient_resolver::{RecipientIdentifier, RecipientResolver};
use crate::services::wallet_service::WalletService;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

const MIN_HOLD_EXPIRES_IN_SECONDS: i64 = 60;
const MAX_HOLD_EXPIRES_IN_SECONDS: i64 = 7 * 24 * 60 * 60;

pub struct CreateHoldRequest {
    pub wallet_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub expires_in_seconds: i64,
    pub idempotency_key: String,
    pub created_by_api_key: ApiKey,
    pub metadata: Option<serde_json::Value>,
}

pub struct CaptureRequest {
    pub hold_id: Uuid,
    pub recipient: RecipientIdentifier,
    pub amount: Option<Decimal>,
    pub idempotency_key: String,
    pub created_by_api_key: ApiKey,
}

pub struct ReleaseRequest {
    pub hold_id: Uuid,
    pub amount: Option<Decimal>,
    pub idempotency_key: String,
    pub created_by_api_key: ApiKey,
}

pub struct HoldService {
    engine: LedgerEngine,
    wallet_service: WalletService,
    resolver: RecipientResolver,
    hold_repo: HoldRepository,
    capture_repo: CaptureRepository,
}

impl HoldService {
    pub fn new(
        engine: LedgerEngine,
        wallet_service: WalletService,
        resolver: RecipientResolver,
        hold_repo: HoldRepository,
        capture_repo: CaptureRepository,
    ) -> Self {
        Self {
            engine,
            wallet_service,
            resolver,
            hold_repo,
            capture_repo,
        }
    }

    pub async fn create_hold(&self, req: CreateHoldRequest) -> AppResult<Hold> {
        if req.amount <= Decimal::ZERO {
            return Err(AppError::domain(ErrorCode::InvalidAmount, "amount must be positive"));
        }
        if req.expires_in_seconds < MIN_HOLD_EXPIRES_IN_SECONDS
            || req.expires_in_seconds > MAX_HOLD_EXPIRES_IN_SECONDS
        {
            return Err(AppError::domain(
                ErrorCode::Validation,
                "expires_in must be between 60 seconds and 7 days",
            ));
        }

        if let Some(existing) = self
            .hold_repo
            .find_by_idempotency(&req.idempotency_key, req.created_by_api_key.id)
            .await?
        {
            return Ok(existing);
        }

        let wallet = self.wallet_service.find_by_id(req.wallet_id).await?;
        self.wallet_service.ensure_active(&wallet)?;

        if wallet.currency != req.currency {
            return Err(AppError::domain(ErrorCode::CurrencyMismatch, "hold currency does not match wallet"));
        }

        check_per_tx_max(&req.created_by_api_key, req.amount)?;

        let available = self.wallet_service.available_account(req.wallet_id).await?;
        let held = self.wallet_service.held_account(req.wallet_id).await?;

        let mut tx = self.engine.begin().await?;
        self.engine.lock_accounts(&mut tx, &[available.id, held.id]).await?;

        if let Some(limits) = req.created_by_api_key.limits() {
            if limits.daily_max.is_some() {
                let start_of_day = Utc::now().date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc();
                let spent_today = self
                    .engine
                    .posted_debits_since(&mut tx, available.id, start_of_day)
                    .await?;
                check_daily_max(&req.created_by_api_key, spent_today, req.amount)?;
            }
        }

        let available_balance = self.engine.balance_of(&mut tx, available.id).await?;
        if available_balance < req.amount {
            return Err(AppError::domain(ErrorCode::InsufficientFunds, "insufficient available balance"));
        }

        let lines = vec![
            PendingLine::debit(available.id, req.amount, req.currency.clone()),
            PendingLine::credit(held.id, req.amount, req.currency.clone()),
        ];

        let outcome = self
            .engine
            .post(
                &mut tx,
                JournalEntryType::Hold,
                req.created_by_api_key.id,
                &req.idempotency_key,
                &lines,
                None,
                req.metadata,
            )
            .await?;

        let hold = Hold {
            id: Uuid::new_v4(),
            wallet_id: req.wallet_id,
            amount: req.amount,
            remaining_amount: req.amount,
            currency: req.currency,
            status: HoldStatus::Active,
            expires_at: Utc::now() + Duration::seconds(req.expires_in_seconds),
            created_by_api_key_id: req.created_by_api_key.id,
            idempotency_key: req.idempotency_key,
            journal_entry_id: outcome.entry.id,
            created_at: Utc::now(),
        };

        let hold = self.hold_repo.create(&mut tx, &hold).await?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(hold)
    }

    pub async fn capture(&self, req: CaptureRequest) -> AppResult<Capture> {
        if let Some(existing) = self
            .capture_repo
            .find_by_idempotency(&req.idempotency_key, req.created_by_api_key.id)
            .await?
        {
            return Ok(existing);
        }

        let recipient = self.resolver.resolve(&req.recipient).await?;

        let mut tx = self.engine.begin().await?;

        let hold = self
            .hold_repo
            .find_by_id_for_update(&mut tx, req.hold_id)
            .await?
            .ok_or_else(|| AppError::domain(ErrorCode::HoldNotFound, "hold not found"))?;

        if hold.wallet_id != req.created_by_api_key.wallet_id {
            return Err(AppError::domain(ErrorCode::HoldNotCapturable, "hold does not belong to caller's wallet"));
        }

        let now = Utc::now();
        if !hold.can_capture(now) {
            if hold.is_expired(now) {
                self.hold_repo.mark_expired(&mut tx, hold.id).await?;
                return Err(AppError::domain(ErrorCode::HoldExpired, "hold has expired"));
            }
            return Err(AppError::domain(ErrorCode::HoldNotCapturable, "hold is not active"));
        }

        let amount = req.amount.unwrap_or(hold.remaining_amount);
        if amount <= Decimal::ZERO {
            return Err(AppError::domain(ErrorCode::InvalidAmount, "amount must be positive"));
        }
        if amount > hold.remaining_amount {
            return Err(AppError::domain(ErrorCode::AmountExceedsHold, "amount exceeds hold's remaining balance"));
        }

        if recipient.currency != hold.currency {
            return Err(AppError::domain(ErrorCode::CurrencyMismatch, "recipient currency does not match hold"));
        }

        check_per_tx_max(&req.created_by_api_key, amount)?;
        check_counterparty_allowed(
            &req.created_by_api_key,
            &recipient.wallet_id.to_string(),
            recipient.handle.as_deref(),
        )?;

        let held = self.wallet_service.held_account(hold.wallet_id).await?;
        let dest_available = self.wallet_service.available_account(recipient.wallet_id).await?;

        self.engine.lock_accounts(&mut tx, &[held.id, dest_available.id]).await?;

        let lines = vec![
            PendingLine::debit(held.id, amount, hold.currency.clone()),
            PendingLine::credit(dest_available.id, amount, hold.currency.clone()),
        ];

        let outcome = self
            .engine
            .post(
                &mut tx,
                JournalEntryType::Capture,
                req.created_by_api_key.id,
                &req.idempotency_key,
                &lines,
                None,
                None,
            )
            .await?;

        let new_remaining = hold.remaining_amount - amount;
        let new_status = if new_remaining == Decimal::ZERO {
            HoldStatus::Captured
        } else {
            HoldStatus::Active
        };
        self.hold_repo
            .apply_remaining_delta(&mut tx, hold.id, new_remaining, new_status)
            .await?;

        let capture = Capture {
            id: Uuid::new_v4(),
            hold_id: hold.id,
            to_wallet_id: recipient.wallet_id,
            amount,
            currency: hold.currency.clone(),
            journal_entry_id: outcome.entry.id,
            idempotency_key: req.idempotency_key,
            created_by_api_key_id: req.created_by_api_key.id,
            refunded_amount: Decimal::ZERO,
            created_at: Utc::now(),
        };
        let capture = self.capture_repo.create(&mut tx, &capture).await?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(capture)
    }

    pub async fn release(&self, req: ReleaseRequest) -> AppResult<Hold> {
        let mut tx = self.engine.begin().await?;

        let hold = self
            .hold_repo
            .find_by_id_for_update(&mut tx, req.hold_id)
            .await?
            .ok_or_else(|| AppError::domain(ErrorCode::HoldNotFound, "hold not found"))?;

        if hold.wallet_id != req.created_by_api_key.wallet_id {
            return Err(AppError::domain(ErrorCode::HoldNotReleasable, "hold does not belong to caller's wallet"));
        }

        if !hold.can_release() {
            return Err(AppError::domain(ErrorCode::HoldNotReleasable, "hold is not active"));
        }

        let amount = req.amount.unwrap_or(hold.remaining_amount);
        if amount <= Decimal::ZERO {
            return Err(AppError::domain(ErrorCode::InvalidAmount, "amount must be positive"));
        }
        if amount > hold.remaining_amount {
            return Err(AppError::domain(ErrorCode::AmountExceedsHold, "amount exceeds hold's remaining balance"));
        }

        let available = self.wallet_service.available_account(hold.wallet_id).await?;
        let held = self.wallet_service.held_account(hold.wallet_id).await?;

        self.engine.lock_accounts(&mut tx, &[available.id, held.id]).await?;

        let lines = vec![
            PendingLine::debit(held.id, amount, hold.currency.clone()),
            PendingLine::credit(available.id, amount, hold.currency.clone()),
        ];

        self.engine
            .post(
                &mut tx,
                JournalEntryType::Release,
                req.created_by_api_key.id,
                &req.idempotency_key,
                &lines,
                None,
                None,
            )
            .await?;

        let new_remaining = hold.remaining_amount - amount;
        let new_status = if new_remaining == Decimal::ZERO {
            HoldStatus::Released
        } else {
            HoldStatus::Active
        };
        let hold = self
            .hold_repo
            .apply_remaining_delta(&mut tx, hold.id, new_remaining, new_status)
            .await?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(hold)
    }
}
