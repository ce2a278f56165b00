use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::{ApiKey, JournalEntryType, PendingLine, Refund};
use crate::repositories::{CaptureRepository, HoldRepository, RefundRepository};
use crate::services::ledger_engine::LedgerEngine;
use crate::services::limits::check_scope;
use crate::services::wallet_service::WalletService;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

pub struct RefundRequest {
    pub capture_id: Uuid,
    pub amount: Option<Decimal>,
    pub idempotency_key: String,
    pub created_by_api_key: ApiKey,
}

/// Reverses all or part of a capture, crediting the hold's wallet back.
/// Bounded by the capture's own refundable amount, never by the current
/// balance of the wallet that originally received it - a drained merchant
/// simply hits insufficient funds, it never overdraws.
pub struct RefundService {
    engine: LedgerEngine,
    wallet_service: WalletService,
    capture_repo: CaptureRepository,
    refund_repo: RefundRepository,
    hold_repo: HoldRepository,
}

impl RefundService {
    pub fn new(
        engine: LedgerEngine,
        wallet_service: WalletService,
        capture_repo: CaptureRepository,
        refund_repo: RefundRepository,
        hold_repo: HoldRepository,
    ) -> Self {
        Self {
            engine,
            wallet_service,
            capture_repo,
            refund_repo,
            hold_repo,
        }
    }

    pub async fn refund(&self, req: RefundRequest) -> AppResult<Refund> {
        check_scope(&req.created_by_api_key, "refund:create")?;

        if let Some(existing) = self
            .refund_repo
            .find_by_idempotency(&req.idempotency_key, req.created_by_api_key.id)
            .await?
        {
            return Ok(existing);
        }

        let mut tx = self.engine.begin().await?;

        let capture = self
            .capture_repo
            .find_by_id_for_update(&mut tx, req.capture_id)
            .await?
            .ok_or_else(|| AppError::domain(ErrorCode::NotFound, "capture not found"))?;

        if capture.to_wallet_id != req.created_by_api_key.wallet_id {
            return Err(AppError::domain(
                ErrorCode::ForbiddenScope,
                "capture does not belong to caller's wallet",
            ));
        }

        let amount = req.amount.unwrap_or_else(|| capture.refundable_amount());
        if amount <= Decimal::ZERO {
            return Err(AppError::domain(ErrorCode::InvalidAmount, "amount must be positive"));
        }
        if amount > capture.refundable_amount() {
            return Err(AppError::domain(
                ErrorCode::AmountExceedsRefundable,
                "amount exceeds the capture's refundable balance",
            ));
        }

        let hold = self
            .hold_repo
            .find_by_id(capture.hold_id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("capture {} references missing hold", capture.id)))?;

        let hold_wallet_available = self.wallet_service.available_account(hold.wallet_id).await?;
        let merchant_available = self.wallet_service.available_account(capture.to_wallet_id).await?;

        self.engine
            .lock_accounts(&mut tx, &[merchant_available.id, hold_wallet_available.id])
            .await?;

        let merchant_balance = self.engine.balance_of(&mut tx, merchant_available.id).await?;
        if merchant_balance < amount {
            return Err(AppError::domain(
                ErrorCode::InsufficientFunds,
                "merchant wallet does not have sufficient available balance to refund",
            ));
        }

        let lines = vec![
            PendingLine::debit(merchant_available.id, amount, capture.currency.clone()),
            PendingLine::credit(hold_wallet_available.id, amount, capture.currency.clone()),
        ];

        let outcome = self
            .engine
            .post(
                &mut tx,
                JournalEntryType::Refund,
                req.created_by_api_key.id,
                &req.idempotency_key,
                &lines,
                None,
                None,
            )
            .await?;

        self.capture_repo.add_refunded_amount(&mut tx, capture.id, amount).await?;

        let refund = Refund {
            id: Uuid::new_v4(),
            capture_id: capture.id,
            amount,
            currency: capture.currency.clone(),
            journal_entry_id: outcome.entry.id,
            idempotency_key: req.idempotency_key,
            created_by_api_key_id: req.created_by_api_key.id,
            created_at: Utc::now(),
        };
        let refund = self.refund_repo.create(&mut tx, &refund).await?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(refund)
    }
}
