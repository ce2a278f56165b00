mod common;

use agent_wallet_service::error::ErrorCode;
use agent_wallet_service::models::{PaymentIntentStatus, WalletType};
use agent_wallet_service::repositories::PaymentIntentRepository;
use agent_wallet_service::services::{
    CreateIntentRequest, LedgerEngine, PayIntentRequest, PaymentIntentService, WalletService,
};
use rust_decimal_macros::dec;

fn intent_service(pool: &sqlx::PgPool) -> PaymentIntentService {
    PaymentIntentService::new(
        LedgerEngine::new(pool.clone()),
        WalletService::new(pool.clone()),
        PaymentIntentRepository::new(pool.clone()),
    )
}

#[tokio::test]
async fn test_create_and_pay_intent() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let merchant = common::create_wallet(&pool, WalletType::Business, "USD").await;
    let payer = common::create_wallet(&pool, WalletType::Customer, "USD").await;
    common::fund_wallet(&pool, payer.id, "USD", dec!(200.00)).await;
    let key = common::create_api_key(&pool, payer.id, vec!["payment_intent:pay"]).await;

    let service = intent_service(&pool);
    let intent = service
        .create(CreateIntentRequest {
            merchant_wallet_id: merchant.id,
            amount: dec!(50.00),
            currency: "USD".to_string(),
            expires_in_seconds: 3600,
            metadata: None,
        })
        .await
        .expect("create failed");
    assert_eq!(intent.status, PaymentIntentStatus::RequiresPayment);

    let paid = service
        .pay(PayIntentRequest {
            intent_id: intent.id,
            payer_wallet_id: payer.id,
            idempotency_key: "pay-1".to_string(),
            created_by_api_key: key,
        })
        .await
        .expect("pay failed");
    assert_eq!(paid.status, PaymentIntentStatus::Paid);
    assert_eq!(paid.payer_wallet_id, Some(payer.id));

    let wallet_service = WalletService::new(pool.clone());
    let (merchant_available, _) = wallet_service.balances(merchant.id).await.unwrap();
    let (payer_available, _) = wallet_service.balances(payer.id).await.unwrap();
    assert_eq!(merchant_available, dec!(50.00));
    assert_eq!(payer_available, dec!(150.00));

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn test_paying_an_already_paid_intent_fails() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let merchant = common::create_wallet(&pool, WalletType::Business, "USD").await;
    let payer = common::create_wallet(&pool, WalletType::Customer, "USD").await;
    let other_payer = common::create_wallet(&pool, WalletType::Customer, "USD").await;
    common::fund_wallet(&pool, payer.id, "USD", dec!(200.00)).await;
    common::fund_wallet(&pool, other_payer.id, "USD", dec!(200.00)).await;
    let key = common::create_api_key(&pool, payer.id, vec!["payment_intent:pay"]).await;
    let other_key = common::create_api_key(&pool, other_payer.id, vec!["payment_intent:pay"]).await;

    let service = intent_service(&pool);
    let intent = service
        .create(CreateIntentRequest {
            merchant_wallet_id: merchant.id,
            amount: dec!(50.00),
            currency: "USD".to_string(),
            expires_in_seconds: 3600,
            metadata: None,
        })
        .await
        .expect("create failed");

    service
        .pay(PayIntentRequest {
            intent_id: intent.id,
            payer_wallet_id: payer.id,
            idempotency_key: "pay-a".to_string(),
            created_by_api_key: key,
        })
        .await
        .expect("first pay failed");

    let err = service
        .pay(PayIntentRequest {
            intent_id: intent.id,
            payer_wallet_id: other_payer.id,
            idempotency_key: "pay-b".to_string(),
            created_by_api_key: other_key,
        })
        .await
        .expect_err("expected second pay to fail");
    assert_eq!(err.code(), ErrorCode::PaymentIntentNotPayable);

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn test_expired_intent_rejected_on_pay() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let merchant = common::create_wallet(&pool, WalletType::Business, "USD").await;
    let payer = common::create_wallet(&pool, WalletType::Customer, "USD").await;
    common::fund_wallet(&pool, payer.id, "USD", dec!(200.00)).await;
    let key = common::create_api_key(&pool, payer.id, vec!["payment_intent:pay"]).await;

    let service = intent_service(&pool);
    let intent = service
        .create(CreateIntentRequest {
            merchant_wallet_id: merchant.id,
            amount: dec!(50.00),
            currency: "USD".to_string(),
            expires_in_seconds: 60,
            metadata: None,
        })
        .await
        .expect("create failed");

    sqlx::query("UPDATE payment_intents SET expires_at = NOW() - INTERVAL '1 hour' WHERE id = $1")
        .bind(intent.id)
        .execute(&pool)
        .await
        .expect("failed to backdate intent");

    let err = service
        .pay(PayIntentRequest {
            intent_id: intent.id,
            payer_wallet_id: payer.id,
            idempotency_key: "pay-expired".to_string(),
            created_by_api_key: key,
        })
        .await
        .expect_err("expected expiry rejection");
    assert_eq!(err.code(), ErrorCode::PaymentIntentExpired);

    let reloaded = service.find_by_id(intent.id).await.expect("find_by_id failed");
    assert_eq!(reloaded.status, PaymentIntentStatus::Expired);

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn test_self_payment_rejected() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let merchant = common::create_wallet(&pool, WalletType::Business, "USD").await;
    common::fund_wallet(&pool, merchant.id, "USD", dec!(200.00)).await;
    let key = common::create_api_key(&pool, merchant.id, vec!["payment_intent:pay"]).await;

    let service = intent_service(&pool);
    let intent = service
        .create(CreateIntentRequest {
            merchant_wallet_id: merchant.id,
            amount: dec!(50.00),
            currency: "USD".to_string(),
            expires_in_seconds: 3600,
            metadata: None,
        })
        .await
        .expect("create failed");

    let err = service
        .pay(PayIntentRequest {
            intent_id: intent.id,
            payer_wallet_id: merchant.id,
            idempotency_key: "pay-self".to_string(),
            created_by_api_key: key,
        })
        .await
        .expect_err("expected self-payment rejection");
    assert_eq!(err.code(), ErrorCode::SelfPayment);

    common::cleanup_test_data(&pool).await;
}
