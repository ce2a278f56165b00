mod common;

use agent_wallet_service::error::ErrorCode;
use agent_wallet_service::models::WalletType;
use agent_wallet_service::repositories::{ExternalIdentityRepository, WalletRepository};
use agent_wallet_service::services::{
    LedgerEngine, RecipientIdentifier, RecipientKind, RecipientResolver, TransferRequest, TransferService,
    WalletService,
};
use rust_decimal_macros::dec;

fn transfer_service(pool: &sqlx::PgPool) -> TransferService {
    TransferService::new(
        LedgerEngine::new(pool.clone()),
        WalletService::new(pool.clone()),
        RecipientResolver::new(WalletRepository::new(pool.clone()), ExternalIdentityRepository::new(pool.clone())),
    )
}

#[tokio::test]
async fn test_transfer_moves_available_balance() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let alice = common::create_wallet_with_handle(&pool, WalletType::Customer, "USD", "tf-alice").await;
    let bob = common::create_wallet_with_handle(&pool, WalletType::Customer, "USD", "tf-bob").await;
    common::fund_wallet(&pool, alice.id, "USD", dec!(500.00)).await;
    let key = common::create_api_key(&pool, alice.id, vec!["transfer:create"]).await;

    let service = transfer_service(&pool);
    service
        .transfer(TransferRequest {
            from_wallet_id: alice.id,
            recipient: RecipientIdentifier {
                kind: RecipientKind::Handle,
                value: "@tf-bob".to_string(),
                provider: None,
            },
            amount: dec!(200.00),
            currency: "USD".to_string(),
            idempotency_key: "transfer-1".to_string(),
            created_by_api_key: key,
            reference_id: None,
            metadata: None,
        })
        .await
        .expect("transfer failed");

    let wallet_service = WalletService::new(pool.clone());
    let (alice_available, _) = wallet_service.balances(alice.id).await.unwrap();
    let (bob_available, _) = wallet_service.balances(bob.id).await.unwrap();
    assert_eq!(alice_available, dec!(300.00));
    assert_eq!(bob_available, dec!(200.00));

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn test_transfer_insufficient_funds() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let alice = common::create_wallet_with_handle(&pool, WalletType::Customer, "USD", "tf-alice2").await;
    let _bob = common::create_wallet_with_handle(&pool, WalletType::Customer, "USD", "tf-bob2").await;
    common::fund_wallet(&pool, alice.id, "USD", dec!(50.00)).await;
    let key = common::create_api_key(&pool, alice.id, vec!["transfer:create"]).await;

    let service = transfer_service(&pool);
    let err = service
        .transfer(TransferRequest {
            from_wallet_id: alice.id,
            recipient: RecipientIdentifier {
                kind: RecipientKind::Handle,
                value: "@tf-bob2".to_string(),
                provider: None,
            },
            amount: dec!(100.00),
            currency: "USD".to_string(),
            idempotency_key: "transfer-2".to_string(),
            created_by_api_key: key,
            reference_id: None,
            metadata: None,
        })
        .await
        .expect_err("expected insufficient funds");
    assert_eq!(err.code(), ErrorCode::InsufficientFunds);

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn test_transfer_to_self_rejected() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let alice = common::create_wallet_with_handle(&pool, WalletType::Customer, "USD", "tf-alice3").await;
    common::fund_wallet(&pool, alice.id, "USD", dec!(100.00)).await;
    let key = common::create_api_key(&pool, alice.id, vec!["transfer:create"]).await;

    let service = transfer_service(&pool);
    let err = service
        .transfer(TransferRequest {
            from_wallet_id: alice.id,
            recipient: RecipientIdentifier {
                kind: RecipientKind::Handle,
                value: "@tf-alice3".to_string(),
                provider: None,
            },
            amount: dec!(10.00),
            currency: "USD".to_string(),
            idempotency_key: "transfer-3".to_string(),
            created_by_api_key: key,
            reference_id: None,
            metadata: None,
        })
        .await
        .expect_err("expected self-transfer rejection");
    assert_eq!(err.code(), ErrorCode::SelfTransfer);

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn test_transfer_currency_mismatch() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let alice = common::create_wallet_with_handle(&pool, WalletType::Customer, "USD", "tf-alice4").await;
    let _bob = common::create_wallet_with_handle(&pool, WalletType::Customer, "EUR", "tf-bob4").await;
    common::fund_wallet(&pool, alice.id, "USD", dec!(100.00)).await;
    let key = common::create_api_key(&pool, alice.id, vec!["transfer:create"]).await;

    let service = transfer_service(&pool);
    let err = service
        .transfer(TransferRequest {
            from_wallet_id: alice.id,
            recipient: RecipientIdentifier {
                kind: RecipientKind::Handle,
                value: "@tf-bob4".to_string(),
                provider: None,
            },
            amount: dec!(10.00),
            currency: "EUR".to_string(),
            idempotency_key: "transfer-4".to_string(),
            created_by_api_key: key,
            reference_id: None,
            metadata: None,
        })
        .await
        .expect_err("expected currency mismatch");
    assert_eq!(err.code(), ErrorCode::CurrencyMismatch);

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn test_transfer_per_tx_limit_enforced() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let alice = common::create_wallet_with_handle(&pool, WalletType::Customer, "USD", "tf-alice5").await;
    let _bob = common::create_wallet_with_handle(&pool, WalletType::Customer, "USD", "tf-bob5").await;
    common::fund_wallet(&pool, alice.id, "USD", dec!(1000.00)).await;
    let key = common::create_api_key_with_limits(
        &pool,
        alice.id,
        vec!["transfer:create"],
        Some(agent_wallet_service::models::ApiKeyLimits {
            per_tx_max: Some(dec!(50.00)),
            daily_max: None,
            allowed_counterparties: None,
        }),
    )
    .await;

    let service = transfer_service(&pool);
    let err = service
        .transfer(TransferRequest {
            from_wallet_id: alice.id,
            recipient: RecipientIdentifier {
                kind: RecipientKind::Handle,
                value: "@tf-bob5".to_string(),
                provider: None,
            },
            amount: dec!(100.00),
            currency: "USD".to_string(),
            idempotency_key: "transfer-5".to_string(),
            created_by_api_key: key,
            reference_id: None,
            metadata: None,
        })
        .await
        .expect_err("expected limit exceeded");
    assert_eq!(err.code(), ErrorCode::LimitExceeded);

    common::cleanup_test_data(&pool).await;
}
