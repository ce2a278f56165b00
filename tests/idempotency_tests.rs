mod common;

use agent_wallet_service::error::ErrorCode;
use agent_wallet_service::models::WalletType;
use agent_wallet_service::repositories::{ExternalIdentityRepository, WalletRepository};
use agent_wallet_service::services::{
    DepositRequest, DepositService, LedgerEngine, RecipientIdentifier, RecipientKind, RecipientResolver,
    TransferRequest, TransferService, WalletService,
};
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_replaying_idempotency_key_returns_identical_outcome() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let alice = common::create_wallet_with_handle(&pool, WalletType::Customer, "USD", "idem-alice").await;
    let bob = common::create_wallet_with_handle(&pool, WalletType::Customer, "USD", "idem-bob").await;
    common::fund_wallet(&pool, alice.id, "USD", dec!(500.00)).await;
    let key = common::create_api_key(&pool, alice.id, vec!["transfer:create"]).await;

    let service = TransferService::new(
        LedgerEngine::new(pool.clone()),
        WalletService::new(pool.clone()),
        RecipientResolver::new(WalletRepository::new(pool.clone()), ExternalIdentityRepository::new(pool.clone())),
    );

    let make_req = || TransferRequest {
        from_wallet_id: alice.id,
        recipient: RecipientIdentifier {
            kind: RecipientKind::Handle,
            value: "@idem-bob".to_string(),
            provider: None,
        },
        amount: dec!(100.00),
        currency: "USD".to_string(),
        idempotency_key: "same-key".to_string(),
        created_by_api_key: key.clone(),
        reference_id: None,
        metadata: None,
    };

    let first = service.transfer(make_req()).await.expect("first transfer failed");
    let second = service.transfer(make_req()).await.expect("second transfer failed");
    assert_eq!(first.entry.id, second.entry.id);
    assert!(!first.replayed);
    assert!(second.replayed);

    let wallet_service = WalletService::new(pool.clone());
    let (alice_available, _) = wallet_service.balances(alice.id).await.unwrap();
    let (bob_available, _) = wallet_service.balances(bob.id).await.unwrap();
    assert_eq!(alice_available, dec!(400.00));
    assert_eq!(bob_available, dec!(100.00));

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn test_same_idempotency_key_different_operation_family_conflicts() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let alice = common::create_wallet_with_handle(&pool, WalletType::Customer, "USD", "idem2-alice").await;
    let bob = common::create_wallet_with_handle(&pool, WalletType::Customer, "USD", "idem2-bob").await;
    common::fund_wallet(&pool, alice.id, "USD", dec!(500.00)).await;
    let key = common::create_api_key(&pool, alice.id, vec!["transfer:create", "deposit:create"]).await;

    let transfers = TransferService::new(
        LedgerEngine::new(pool.clone()),
        WalletService::new(pool.clone()),
        RecipientResolver::new(WalletRepository::new(pool.clone()), ExternalIdentityRepository::new(pool.clone())),
    );

    transfers
        .transfer(TransferRequest {
            from_wallet_id: alice.id,
            recipient: RecipientIdentifier {
                kind: RecipientKind::Handle,
                value: "@idem2-bob".to_string(),
                provider: None,
            },
            amount: dec!(50.00),
            currency: "USD".to_string(),
            idempotency_key: "shared-key".to_string(),
            created_by_api_key: key.clone(),
            reference_id: None,
            metadata: None,
        })
        .await
        .expect("transfer failed");

    let deposits = DepositService::new(
        LedgerEngine::new(pool.clone()),
        WalletService::new(pool.clone()),
        WalletRepository::new(pool.clone()),
    );
    let err = deposits
        .deposit(DepositRequest {
            to_wallet_id: alice.id,
            amount: dec!(50.00),
            currency: "USD".to_string(),
            idempotency_key: "shared-key".to_string(),
            created_by_api_key_id: key.id,
            reference_id: None,
            metadata: None,
        })
        .await
        .expect_err("expected idempotency conflict across operation families");
    assert_eq!(err.code(), ErrorCode::IdempotencyConflict);

    common::cleanup_test_data(&pool).await;
}
