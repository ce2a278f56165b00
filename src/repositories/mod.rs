pub mod api_key_repository;
pub mod capture_repository;
pub mod external_identity_repository;
pub mod hold_repository;
pub mod journal_repository;
pub mod ledger_account_repository;
pub mod payment_intent_repository;
pub mod refund_repository;
pub mod wallet_repository;

pub use api_key_repository::ApiKeyRepository;
pub use capture_repository::CaptureRepository;
pub use external_identity_repository::ExternalIdentityRepository;
pub use hold_repository::HoldRepository;
pub use journal_repository::JournalRepository;
pub use ledger_account_repository::LedgerAccountRepository;
pub use payment_intent_repository::PaymentIntentRepository;
pub use refund_repository::RefundRepository;
pub use wallet_repository::WalletRepository;

use sqlx::PgPool;

/// Database connection pool type alias.
pub type DbPool = PgPool;
