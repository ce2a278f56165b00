pub mod deposit_service;
pub mod hold_service;
pub mod ledger_engine;
pub mod limits;
pub mod payment_intent_service;
pub mod rate_limiter;
pub mod recipient_resolver;
pub mod refund_service;
pub mod transaction_listing_service;
pub mod transfer_service;
pub mod wallet_service;

pub use deposit_service::{DepositRequest, DepositService};
pub use hold_service::{CaptureRequest, CreateHoldRequest, HoldService, ReleaseRequest};
pub use ledger_engine::{LedgerEngine, PostOutcome};
pub use payment_intent_service::{CreateIntentRequest, PayIntentRequest, PaymentIntentService};
pub use rate_limiter::RateLimiter;
pub use recipient_resolver::{RecipientIdentifier, RecipientKind, RecipientResolver, ResolvedRecipient};
pub use refund_service::{RefundRequest, RefundService};
pub use transaction_listing_service::{
    ListTransactionsRequest, TransactionListItem, TransactionListingService, TransactionPage,
};
pub use transfer_service::{TransferRequest, TransferService};
pub use wallet_service::WalletService;
