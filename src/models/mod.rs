pub mod api_key;
pub mod capture;
pub mod external_identity;
pub mod hold;
pub mod journal;
pub mod ledger_account;
pub mod payment_intent;
pub mod refund;
pub mod wallet;

pub use api_key::{ApiKey, ApiKeyLimits, ApiKeyStatus};
pub use capture::Capture;
pub use external_identity::ExternalIdentity;
pub use hold::{Hold, HoldStatus};
pub use journal::{
    JournalEntry, JournalEntryStatus, JournalEntryType, JournalLine, JournalLineDirection,
    PendingLine,
};
pub use ledger_account::{LedgerAccount, LedgerAccountKind};
pub use payment_intent::{PaymentIntent, PaymentIntentStatus};
pub use refund::Refund;
pub use wallet::{normalize_handle, Wallet, WalletStatus, WalletType};
