use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::{normalize_handle, WalletStatus};
use crate::repositories::{ExternalIdentityRepository, WalletRepository};
use serde::Deserialize;
use uuid::Uuid;

/// How a recipient was identified in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientKind {
    WalletId,
    Handle,
    ExternalId,
}

/// The caller-supplied identifier for a transfer/capture/payment recipient.
#[derive(Debug, Clone)]
pub struct RecipientIdentifier {
    pub kind: RecipientKind,
    pub value: String,
    pub provider: Option<String>,
}

/// A resolved, reachable wallet.
#[derive(Debug, Clone)]
pub struct ResolvedRecipient {
    pub wallet_id: Uuid,
    pub handle: Option<String>,
    pub currency: String,
}

pub struct RecipientResolver {
    wallet_repo: WalletRepository,
    external_identity_repo: ExternalIdentityRepository,
}

impl RecipientResolver {
    pub fn new(wallet_repo: WalletRepository, external_identity_repo: ExternalIdentityRepository) -> Self {
        Self {
            wallet_repo,
            external_identity_repo,
        }
    }

    pub async fn resolve(&self, identifier: &RecipientIdentifier) -> AppResult<ResolvedRecipient> {
        let wallet = match identifier.kind {
            RecipientKind::WalletId => {
                let id = Uuid::parse_str(&identifier.value)
                    .map_err(|_| AppError::domain(ErrorCode::Validation, "invalid wallet id"))?;
                self.wallet_repo.find_by_id(id).await?
            }
            RecipientKind::Handle => {
                let handle = normalize_handle(&identifier.value);
                self.wallet_repo.find_by_handle(&handle).await?
            }
            RecipientKind::ExternalId => {
                let provider = identifier.provider.as_deref().ok_or_else(|| {
                    AppError::domain(ErrorCode::Validation, "external_id recipients require a provider")
                })?;
                let identity = self
                    .external_identity_repo
                    .find_by_provider_and_external_id(provider, &identifier.value)
                    .await?;
                match identity {
                    Some(identity) => self.wallet_repo.find_by_id(identity.wallet_id).await?,
                    None => None,
                }
            }
        };

        let wallet = wallet.ok_or_else(|| AppError::domain(ErrorCode::RecipientNotFound, "recipient not found"))?;

        match wallet.status {
            WalletStatus::Frozen => {
                return Err(AppError::domain(ErrorCode::WalletFrozen, "recipient wallet is frozen"))
            }
            WalletStatus::Closed => {
                return Err(AppError::domain(ErrorCode::WalletClosed, "recipient wallet is closed"))
            }
            WalletStatus::Active => {}
        }

        Ok(ResolvedRecipient {
            wallet_id: wallet.id,
            handle: wallet.handle,
            currency: wallet.currency,
        })
    }
}
