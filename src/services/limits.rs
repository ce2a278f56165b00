use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::ApiKey;
use rust_decimal::Decimal;
use serde_json::json;

/// Checks a key's per-transaction cap against a principal amount (capture
/// amount, hold amount, transfer amount - never a fee or derived figure).
pub fn check_per_tx_max(key: &ApiKey, amount: Decimal) -> AppResult<()> {
    if let Some(limits) = key.limits() {
        if let Some(max) = limits.per_tx_max {
            if amount > max {
                return Err(AppError::domain_with_details(
                    ErrorCode::LimitExceeded,
                    "amount exceeds the key's per-transaction limit",
                    json!({ "limit": max.to_string(), "amount": amount.to_string() }),
                ));
            }
        }
    }
    Ok(())
}

/// Checks a key's daily cap against the amount already spent today plus the
/// amount about to post. `spent_today` must be computed inside the same
/// transaction and after the lock that the posting will use.
pub fn check_daily_max(key: &ApiKey, spent_today: Decimal, amount: Decimal) -> AppResult<()> {
    if let Some(limits) = key.limits() {
        if let Some(max) = limits.daily_max {
            if spent_today + amount > max {
                return Err(AppError::domain_with_details(
                    ErrorCode::LimitExceeded,
                    "amount would exceed the key's daily limit",
                    json!({
                        "limit": max.to_string(),
                        "spent_today": spent_today.to_string(),
                        "amount": amount.to_string(),
                    }),
                ));
            }
        }
    }
    Ok(())
}

/// Checks the resolved counterparty against the key's allowlist, if any.
/// Matched against wallet id first, falling back to handle when present.
pub fn check_counterparty_allowed(
    key: &ApiKey,
    counterparty_wallet_id: &str,
    counterparty_handle: Option<&str>,
) -> AppResult<()> {
    if let Some(limits) = key.limits() {
        if let Some(allowlist) = &limits.allowed_counterparties {
            let allowed = allowlist.iter().any(|entry| {
                entry == counterparty_wallet_id || counterparty_handle == Some(entry.as_str())
            });
            if !allowed {
                return Err(AppError::domain(
                    ErrorCode::CounterpartyNotAllowed,
                    "counterparty is not on the key's allowlist",
                ));
            }
        }
    }
    Ok(())
}

/// Enforces that a key carries the exact scope string required by an
/// endpoint, or a wildcard entry covering it.
pub fn check_scope(key: &ApiKey, required_scope: &str) -> AppResult<()> {
    if !key.has_scope(required_scope) {
        return Err(AppError::domain(
            ErrorCode::ForbiddenScope,
            format!("missing required scope '{}'", required_scope),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApiKeyLimits, ApiKeyStatus};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn key_with_limits(limits: ApiKeyLimits) -> ApiKey {
        ApiKey {
            id: Uuid::new_v4(),
            key_hash: "h".to_string(),
            wallet_id: Uuid::new_v4(),
            scopes: sqlx::types::Json(vec!["transfer:create".to_string()]),
            limits: sqlx::types::Json(Some(limits)),
            status: ApiKeyStatus::Active,
            last_used_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_per_tx_max_exceeded() {
        let key = key_with_limits(ApiKeyLimits {
            per_tx_max: Some(dec!(500.00)),
            daily_max: None,
            allowed_counterparties: None,
        });
        let err = check_per_tx_max(&key, dec!(600.00)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::LimitExceeded);
    }

    #[test]
    fn test_per_tx_max_within_bounds() {
        let key = key_with_limits(ApiKeyLimits {
            per_tx_max: Some(dec!(500.00)),
            daily_max: None,
            allowed_counterparties: None,
        });
        assert!(check_per_tx_max(&key, dec!(500.00)).is_ok());
    }

    #[test]
    fn test_daily_max_exceeded() {
        let key = key_with_limits(ApiKeyLimits {
            per_tx_max: None,
            daily_max: Some(dec!(1000.00)),
            allowed_counterparties: None,
        });
        let err = check_daily_max(&key, dec!(900.00), dec!(200.00)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::LimitExceeded);
    }

    #[test]
    fn test_counterparty_not_allowed() {
        let key = key_with_limits(ApiKeyLimits {
            per_tx_max: None,
            daily_max: None,
            allowed_counterparties: Some(vec!["@alice".to_string()]),
        });
        let err = check_counterparty_allowed(&key, "some-wallet-id", Some("@bob")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CounterpartyNotAllowed);
    }

    #[test]
    fn test_counterparty_allowed_by_handle() {
        let key = key_with_limits(ApiKeyLimits {
            per_tx_max: None,
            daily_max: None,
            allowed_counterparties: Some(vec!["@alice".to_string()]),
        });
        assert!(check_counterparty_allowed(&key, "some-wallet-id", Some("@alice")).is_ok());
    }
}
