use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::ApiKey;
use crate::repositories::ApiKeyRepository;
use crate::services::limits::check_scope;
use crate::services::RateLimiter;

/// Authenticates the bearer credential on `headers` against `api_key_repo`,
/// requires it to be active and carry `required_scope`, and spends one
/// token from its rate-limit bucket. `last_used_at` is only touched once
/// a key has cleared every other check.
pub async fn authenticate(
    headers: &HeaderMap,
    api_key_repo: &ApiKeyRepository,
    rate_limiter: &RateLimiter,
    required_scope: &str,
) -> AppResult<ApiKey> {
    let presented = bearer_token(headers)?;
    let key_hash = hex::encode(Sha256::digest(presented.as_bytes()));

    let key = api_key_repo
        .find_by_key_hash(&key_hash)
        .await?
        .ok_or_else(|| AppError::domain(ErrorCode::Unauthorized, "unknown api key"))?;

    if !key.is_active() {
        return Err(AppError::domain(ErrorCode::Unauthorized, "api key has been revoked"));
    }

    check_scope(&key, required_scope)?;
    rate_limiter.check(key.id)?;
    api_key_repo.touch_last_used(key.id).await?;

    Ok(key)
}

fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::domain(ErrorCode::Unauthorized, "missing or malformed bearer token"))
}
