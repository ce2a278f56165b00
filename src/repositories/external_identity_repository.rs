use crate::error::AppError;
use crate::models::ExternalIdentity;
use sqlx::PgPool;

pub struct ExternalIdentityRepository {
    pool: PgPool,
}

impl ExternalIdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, identity: &ExternalIdentity) -> Result<ExternalIdentity, AppError> {
        sqlx::query_as::<_, ExternalIdentity>(
            r#"
            INSERT INTO external_identities (id, provider, external_user_id, wallet_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, provider, external_user_id, wallet_id, created_at
            "#,
        )
        .bind(identity.id)
        .bind(&identity.provider)
        .bind(&identity.external_user_id)
        .bind(identity.wallet_id)
        .bind(identity.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_provider_and_external_id(
        &self,
        provider: &str,
        external_user_id: &str,
    ) -> Result<Option<ExternalIdentity>, AppError> {
        sqlx::query_as::<_, ExternalIdentity>(
            r#"
            SELECT id, provider, external_user_id, wallet_id, created_at
            FROM external_identities WHERE provider = $1 AND external_user_id = $2
            "#,
        )
        .bind(provider)
        .bind(external_user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }
}
