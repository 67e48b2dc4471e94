use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{error::AppResult, models::User};

/// User lookups behind the session gate and sign-in.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn by_email(&self, email: &str) -> AppResult<Option<User>>;
}

#[async_trait]
impl UserDirectory for Pool<Postgres> {
    async fn by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, name, email, role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self)
            .await?;
        Ok(user)
    }

    async fn by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user =
            sqlx::query_as::<_, User>("SELECT id, name, email, role FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(self)
                .await?;
        Ok(user)
    }
}
