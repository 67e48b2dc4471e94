use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{error::AppResult, models::Notification};

pub const MAX_NOTIFICATIONS: usize = 5;

#[async_trait]
pub trait NotificationSource {
    /// Up to `limit` notifications addressed to `user_id` or broadcast to
    /// everyone (no owner).
    async fn latest_for(&self, user_id: Uuid, limit: usize) -> AppResult<Vec<Notification>>;
}

/// Latest notifications visible to `user_id`, newest first.
pub async fn for_user<S>(source: &S, user_id: Uuid) -> AppResult<Vec<Notification>>
where
    S: NotificationSource + Sync,
{
    let mut rows = source.latest_for(user_id, MAX_NOTIFICATIONS).await?;
    rows.retain(|n| n.user_id.map_or(true, |owner| owner == user_id));
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rows.truncate(MAX_NOTIFICATIONS);
    Ok(rows)
}

#[async_trait]
impl NotificationSource for Pool<Postgres> {
    async fn latest_for(&self, user_id: Uuid, limit: usize) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, message, created_at
            FROM notifications
            WHERE user_id = $1 OR user_id IS NULL
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(self)
        .await?;

        Ok(rows)
    }
}
