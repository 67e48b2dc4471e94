//! Recent-activity feed: disbursement requests and outgoing payments merged
//! into one list, newest first.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::AppResult;

/// Upper bound on feed length, whatever the caller asks for.
pub const MAX_ACTIVITY_ITEMS: usize = 5;

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct ActivityItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: Uuid,
    pub label: String,
    pub date: NaiveDate,
    pub amount: BigDecimal,
    pub status: String,
}

/// Clamps a requested feed length into `1..=MAX_ACTIVITY_ITEMS`.
pub fn feed_limit(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(MAX_ACTIVITY_ITEMS)
        .clamp(1, MAX_ACTIVITY_ITEMS)
}

/// Sorts by date descending and keeps the first `limit` items.
///
/// The sort is stable, so items sharing a date stay in the order they were
/// given: every disbursement ahead of every payment.
pub fn merge_recent(
    disbursements: Vec<ActivityItem>,
    payments: Vec<ActivityItem>,
    limit: usize,
) -> Vec<ActivityItem> {
    let mut items = disbursements;
    items.extend(payments);
    items.sort_by(|a, b| b.date.cmp(&a.date));
    items.truncate(limit.min(MAX_ACTIVITY_ITEMS));
    items
}

pub async fn recent_activity(p: &Pool<Postgres>, limit: usize) -> AppResult<Vec<ActivityItem>> {
    let limit = limit.min(MAX_ACTIVITY_ITEMS);

    let disbursements: Vec<ActivityItem> = sqlx::query_as(
        r#"
        SELECT
            'Disbursement' AS kind,
            id,
            description AS label,
            date_requested AS date,
            amount,
            status
        FROM
            disbursement_requests
        ORDER BY
            date_requested DESC
        LIMIT $1
        "#,
    )
    .bind(limit as i64)
    .fetch_all(p)
    .await?;

    let payments: Vec<ActivityItem> = sqlx::query_as(
        r#"
        SELECT
            'Payment' AS kind,
            id,
            'Payment sent' AS label,
            payment_date AS date,
            amount,
            status
        FROM
            payments
        WHERE
            payment_type = 'Send'
        ORDER BY
            payment_date DESC
        LIMIT $1
        "#,
    )
    .bind(limit as i64)
    .fetch_all(p)
    .await?;

    Ok(merge_recent(disbursements, payments, limit))
}
