use axum::{
    async_trait,
    extract::{FromRequestParts, Query, State},
    http::request::Parts,
    routing::get,
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{auth::ApiUser, AppState};
use crate::{
    activity::{self, ActivityItem},
    aging::{self, AgingReport},
    error::{AppError, AppResult},
    listing::{self, Listing, StatusQuery},
    models::{self, Notification},
    notifications,
    stats::{self, ChartsData, DashboardStats},
};

pub fn new_router() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_resource::<models::Account>))
        .route(
            "/disbursements",
            get(list_resource::<models::DisbursementRequest>),
        )
        .route("/invoices", get(list_resource::<models::Invoice>))
        .route("/payments", get(list_resource::<models::Payment>))
        .route("/budgets", get(list_resource::<models::Budget>))
        .route("/journal-entries", get(list_resource::<models::JournalEntry>))
        .route("/dashboard-stats", get(dashboard_stats))
        .route("/transactions", get(transactions))
        .route("/charts-data", get(charts_data))
        .route("/notifications", get(user_notifications))
        .route("/aging", get(aging_report))
}

/// [`Query`] whose failures use the JSON error body.
struct ApiQuery<T>(T);

#[async_trait]
impl<T> FromRequestParts<AppState> for ApiQuery<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, s: &AppState) -> Result<Self, Self::Rejection> {
        let Query(q) = Query::<T>::from_request_parts(parts, s).await?;
        Ok(Self(q))
    }
}

#[derive(Serialize)]
pub struct Envelope<T: Serialize> {
    success: bool,
    data: T,
}

impl<T: Serialize> Envelope<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

async fn list_resource<T: Listing>(
    State(s): State<AppState>,
    _user: ApiUser,
    ApiQuery(q): ApiQuery<StatusQuery>,
) -> AppResult<Json<Vec<T>>> {
    let filter = q.to_filter::<T>()?;
    let rows = listing::list::<T>(&s.p, filter.as_ref()).await?;
    log::debug!("listed {} rows", rows.len());
    Ok(Json(rows))
}

#[axum::debug_handler(state = AppState)]
async fn dashboard_stats(
    State(s): State<AppState>,
    _user: ApiUser,
) -> AppResult<Json<Envelope<DashboardStats>>> {
    let today = chrono::Local::now().date_naive();
    Ok(Envelope::ok(stats::dashboard_stats(&s.p, today).await?))
}

#[derive(Deserialize)]
struct TransactionsQuery {
    limit: Option<usize>,
}

#[axum::debug_handler(state = AppState)]
async fn transactions(
    State(s): State<AppState>,
    _user: ApiUser,
    ApiQuery(q): ApiQuery<TransactionsQuery>,
) -> AppResult<Json<Envelope<Vec<ActivityItem>>>> {
    let items = activity::recent_activity(&s.p, activity::feed_limit(q.limit)).await?;
    Ok(Envelope::ok(items))
}

#[axum::debug_handler(state = AppState)]
async fn charts_data(
    State(s): State<AppState>,
    _user: ApiUser,
) -> AppResult<Json<Envelope<ChartsData>>> {
    Ok(Envelope::ok(stats::charts_data(&s.p).await?))
}

#[axum::debug_handler(state = AppState)]
async fn user_notifications(
    State(s): State<AppState>,
    ApiUser(user): ApiUser,
) -> AppResult<Json<Envelope<Vec<Notification>>>> {
    Ok(Envelope::ok(notifications::for_user(&s.p, user.user.id).await?))
}

#[axum::debug_handler(state = AppState)]
async fn aging_report(
    State(s): State<AppState>,
    _user: ApiUser,
) -> AppResult<Json<Envelope<AgingReport>>> {
    let today = chrono::Local::now().date_naive();
    Ok(Envelope::ok(aging::aging_report(&s.p, today).await?))
}
