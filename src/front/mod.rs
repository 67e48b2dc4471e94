pub mod api;
pub mod auth;
pub mod components;
pub mod pages;
pub mod template;

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Postgres};
use tower_http::services::ServeDir;

use crate::{
    activity::{self, ActivityItem},
    config::{AppConfig, WebConfig},
    error::AppResult,
    models::{self, Notification},
    notifications,
    session::SessionStore,
    stats::{self, DashboardStats},
    users::UserDirectory,
};
use auth::{SessionUser, LOGIN_PATH};

#[derive(Clone)]
pub struct AppState {
    p: Pool<Postgres>,
    t: template::Template,
    users: Arc<dyn UserDirectory>,
    sessions: SessionStore,
    session_cookie: String,
}

const REQUIRED_TEMPLATES: &[&str] = &[
    "index.hbs",
    "login.hbs",
    "base.notification.hbs",
    "page.table.hbs",
    "page.disbursement_form.hbs",
    "page.aging.hbs",
    "page.placeholder.hbs",
];

impl AppState {
    pub fn new(p: Pool<Postgres>, web: &WebConfig) -> anyhow::Result<Self> {
        let t = template::Template::new(&web.templates_dir)?;
        if let Some(missing) = REQUIRED_TEMPLATES.iter().find(|n| !t.has_template(n)) {
            anyhow::bail!("template {missing} not found in {}", web.templates_dir);
        }

        let ttl = TimeDelta::try_minutes(web.session_ttl_minutes)
            .filter(|ttl| *ttl > TimeDelta::zero())
            .ok_or_else(|| anyhow::anyhow!("invalid session ttl: {}", web.session_ttl_minutes))?;

        Ok(Self {
            users: Arc::new(p.clone()),
            p,
            t,
            sessions: SessionStore::new(ttl),
            session_cookie: web.session_cookie.clone(),
        })
    }

    #[cfg(test)]
    fn with_users(mut self, users: impl UserDirectory + 'static) -> Self {
        self.users = Arc::new(users);
        self
    }
}

pub fn new_router(state: AppState, public_dir: &str) -> Router {
    Router::new()
        .route("/", get(index))
        .route(LOGIN_PATH, get(login_form).post(login))
        .nest("/pages", pages::new_router())
        .nest("/api", api::new_router())
        .nest_service("/public", ServeDir::new(public_dir))
        .with_state(state)
}

pub async fn start_web_server(p: Pool<Postgres>, cfg: &AppConfig) -> anyhow::Result<()> {
    log::info!("loading templates from {}", cfg.web.templates_dir);
    let state = AppState::new(p, &cfg.web)?;
    let app = new_router(state, &cfg.web.public_dir);

    let addr = cfg.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("open website at http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Deserialize)]
struct DashboardQuery {
    logout: Option<String>,
}

async fn index(
    State(s): State<AppState>,
    user: SessionUser,
    jar: CookieJar,
    Query(q): Query<DashboardQuery>,
) -> AppResult<Response> {
    if q.logout.as_deref() == Some("true") {
        let jar = auth::end_session(&s, &user, jar);
        return Ok((jar, Redirect::to(LOGIN_PATH)).into_response());
    }

    let mut load_failed = false;
    let today = chrono::Local::now().date_naive();

    let dashboard_stats = stats::dashboard_stats(&s.p, today)
        .await
        .unwrap_or_else(|err| {
            log::error!("cannot load dashboard stats: {err}");
            load_failed = true;
            DashboardStats::default()
        });

    let recent = activity::recent_activity(&s.p, activity::MAX_ACTIVITY_ITEMS)
        .await
        .unwrap_or_else(|err| {
            log::error!("cannot load recent activity: {err}");
            load_failed = true;
            Vec::new()
        });

    let notes = notifications::for_user(&s.p, user.user.id)
        .await
        .unwrap_or_else(|err| {
            log::error!("cannot load notifications: {err}");
            load_failed = true;
            Vec::new()
        });

    #[derive(Serialize)]
    struct Ctx {
        user: models::User,
        stats: DashboardStats,
        recent: Vec<ActivityItem>,
        notifications: Vec<Notification>,
        stats_json: String,
        recent_json: String,
        notifications_json: String,
        sidebar: Vec<pages::SidebarSection>,
        load_failed: bool,
    }

    let ctx = Ctx {
        stats_json: template::embed_json(&dashboard_stats)?,
        recent_json: template::embed_json(&recent)?,
        notifications_json: template::embed_json(&notes)?,
        user: user.user,
        stats: dashboard_stats,
        recent,
        notifications: notes,
        sidebar: pages::sidebar(),
        load_failed,
    };

    s.t.render("index.hbs", &ctx)
}

#[derive(Deserialize, Default)]
struct LoginQuery {
    failed: Option<String>,
}

async fn login_form(State(s): State<AppState>, Query(q): Query<LoginQuery>) -> AppResult<Response> {
    #[derive(Serialize)]
    struct Ctx {
        failed: bool,
    }

    s.t.render(
        "login.hbs",
        &Ctx {
            failed: q.failed.is_some(),
        },
    )
}

#[derive(Deserialize)]
struct LoginForm {
    email: String,
}

/// Development sign-in: the e-mail address alone selects the user. Credential
/// checks are out of scope for this service.
async fn login(
    State(s): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let Some(user) = s.users.by_email(form.email.trim()).await? else {
        return Ok(Redirect::to("/login?failed=1").into_response());
    };

    let token = s.sessions.create(user.id);
    log::info!(
        "user {} signed in ({} active sessions)",
        user.id,
        s.sessions.len()
    );
    let jar = jar.add(auth::session_cookie(&s.session_cookie, token));
    Ok((jar, Redirect::to("/")).into_response())
}
