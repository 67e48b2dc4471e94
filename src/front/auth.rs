//! Session gate. Pages redirect anonymous visitors to the sign-in entry
//! point; JSON routes answer 401.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use super::{pages::AppMessage, AppState};
use crate::{
    error::{AppError, AppResult},
    models::User,
};

pub const LOGIN_PATH: &str = "/login";

/// Signed-in visitor. Only produced for a live session whose user row still
/// exists.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub token: String,
    pub user: User,
}

async fn resolve_session(parts: &Parts, s: &AppState) -> AppResult<Option<SessionUser>> {
    let jar = CookieJar::from_headers(&parts.headers);
    let Some(token) = jar.get(&s.session_cookie).map(|c| c.value().to_string()) else {
        return Ok(None);
    };
    let Some(session) = s.sessions.get(&token) else {
        return Ok(None);
    };

    match s.users.by_id(session.user_id).await? {
        Some(user) => Ok(Some(SessionUser { token, user })),
        None => {
            log::warn!("session for missing user {} dropped", session.user_id);
            s.sessions.destroy(&token);
            Ok(None)
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, s: &AppState) -> Result<Self, Self::Rejection> {
        match resolve_session(parts, s).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(Redirect::to(LOGIN_PATH).into_response()),
            Err(err) => Err(AppMessage::new_error(err, s).into_response()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiUser(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for ApiUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, s: &AppState) -> Result<Self, Self::Rejection> {
        resolve_session(parts, s)
            .await?
            .map(ApiUser)
            .ok_or(AppError::Unauthorized)
    }
}

pub fn session_cookie(name: &str, token: String) -> Cookie<'static> {
    Cookie::build((name.to_string(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Destroys the server-side session and expires the cookie.
pub fn end_session(s: &AppState, user: &SessionUser, jar: CookieJar) -> CookieJar {
    if s.sessions.destroy(&user.token) {
        log::info!("user {} signed out", user.user.id);
    }
    jar.remove(Cookie::build((s.session_cookie.clone(), "")).path("/"))
}
