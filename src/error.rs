use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("authentication required")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("template error: {0}")]
    Template(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Template(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the end user. Server-side failures are never detailed.
    pub fn public_message(&self) -> String {
        match self {
            Self::Unauthorized => "Authentication required".to_string(),
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::Validation(msg) => msg.clone(),
            Self::Database(_) | Self::Template(_) | Self::Internal(_) => {
                "Unable to load data. Please try again.".to_string()
            }
        }
    }
}

impl From<handlebars::RenderError> for AppError {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Template(err.to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("request failed: {self}");
        }
        (
            status,
            Json(json!({ "success": false, "error": self.public_message() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::Unauthorized, StatusCode::UNAUTHORIZED)]
    #[case(AppError::NotFound("page".into()), StatusCode::NOT_FOUND)]
    #[case(AppError::Validation("bad".into()), StatusCode::BAD_REQUEST)]
    #[case(AppError::Database(sqlx::Error::RowNotFound), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(AppError::Template("x".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn maps_to_status(#[case] err: AppError, #[case] expected: StatusCode) {
        assert_eq!(err.status_code(), expected);
    }

    #[test]
    fn data_access_failures_are_not_detailed() {
        let err = AppError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.public_message(), "Unable to load data. Please try again.");
        assert!(err.to_string().contains("pool timed out"));
    }
}
