//! HTTP-facing error type.
//!
//! Handlers return `Result<_, AppError>`. Client errors carry their message
//! through as a plain-text body; internal and upstream failures are logged in
//! full and answered with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not logged in")]
    Unauthorized,

    #[error("username already taken")]
    UsernameTaken,

    #[error("invalid or expired reset token")]
    InvalidResetToken,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("too many concurrent questions")]
    Busy,

    /// The embedding, vector index, completion, or mail service failed.
    #[error("upstream service error: {0:#}")]
    Upstream(anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::UsernameTaken => (StatusCode::CONFLICT, "Username already taken!".to_string()),
            AppError::InvalidResetToken => (
                StatusCode::BAD_REQUEST,
                "Reset link is invalid or has expired.".to_string(),
            ),
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            AppError::Busy => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Too many questions in flight, try again shortly.".to_string(),
            ),
            AppError::Upstream(e) => {
                tracing::error!(error = %format!("{e:#}"), "upstream service error");
                (
                    StatusCode::BAD_GATEWAY,
                    "The assistant is unavailable right now. Please try again later.".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
            AppError::Template(e) => {
                tracing::error!(error = %e, "template render error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
            AppError::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(err: AppError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_client_errors_keep_static_messages() {
        assert_eq!(
            render(AppError::Unauthorized).await,
            (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
        );
        assert_eq!(
            render(AppError::UsernameTaken).await,
            (StatusCode::CONFLICT, "Username already taken!".to_string())
        );
        assert_eq!(
            render(AppError::InvalidResetToken).await,
            (
                StatusCode::BAD_REQUEST,
                "Reset link is invalid or has expired.".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_upstream_detail_is_not_leaked() {
        let err = AppError::Upstream(anyhow::anyhow!("api key sk-secret rejected"));
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!body.contains("sk-secret"));
    }

    #[tokio::test]
    async fn test_internal_detail_is_not_leaked() {
        let err = AppError::Internal(anyhow::anyhow!("/var/lib/medibot/users.db locked"));
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "internal server error");
    }
}
