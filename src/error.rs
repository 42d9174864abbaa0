//! Application error types.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

use crate::backend::BackendError;

/// Errors a request handler can end with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("backend unavailable: {0}")]
    Unavailable(BackendError),

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match &self {
            AppError::Unavailable(e) => tracing::warn!(error = %e, "backend unavailable"),
            AppError::Template(e) => {
                // Tera keeps the useful part in the source chain
                let detail = std::error::Error::source(e)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                tracing::error!(error = %e, detail = %detail, "template error");
            }
            e => tracing::error!(error = %e, "request failed"),
        }

        let body = match status {
            StatusCode::SERVICE_UNAVAILABLE => {
                "<h1>503</h1><p>Service temporarily unavailable. Please try again shortly.</p>"
            }
            _ => "<h1>500</h1><p>Internal server error</p>",
        };
        (status, Html(body)).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Unavailable(BackendError::from_response(503, ""))
                .into_response()
                .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Backend(BackendError::NotConfigured)
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
