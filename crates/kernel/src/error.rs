//! Application error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application errors returned by kernel routes.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to render response")]
    Render(#[from] std::fmt::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Render(e) => {
                tracing::error!(error = %e, "render error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

/// Configuration errors raised while building the gate at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("AUTH_SECRET must be at least {min} bytes (got {actual})")]
    AuthSecretTooShort { min: usize, actual: usize },

    #[error("at least one locale must be configured")]
    NoLocales,

    #[error("default locale {0:?} is not one of the configured locales")]
    UnknownDefaultLocale(String),

    #[error("invalid matcher pattern")]
    Matcher(#[from] regex::Error),
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn render_error_is_opaque_500() {
        let response = AppError::Render(std::fmt::Error).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn config_error_messages_name_the_problem() {
        let err = ConfigError::AuthSecretTooShort { min: 32, actual: 4 };
        assert_eq!(err.to_string(), "AUTH_SECRET must be at least 32 bytes (got 4)");

        let err = ConfigError::UnknownDefaultLocale("fr".to_string());
        assert!(err.to_string().contains("\"fr\""));
    }
}
