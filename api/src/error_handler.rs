use axum::http::StatusCode;
use thiserror::Error;

use crate::core::app_state::ConfigError;

/// Public application error type.
///
/// Handlers render it through [`ApiResponse::from_app_error`](crate::core::http::response_envelope::ApiResponse::from_app_error).
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] ConfigError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    /// Decoration pass failed; status & code depend on the failure class.
    #[error("{message}")]
    Decoration {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    pub(crate) fn status_code(&self) -> StatusCode {
        match self {
            AppError::Decoration { status, .. } => *status,
            // startup-only
            AppError::Config(_) | AppError::Bind(_) | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub(crate) fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::Decoration { code, .. } => code,
        }
    }
}

/// Remote failures are the GitLab side's fault (502); a report missing
/// scanner properties or the coverage condition is the caller's (422).
impl From<mr_decorator::Error> for AppError {
    fn from(err: mr_decorator::Error) -> Self {
        match err {
            mr_decorator::Error::Config(e) => AppError::Decoration {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                code: "INVALID_ANALYSIS",
                message: e.to_string(),
            },
            mr_decorator::Error::Remote(e) => AppError::Decoration {
                status: StatusCode::BAD_GATEWAY,
                code: "DECORATION_FAILED",
                message: format!("could not decorate merge request on GitLab: {e}"),
            },
        }
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;
