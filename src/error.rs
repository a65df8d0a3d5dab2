use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::repository::RepositoryError;

/// Service-level error taxonomy. Managers raise these; the HTTP boundary
/// maps each variant to a status code and a stable `{"error": ...}` body.
#[derive(thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("authentication required")]
    Unauthorized,
    // The message of the wrapped error is logged, never sent to the caller.
    #[error("internal server error")]
    Internal(#[source] RepositoryError),
}

impl std::fmt::Debug for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            write!(f, "\n\tCaused by: {}", cause)?;
            source = cause.source();
        }
        Ok(())
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ApiError::NotFound(String::from("not found")),
            RepositoryError::UniqueViolation(_) => {
                ApiError::Conflict(String::from("conflict with an existing record"))
            }
            other => ApiError::Internal(other),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal(_) = self {
            tracing::error!(error = ?self, "request failed with an internal error");
        }

        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": self.to_string() }))
    }
}
