use axum::{
    Json,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// AppError
///
/// The single error type flowing out of repositories, services and handlers.
/// Each variant maps to exactly one HTTP status; the JSON body is always an
/// [`ErrorBody`].
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database service is temporarily unavailable")]
    DatabaseUnavailable(#[source] sqlx::Error),

    #[error("An error occurred while processing your request")]
    Database(#[source] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// ErrorBody
///
/// Wire shape of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
    pub error: String,
}

impl AppError {
    pub fn not_found(what: &str, id: i32) -> Self {
        AppError::NotFound(format!("{what} with ID {id} not found"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) | AppError::TokenExpired => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DatabaseUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code sent in the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::TokenExpired => "token_expired",
            AppError::Forbidden(_) => "forbidden",
            AppError::Conflict(_) => "conflict",
            AppError::DatabaseUnavailable(_) => "database_unavailable",
            AppError::Database(_) => "database_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Logs the error at a level matching its status.
    pub fn log(&self) {
        let status = self.status();
        if status.is_server_error() {
            match self {
                AppError::DatabaseUnavailable(e) | AppError::Database(e) => {
                    tracing::error!(status = status.as_u16(), error = ?e, "{}", self)
                }
                _ => tracing::error!(status = status.as_u16(), "{}", self),
            }
        } else {
            tracing::warn!(status = status.as_u16(), "{}", self);
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => AppError::DatabaseUnavailable(err),
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("A record with the same unique value already exists".into())
            }
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                AppError::Validation("Referenced record does not exist".into())
            }
            other => AppError::Database(other),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("background task failed: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.status();
        let body = ErrorBody {
            message: self.to_string(),
            error: self.code().to_string(),
        };

        let mut response = (status, Json(body)).into_response();
        if matches!(self, AppError::TokenExpired) {
            response
                .headers_mut()
                .insert("token-expired", HeaderValue::from_static("true"));
        }
        response
    }
}
