use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dailish_core::protocol::ErrorResponse;
use dailish_core::TaskError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("{0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{0}")]
    ApiError(#[from] ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("Status=400, BadRequest: {0}")]
    BadRequest(String),

    #[error("Status=404, NotFound: {0}")]
    NotFound(String),

    #[error("Status=409, Conflict: {0}")]
    Conflict(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound("Document not found".into())
    }

    pub fn conflict() -> Self {
        Self::Conflict("Document already exists".into())
    }
}

impl From<TaskError> for ServerError {
    fn from(err: TaskError) -> Self {
        ApiError::bad_request(err.to_string()).into()
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServerError::ApiError(e) => {
                tracing::warn!("{}", e);
                match e {
                    ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
                    ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
                    ApiError::Conflict(message) => (StatusCode::CONFLICT, message),
                }
            }
            other => {
                tracing::error!("{}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Unexpected Error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}
