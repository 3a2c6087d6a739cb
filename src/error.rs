use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Main error type for the studio service
#[derive(Error, Debug)]
pub enum StudioError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Audio object not found: {0}")]
    ObjectNotFound(String),

    #[error("Payload too large: {size} bytes (limit {limit})")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Request body too large: {0}")]
    RequestTooLarge(String),

    #[error("Caption parse error: {0}")]
    Caption(String),

    #[error("TTS upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("TTS upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<toml::de::Error> for StudioError {
    fn from(err: toml::de::Error) -> Self {
        StudioError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for StudioError {
    fn from(err: toml::ser::Error) -> Self {
        StudioError::Config(err.to_string())
    }
}

impl From<reqwest::Error> for StudioError {
    fn from(err: reqwest::Error) -> Self {
        StudioError::UpstreamUnavailable(err.to_string())
    }
}

/// Map an extractor rejection onto the error it is reported as
fn rejection(status: StatusCode, message: String) -> StudioError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        StudioError::RequestTooLarge(message)
    } else {
        StudioError::Validation(message)
    }
}

impl From<JsonRejection> for StudioError {
    fn from(rejection: JsonRejection) -> Self {
        self::rejection(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for StudioError {
    fn from(rejection: PathRejection) -> Self {
        self::rejection(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for StudioError {
    fn from(rejection: QueryRejection) -> Self {
        self::rejection(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartRejection> for StudioError {
    fn from(rejection: MultipartRejection) -> Self {
        self::rejection(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartError> for StudioError {
    fn from(err: MultipartError) -> Self {
        self::rejection(err.status(), format!("invalid multipart body: {}", err.body_text()))
    }
}

impl StudioError {
    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            StudioError::Validation(_) | StudioError::Caption(_) => StatusCode::BAD_REQUEST,
            StudioError::ProjectNotFound(_) | StudioError::ObjectNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            StudioError::PayloadTooLarge { .. } | StudioError::RequestTooLarge(_) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            StudioError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            StudioError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StudioError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("{}", self);
        }

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, StudioError>;
