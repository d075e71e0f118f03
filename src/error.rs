use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid request body: {0}")]
    JsonBody(#[from] JsonRejection),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Upstream API returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Excel export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("PDF export error: {0}")]
    Pdf(#[from] printpdf::Error),
}

/// Coarse category the UI uses to decide how a failure is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Unexpected,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::Unexpected => "unexpected",
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::BadRequest(_) | Error::Validation(_) | Error::Json(_) | Error::JsonBody(_) => {
                ErrorKind::Validation
            }
            _ => ErrorKind::Unexpected,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let kind = self.kind();
        let (status, error_message) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Error::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Json(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::JsonBody(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text()),
            Error::Reqwest(err) => {
                tracing::error!(error = %err, "upstream request failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "The evaluation service is unreachable, please try again later".to_string(),
                )
            }
            Error::Upstream { status, body } => {
                tracing::error!(status, body = %body, "upstream API error");
                (
                    StatusCode::BAD_GATEWAY,
                    "The evaluation service returned an error".to_string(),
                )
            }
            Error::Xlsx(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("Export error: {}", err)),
            Error::Pdf(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("Export error: {}", err)),
            other => {
                tracing::error!(error = %other, "unexpected error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message, "kind": kind.as_str() }));
        (status, body).into_response()
    }
}
