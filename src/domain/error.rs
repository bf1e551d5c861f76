use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    Internal(String),
    NotFound(String),
    ValidationError(String),
    /// Upload could not be read as a supported spreadsheet.
    FileFormat(String),
    /// Query against a session that has no dataset loaded.
    NoData(String),
    SessionBusy(String),
    PayloadTooLarge(String),
    Config(String),
    IoError(String),
}

impl AppError {
    /// Stable machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Internal(_) => "internal",
            AppError::NotFound(_) => "not_found",
            AppError::ValidationError(_) => "validation",
            AppError::FileFormat(_) => "file_format",
            AppError::NoData(_) => "no_data",
            AppError::SessionBusy(_) => "session_busy",
            AppError::PayloadTooLarge(_) => "payload_too_large",
            AppError::Config(_) => "config",
            AppError::IoError(_) => "io",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Internal(msg)
            | AppError::NotFound(msg)
            | AppError::ValidationError(msg)
            | AppError::FileFormat(msg)
            | AppError::NoData(msg)
            | AppError::SessionBusy(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::Config(msg)
            | AppError::IoError(msg) => msg,
        }
    }

    pub fn no_data() -> Self {
        AppError::NoData("No dataset loaded. Upload a file first.".to_string())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::FileFormat(msg) => write!(f, "File format error: {}", msg),
            AppError::NoData(msg) => write!(f, "No data: {}", msg),
            AppError::SessionBusy(msg) => write!(f, "Session busy: {}", msg),
            AppError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) | AppError::NoData(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::FileFormat(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::SessionBusy(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) | AppError::Config(_) | AppError::IoError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.code(),
            message: self.message(),
        })
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
