use std::io::Error as IoError;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use serde_json::json;
use thiserror::Error;

use crate::db::DatabaseError;

pub mod config;
pub mod repository;
pub mod service;

pub use config::ConfigError;
pub use repository::RepositoryError;
pub use service::ServiceError;

#[derive(Debug, Error)]
pub enum AppError {
    // Service-level domain errors
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Conflict error: {0}")]
    Conflict(String),
    #[error("Not found error: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
    // Infrastructure/system errors
    #[error("Server error: {0}")]
    Server(#[from] IoError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Logger error: {0}")]
    Logger(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    fn error_type(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION ERROR",
            AppError::Conflict(_) => "CONFLICT",
            AppError::NotFound(_) => "NOT FOUND",
            AppError::Internal(_) => "INTERNAL ERROR",
            AppError::Server(_) => "SERVER ERROR",
            AppError::Config(_) => "CONFIGURATION ERROR",
            AppError::Logger(_) => "LOGGER ERROR",
            AppError::Storage(_) => "STORAGE ERROR",
        }
    }

    /// Message safe to show to a client. Internal details stay in the logs.
    fn public_message(&self) -> &str {
        match self {
            AppError::Validation(msg) | AppError::Conflict(msg) | AppError::NotFound(msg) => msg,
            _ => "An internal error occurred",
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<DatabaseError> for AppError {
    fn from(e: DatabaseError) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::ValidationError(msg) => AppError::Validation(msg),
            ServiceError::Conflict(msg) => AppError::Conflict(msg),
            ServiceError::NotFound(msg) => AppError::NotFound(msg),
            ServiceError::InternalError(msg) => AppError::Internal(msg),
            ServiceError::Repository(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_)
            | AppError::Server(_)
            | AppError::Config(_)
            | AppError::Logger(_)
            | AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        HttpResponse::build(status).json(json!({
            "type": self.error_type(),
            "message": self.public_message(),
            "status_code": status.as_u16(),
        }))
    }
}
