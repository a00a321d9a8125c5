use crate::models::PaymentStatus;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaymentEngineError>;

#[derive(Error, Debug)]
pub enum PaymentEngineError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Payment not found: {0}")]
    PaymentNotFound(uuid::Uuid),

    #[error("No statistics recorded for {0}")]
    StatNotFound(NaiveDate),

    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("Authentication required")]
    Unauthorized,

    #[error("Insufficient privileges")]
    Forbidden,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ResponseError for PaymentEngineError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let mut body = json!({
            "error": {
                "code": status_code.as_u16(),
                "message": self.to_string(),
                "type": self.error_type()
            }
        });

        // Per-field breakdown for validation failures
        if let PaymentEngineError::Validation(errors) = self {
            if let Ok(fields) = serde_json::to_value(errors) {
                body["error"]["fields"] = fields;
            }
        }

        HttpResponse::build(status_code).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            PaymentEngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PaymentEngineError::Validation(_) => StatusCode::BAD_REQUEST,
            PaymentEngineError::PaymentNotFound(_) => StatusCode::NOT_FOUND,
            PaymentEngineError::StatNotFound(_) => StatusCode::NOT_FOUND,
            PaymentEngineError::IllegalTransition { .. } => StatusCode::CONFLICT,
            PaymentEngineError::Unauthorized => StatusCode::UNAUTHORIZED,
            PaymentEngineError::Forbidden => StatusCode::FORBIDDEN,
            PaymentEngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl PaymentEngineError {
    fn error_type(&self) -> &str {
        match self {
            PaymentEngineError::Database(_) => "database_error",
            PaymentEngineError::Validation(_) => "validation_error",
            PaymentEngineError::PaymentNotFound(_) => "not_found",
            PaymentEngineError::StatNotFound(_) => "not_found",
            PaymentEngineError::IllegalTransition { .. } => "illegal_transition",
            PaymentEngineError::Unauthorized => "unauthorized",
            PaymentEngineError::Forbidden => "forbidden",
            PaymentEngineError::Internal(_) => "internal_error",
        }
    }
}
