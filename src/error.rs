use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use crate::models::ApiResponse;
use serde_json::Value;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden")]
    Forbidden,

    /// Business rule violation with a machine-readable code.
    #[error("{message} ({code})")]
    Service {
        code: String,
        message: String,
        status: StatusCode,
        details: Option<Value>,
    },

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    /// A 400 service error; chain `with_status` for other codes.
    pub fn service(code: &str, message: impl Into<String>) -> Self {
        AppError::Service {
            code: code.to_string(),
            message: message.into(),
            status: StatusCode::BAD_REQUEST,
            details: None,
        }
    }

    pub fn with_status(self, new_status: StatusCode) -> Self {
        match self {
            AppError::Service {
                code,
                message,
                details,
                ..
            } => AppError::Service {
                code,
                message,
                status: new_status,
                details,
            },
            other => other,
        }
    }

    pub fn with_details(self, new_details: Value) -> Self {
        match self {
            AppError::Service {
                code,
                message,
                status,
                ..
            } => AppError::Service {
                code,
                message,
                status,
                details: Some(new_details),
            },
            other => other,
        }
    }

    /// Machine-readable code rendered in the error envelope.
    pub fn code(&self) -> &str {
        match self {
            AppError::Service { code, .. } => code,
            AppError::ValidationError(_) => "validation_error",
            AppError::AuthError(_) | AppError::JwtError(_) => "auth_error",
            AppError::NotFound(_) => "not_found",
            AppError::Forbidden => "forbidden",
            AppError::DatabaseError(_) => "database_error",
            _ => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Service { status, .. } => *status,
            AppError::ValidationError(_) | AppError::SerdeJsonError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let (message, details) = match self {
            AppError::Service {
                code,
                message,
                details,
                ..
            } => {
                log::warn!("Service error [{code}]: {message}");
                (message.clone(), details.clone())
            }
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (msg.clone(), None)
            }
            AppError::SerdeJsonError(err) => {
                log::warn!("Malformed JSON: {err}");
                ("Malformed request body".to_string(), None)
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                (msg.clone(), None)
            }
            AppError::JwtError(err) => {
                log::warn!("Token rejected: {err}");
                ("Invalid or expired token".to_string(), None)
            }
            AppError::NotFound(msg) => (msg.clone(), None),
            AppError::Forbidden => {
                log::warn!("Forbidden access");
                ("Forbidden".to_string(), None)
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                ("Database error".to_string(), None)
            }
            _ => {
                log::error!("Internal error: {self}");
                ("Internal server error".to_string(), None)
            }
        };

        HttpResponse::build(self.status()).json(ApiResponse::failure(self.code(), message, details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_service_error_defaults_to_bad_request() {
        let err = AppError::service("insufficient_points", "Not enough points");
        assert_eq!(err.code(), "insufficient_points");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_service_error_status_and_details() {
        let err = AppError::service("invalid_signature", "Bad signature")
            .with_status(StatusCode::UNAUTHORIZED)
            .with_details(json!({"header": "X-Signature"}));
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        match err {
            AppError::Service { details, .. } => {
                assert_eq!(details.unwrap()["header"], "X-Signature");
            }
            _ => panic!("expected service error"),
        }
    }

    #[test]
    fn test_with_status_ignores_other_variants() {
        let err = AppError::NotFound("rental".into()).with_status(StatusCode::CONFLICT);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn test_error_response_envelope() {
        let err = AppError::service("referral_expired", "Referral has expired");
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
