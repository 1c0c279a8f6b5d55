//! errors.rs
//!
//! Единая таксономия ошибок приложения. Каждый обработчик возвращает
//! `Result<_, AppError>`; конвертация в HTTP-ответ происходит в одном месте.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("This email is already registered for this event.")]
    DuplicateRegistration,

    #[error("This event has reached its maximum number of attendees.")]
    CapacityExceeded,

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::DuplicateRegistration => StatusCode::CONFLICT,
            AppError::CapacityExceeded => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_FAILURE",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "AUTHORIZATION_DENIED",
            AppError::DuplicateRegistration => "DUPLICATE_REGISTRATION",
            AppError::CapacityExceeded => "CAPACITY_EXCEEDED",
            AppError::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Детали ошибок БД остаются в логах, клиенту уходит общий текст
        let message = match &self {
            AppError::Database(e) => {
                error!("database error: {:?}", e);
                "A database error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(serde_json::json!({
            "success": false,
            "code": code,
            "error": message,
        }));

        (status, body).into_response()
    }
}

// Ошибки валидации форм приводим к одному пользовательскому сообщению
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort();
        AppError::Validation(format!(
            "Please ensure you filled all the details correctly: {}",
            fields.join(", ")
        ))
    }
}

// 23505 — нарушение уникальности в Postgres
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err.as_database_error().and_then(|db| db.code()),
        Some(code) if code == "23505"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::DuplicateRegistration.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::CapacityExceeded.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn duplicate_and_capacity_have_distinct_codes() {
        assert_ne!(AppError::DuplicateRegistration.code(), AppError::CapacityExceeded.code());
    }

    #[test]
    fn validation_errors_collapse_to_field_list() {
        use validator::Validate;

        #[derive(Validate)]
        struct Form {
            #[validate(email)]
            email: String,
        }

        let err: AppError = Form { email: "not-an-email".into() }
            .validate()
            .unwrap_err()
            .into();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("email")),
            other => panic!("expected Validation, got {:?}", other),
        }
    }
}
