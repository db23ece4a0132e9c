use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};

use crate::domain::validation::Rejection;
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Sold out: {remaining} ticket(s) remaining")]
    SoldOut { remaining: i64, message: String },

    #[error("Ticket rejected: {}", .0.reason())]
    TicketRejected(Rejection),

    #[error("Too many requests: {0}")]
    RateLimited(String),

    #[error("Database error")]
    DatabaseError(sqlx::Error),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Internal server error")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::SoldOut { .. } => StatusCode::CONFLICT,
            AppError::TicketRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::SoldOut { .. } => "SOLD_OUT",
            AppError::TicketRejected(_) => "TICKET_REJECTED",
            AppError::RateLimited(_) => "RATE_LIMITED",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::ExternalServiceError(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::RateLimited(msg) => {
                warn!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::SoldOut { remaining, .. } => {
                warn!(remaining, "Request rejected: sold out");
            }
            AppError::TicketRejected(rejection) => {
                warn!(reason = rejection.reason(), "Ticket rejected at gate");
            }
            AppError::ExternalServiceError(msg) | AppError::InternalServerError(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            AppError::SoldOut { remaining, .. } => Some(json!({ "remaining": remaining })),
            AppError::TicketRejected(rejection) => Some(rejection.details()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        // Only expose high-level message to the client
        let public_message = match &self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::RateLimited(msg)
            | AppError::ExternalServiceError(msg) => msg.clone(),
            AppError::SoldOut { message, .. } => message.clone(),
            AppError::TicketRejected(rejection) => rejection.message(),
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
            AppError::InternalServerError(_) => "An internal error occurred".to_string(),
        };

        error_response(code, public_message, self.details(), status)
    }
}

/// Unique violations surface as conflicts; uniqueness checks done before an
/// insert can still lose a race.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let message = match err.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => match db_err.constraint() {
                Some("users_email_key") => "That email is already registered",
                Some("entry_types_venue_id_name_key") => "An entry type with that name already exists",
                Some("venue_applications_one_pending_per_user") => {
                    "You already have a pending venue application"
                }
                Some("ratings_purchase_id_key") => "This purchase has already been rated",
                _ => "A record with those details already exists",
            },
            _ => return AppError::DatabaseError(err),
        };
        AppError::Conflict(message.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let label = field.replace('_', " ");
                errs.iter().map(move |e| match (&e.message, e.code.as_ref()) {
                    (Some(message), _) => message.to_string(),
                    (None, "blank") => format!("{label} is required"),
                    (None, _) => format!("{label} is invalid"),
                })
            })
            .collect();
        messages.sort();
        AppError::ValidationError(messages.join("; "))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::SoldOut {
                remaining: 2,
                message: "x".into()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::RateLimited("x".into()).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_sold_out_carries_remaining() {
        let err = AppError::SoldOut {
            remaining: 3,
            message: "Only 3 left".into(),
        };
        assert_eq!(err.details(), Some(json!({ "remaining": 3 })));
        assert_eq!(err.code(), "SOLD_OUT");
    }

    #[derive(Debug)]
    struct FakeDbError {
        kind: sqlx::error::ErrorKind,
        constraint: Option<&'static str>,
    }

    impl std::fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "duplicate key value violates unique constraint")
        }
    }

    impl std::error::Error for FakeDbError {}

    impl sqlx::error::DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            match &self.kind {
                sqlx::error::ErrorKind::UniqueViolation => sqlx::error::ErrorKind::UniqueViolation,
                _ => sqlx::error::ErrorKind::Other,
            }
        }
    }

    fn db_error(kind: sqlx::error::ErrorKind, constraint: Option<&'static str>) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError { kind, constraint }))
    }

    #[test]
    fn test_unique_violation_becomes_conflict() {
        let err = AppError::from(db_error(
            sqlx::error::ErrorKind::UniqueViolation,
            Some("users_email_key"),
        ));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(matches!(err, AppError::Conflict(ref m) if m == "That email is already registered"));

        let err = AppError::from(db_error(
            sqlx::error::ErrorKind::UniqueViolation,
            Some("entry_types_venue_id_name_key"),
        ));
        assert_eq!(err.code(), "CONFLICT");
    }

    #[test]
    fn test_other_database_errors_stay_internal() {
        let err = AppError::from(db_error(sqlx::error::ErrorKind::CheckViolation, None));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::from(sqlx::Error::RowNotFound).code(), "DATABASE_ERROR");
    }

    #[test]
    fn test_internal_errors_are_not_exposed() {
        let response = AppError::InternalServerError("key file unreadable".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
