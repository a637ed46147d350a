use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Every failure a parking operation can produce.
///
/// Business-rule violations carry the user-facing message in their `Display`
/// impl; handlers turn them into flash redirects. Everything else renders as a
/// JSON error body through `IntoResponse`.
#[derive(Debug, Error)]
pub enum ParkingError {
    #[error("No available spots in this lot.")]
    NoAvailability,

    #[error("Cannot edit spots while some spots are occupied.")]
    ResizeWhileOccupied,

    #[error("Cannot delete lot with occupied spots.")]
    DeleteWhileOccupied,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("This reservation has already been vacated.")]
    AlreadyVacated,

    #[error("Username already exists.")]
    UsernameTaken,

    #[error("Email already registered.")]
    EmailTaken,

    #[error("Admin registration not allowed")]
    AdminRegistration,

    #[error("Invalid credentials. Please try again.")]
    InvalidCredentials,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

pub type ParkingResult<T> = Result<T, ParkingError>;

impl ParkingError {
    /// True for failures the user caused by breaking a business rule. These
    /// are reported with a flash message instead of an error status.
    pub fn is_rule_violation(&self) -> bool {
        matches!(
            self,
            ParkingError::NoAvailability
                | ParkingError::ResizeWhileOccupied
                | ParkingError::DeleteWhileOccupied
                | ParkingError::Unauthorized
                | ParkingError::AlreadyVacated
                | ParkingError::UsernameTaken
                | ParkingError::EmailTaken
                | ParkingError::AdminRegistration
                | ParkingError::InvalidCredentials
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ParkingError::NoAvailability
            | ParkingError::ResizeWhileOccupied
            | ParkingError::DeleteWhileOccupied
            | ParkingError::AlreadyVacated
            | ParkingError::UsernameTaken
            | ParkingError::EmailTaken => StatusCode::CONFLICT,
            ParkingError::Unauthorized | ParkingError::AdminRegistration => StatusCode::FORBIDDEN,
            ParkingError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ParkingError::NotFound(_) => StatusCode::NOT_FOUND,
            ParkingError::Validation(_) => StatusCode::BAD_REQUEST,
            ParkingError::Database(_) | ParkingError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ParkingError::NoAvailability => "NO_AVAILABILITY",
            ParkingError::ResizeWhileOccupied | ParkingError::DeleteWhileOccupied => "LOT_OCCUPIED",
            ParkingError::Unauthorized => "UNAUTHORIZED",
            ParkingError::AlreadyVacated => "ALREADY_VACATED",
            ParkingError::UsernameTaken | ParkingError::EmailTaken => "DUPLICATE_USER",
            ParkingError::AdminRegistration => "FORBIDDEN",
            ParkingError::InvalidCredentials => "AUTH_ERROR",
            ParkingError::NotFound(_) => "NOT_FOUND",
            ParkingError::Validation(_) => "VALIDATION_ERROR",
            ParkingError::Database(_) => "DATABASE_ERROR",
            ParkingError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub(crate) fn log(&self) {
        match self {
            ParkingError::Database(e) => error!(error = ?e, "database error"),
            ParkingError::Internal(e) => error!(error = ?e, "internal error"),
            other => warn!(code = other.code(), message = %other, "request rejected"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: ApiErrorBody,
}

impl IntoResponse for ParkingError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status_code();
        // infrastructure details stay in the logs
        let body = ApiErrorResponse {
            success: false,
            error: ApiErrorBody {
                code: self.code(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_violations_are_flagged() {
        assert!(ParkingError::NoAvailability.is_rule_violation());
        assert!(ParkingError::DeleteWhileOccupied.is_rule_violation());
        assert!(!ParkingError::NotFound("reservation").is_rule_violation());
        assert!(!ParkingError::Validation("bad".into()).is_rule_violation());
    }

    #[test]
    fn database_errors_hide_details() {
        let err = ParkingError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.to_string(), "Database error");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn not_found_names_the_entity() {
        let err = ParkingError::NotFound("parking lot");
        assert_eq!(err.to_string(), "parking lot not found");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
