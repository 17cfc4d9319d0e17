use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Db(sqlx::Error),
    /// Missing or malformed identifier or payload field.
    InvalidArgument(String),
    /// Attendance status outside the fixed vocabulary.
    InvalidStatus(String),
    NotFound(String),
    /// Unique constraint hit, or an operation on an already-closed resource.
    Conflict(String),
    /// Stored data that cannot be interpreted (e.g. a meeting date/time).
    Parse(String),
    Session(String),
    PermissionDenied(String),
}

/// JSON error body returned by every API route.
#[derive(Serialize, Debug)]
pub struct ApiErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::InvalidArgument(e) => write!(f, "Invalid argument: {e}"),
            AppError::InvalidStatus(s) => write!(f, "Invalid status: {s}"),
            AppError::NotFound(what) => write!(f, "Not found: {what}"),
            AppError::Conflict(e) => write!(f, "Conflict: {e}"),
            AppError::Parse(e) => write!(f, "Parse error: {e}"),
            AppError::Session(e) => write!(f, "Session error: {e}"),
            AppError::PermissionDenied(code) => write!(f, "Permission denied: {code}"),
        }
    }
}

impl AppError {
    fn label(&self) -> &'static str {
        match self {
            AppError::Db(_) | AppError::Parse(_) => "Internal Server Error",
            AppError::InvalidArgument(_) => "Invalid argument",
            AppError::InvalidStatus(_) => "Invalid status",
            AppError::NotFound(_) => "Not found",
            AppError::Conflict(_) => "Conflict",
            AppError::Session(_) => "Not authenticated",
            AppError::PermissionDenied(_) => "Permission denied",
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            AppError::Db(_) | AppError::Parse(_) => None,
            AppError::InvalidArgument(s)
            | AppError::InvalidStatus(s)
            | AppError::NotFound(s)
            | AppError::Conflict(s)
            | AppError::Session(s)
            | AppError::PermissionDenied(s) => Some(s.clone()),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidArgument(_) | AppError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            AppError::Session(_) => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Db(_) | AppError::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{self}");
        } else {
            log::debug!("{self}");
        }
        HttpResponse::build(status).json(ApiErrorResponse {
            error: self.label().to_string(),
            details: self.details(),
        })
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                log::debug!("Unique violation: {}", db.message());
                AppError::Conflict(conflict_message(db.constraint()).to_string())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                log::debug!("Foreign key violation: {}", db.message());
                AppError::NotFound("referenced row not found".to_string())
            }
            _ => AppError::Db(e),
        }
    }
}

/// Client-facing text for a unique constraint, keyed by its Postgres name.
fn conflict_message(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("users_email_key") => "email already in use",
        Some("users_external_id_key") => "external id already in use",
        Some("attendance_user_id_meeting_id_key") => {
            "attendance already recorded for this user and meeting"
        }
        Some("requests_attendance_id_key") => "a request already exists for this attendance",
        Some("voting_records_voting_event_id_user_id_key") => "user has already voted in this event",
        _ => "resource already exists",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request() {
        assert_eq!(
            AppError::InvalidArgument("userId".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidStatus("LATE".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn parse_failure_is_a_server_error() {
        let err = AppError::Parse("meeting 4 start".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.details().is_none());
    }

    #[test]
    fn not_found_carries_details() {
        let err = AppError::NotFound("attendance 9".into());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.details().as_deref(), Some("attendance 9"));
    }

    #[test]
    fn auth_errors_map_to_401_and_403() {
        assert_eq!(
            AppError::Session("no user".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::PermissionDenied("EBOARD".into()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn conflicts_use_domain_text() {
        assert_eq!(conflict_message(Some("users_email_key")), "email already in use");
        assert_eq!(
            conflict_message(Some("voting_records_voting_event_id_user_id_key")),
            "user has already voted in this event"
        );
        assert_eq!(conflict_message(Some("some_other_key")), "resource already exists");
        assert_eq!(conflict_message(None), "resource already exists");
    }
}
