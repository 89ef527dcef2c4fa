use crate::config::ConfigError;
use crate::matching::{AssignmentError, RepositoryError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Assignment(AssignmentError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Assignment(err) => match err {
                AssignmentError::CaseNotFound(_) | AssignmentError::LawyerNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                AssignmentError::InvalidState { .. }
                | AssignmentError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
                AssignmentError::TransactionFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
                AssignmentError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AssignmentError::NoAvailableCandidates
                | AssignmentError::InsufficientScore { .. }
                | AssignmentError::ReassignmentExhausted { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
            },
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Assignment(err) => write!(f, "assignment error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Assignment(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retryable = matches!(&self, AppError::Assignment(err) if err.is_retryable());

        let body = Json(json!({ "error": self.to_string(), "retryable": retryable }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<AssignmentError> for AppError {
    fn from(value: AssignmentError) -> Self {
        Self::Assignment(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::CaseId;

    #[test]
    fn maps_assignment_errors_to_http_statuses() {
        let cases = [
            (
                AppError::from(AssignmentError::CaseNotFound(CaseId("c-1".to_string()))),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(AssignmentError::NoAvailableCandidates),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::from(AssignmentError::TransactionFailure(
                    RepositoryError::Unavailable("offline".to_string()),
                )),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::from(AssignmentError::Repository(RepositoryError::Conflict)),
                StatusCode::CONFLICT,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
