use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::submissions::router::error_response;
use crate::workflows::submissions::{StoreError, SubmissionServiceError};
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
    Serialization(serde_json::Error),
    Submissions(SubmissionServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Serialization(err) => write!(f, "serialization error: {}", err),
            AppError::Submissions(err) => write!(f, "submission error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Serialization(err) => Some(err),
            AppError::Submissions(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Submissions(err) => error_response(err),
            other => {
                let body = Json(json!({ "error": other.to_string() }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
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

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

impl From<SubmissionServiceError> for AppError {
    fn from(value: SubmissionServiceError) -> Self {
        Self::Submissions(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Submissions(SubmissionServiceError::Store(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::submissions::{
        AlreadyValidated, IncompleteValidation, SubmissionId, ValidationRejection,
    };
    use chrono::{TimeZone, Utc};

    #[test]
    fn missing_submission_maps_to_not_found() {
        let err = AppError::from(StoreError::NotFound(SubmissionId::from("gone")));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn submission_errors_share_the_router_status_table() {
        let already = AppError::from(StoreError::AlreadyValidated(AlreadyValidated {
            supervisor_name: "Dana Ruiz".to_string(),
            validated_at: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
        }));
        assert_eq!(already.into_response().status(), StatusCode::BAD_REQUEST);

        let incomplete = AppError::from(StoreError::Rejected(ValidationRejection::Incomplete(
            IncompleteValidation::NoValidatedCheckboxes,
        )));
        assert_eq!(
            incomplete.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );

        let duplicate = AppError::from(StoreError::DuplicateId(SubmissionId::from("dup")));
        assert_eq!(duplicate.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn config_errors_are_internal() {
        let err = AppError::from(ConfigError::InvalidPort);
        assert_eq!(err.to_string(), "configuration error: APP_PORT must be a valid u16");
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
