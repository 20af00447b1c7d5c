use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::domain::{
    ChecklistSubmission, SubmissionId, SubmissionReceipt, ValidationPageView, ValidationRequest,
};
use super::service::{SubmissionService, SubmissionServiceError};
use super::store::{StoreError, SubmissionStore};

/// Router builder exposing intake, supervisor validation, and compliance endpoints.
pub fn submission_router<S>(service: Arc<SubmissionService<S>>) -> Router
where
    S: SubmissionStore + 'static,
{
    Router::new()
        .route("/submit-form", axum::routing::post(submit_handler::<S>))
        .route(
            "/validate/:id",
            get(validation_page_handler::<S>).post(validate_handler::<S>),
        )
        .route("/validate-status/:id", get(status_handler::<S>))
        .route("/view-checklist/:id", get(view_handler::<S>))
        .route("/api/compliance/metrics", get(daily_metrics_handler::<S>))
        .route(
            "/api/compliance/supervisors",
            get(supervisor_metrics_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<SubmissionService<S>>>,
    Json(submission): Json<ChecklistSubmission>,
) -> Response
where
    S: SubmissionStore + 'static,
{
    match on_blocking_pool(service, move |service| service.submit(submission)).await {
        Ok(record) => {
            let receipt = SubmissionReceipt {
                message: "Form submitted",
                id: record.id,
            };
            (StatusCode::CREATED, Json(receipt)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn validation_page_handler<S>(
    State(service): State<Arc<SubmissionService<S>>>,
    Path(id): Path<String>,
) -> Response
where
    S: SubmissionStore + 'static,
{
    match on_blocking_pool(service, move |service| service.get(&SubmissionId(id))).await {
        Ok(record) => (StatusCode::OK, Json(ValidationPageView::from(&record))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn validate_handler<S>(
    State(service): State<Arc<SubmissionService<S>>>,
    Path(id): Path<String>,
    Json(request): Json<ValidationRequest>,
) -> Response
where
    S: SubmissionStore + 'static,
{
    match on_blocking_pool(service, move |service| {
        service.validate(&SubmissionId(id), request)
    })
    .await
    {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "message": "Validation completed successfully." })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<S>(
    State(service): State<Arc<SubmissionService<S>>>,
    Path(id): Path<String>,
) -> Response
where
    S: SubmissionStore + 'static,
{
    match on_blocking_pool(service, move |service| service.status(&SubmissionId(id))).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn view_handler<S>(
    State(service): State<Arc<SubmissionService<S>>>,
    Path(id): Path<String>,
) -> Response
where
    S: SubmissionStore + 'static,
{
    match on_blocking_pool(service, move |service| service.get(&SubmissionId(id))).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn daily_metrics_handler<S>(
    State(service): State<Arc<SubmissionService<S>>>,
) -> Response
where
    S: SubmissionStore + 'static,
{
    match on_blocking_pool(service, |service| service.daily_metrics()).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn supervisor_metrics_handler<S>(
    State(service): State<Arc<SubmissionService<S>>>,
) -> Response
where
    S: SubmissionStore + 'static,
{
    match on_blocking_pool(service, |service| service.supervisor_metrics()).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(err) => error_response(err),
    }
}

/// Store calls may touch the filesystem, so they run on tokio's blocking pool instead of an
/// async worker.
async fn on_blocking_pool<S, T, F>(
    service: Arc<SubmissionService<S>>,
    work: F,
) -> Result<T, SubmissionServiceError>
where
    S: SubmissionStore + 'static,
    T: Send + 'static,
    F: FnOnce(&SubmissionService<S>) -> Result<T, SubmissionServiceError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || work(&service))
        .await
        .unwrap_or_else(|err| {
            Err(SubmissionServiceError::Store(StoreError::Unavailable(
                format!("submission worker failed: {err}"),
            )))
        })
}

pub(crate) fn error_response(err: SubmissionServiceError) -> Response {
    let (status, payload) = match &err {
        SubmissionServiceError::Intake(violation) => (
            StatusCode::BAD_REQUEST,
            json!({ "error": violation.to_string() }),
        ),
        SubmissionServiceError::Store(StoreError::AlreadyValidated(existing)) => (
            StatusCode::BAD_REQUEST,
            json!({
                "message": "This checklist has already been validated and cannot be modified.",
                "error": existing.to_string(),
                "isAlreadyValidated": true,
                "supervisorValidation": existing,
            }),
        ),
        SubmissionServiceError::Store(StoreError::Rejected(rejection)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": rejection.to_string() }),
        ),
        SubmissionServiceError::Store(StoreError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            json!({ "error": "Checklist not found" }),
        ),
        SubmissionServiceError::Store(StoreError::DuplicateId(_)) => (
            StatusCode::CONFLICT,
            json!({ "error": err.to_string() }),
        ),
        SubmissionServiceError::Store(StoreError::Unavailable(_)) => {
            tracing::error!(error = %err, "submission store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "submission store unavailable" }),
            )
        }
    };

    (status, Json(payload)).into_response()
}
