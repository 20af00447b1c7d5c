use std::collections::BTreeMap;
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::submissions::domain::{
    ChecklistHeading, ChecklistSubmission, ChecklistTask, SubmissionId, SubmissionRecord,
    SupervisorValidation, ValidatedCheckbox, ValidationRequest,
};
use crate::workflows::submissions::memory::InMemorySubmissionStore;
use crate::workflows::submissions::service::SubmissionService;
use crate::workflows::submissions::store::{
    StoreError, SubmissionMutator, SubmissionSnapshot, SubmissionStore,
};

pub(super) fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn task(id: &str, checked: bool) -> ChecklistTask {
    ChecklistTask {
        id: id.to_string(),
        label: format!("Task {id}"),
        checked,
    }
}

pub(super) fn headings() -> Vec<ChecklistHeading> {
    vec![
        ChecklistHeading {
            heading: "Floors & Drains".to_string(),
            tasks: vec![task("floor-1", true), task("floor-2", true)],
        },
        ChecklistHeading {
            heading: "Racking".to_string(),
            tasks: vec![task("rack-1", false), task("rack-2", true)],
        },
    ]
}

pub(super) fn submission() -> ChecklistSubmission {
    ChecklistSubmission {
        title: "Daily Dock Sanitation".to_string(),
        original_filename: "daily_A.html".to_string(),
        headings: headings(),
    }
}

pub(super) fn validation_request(supervisor: &str) -> ValidationRequest {
    ValidationRequest {
        supervisor_name: supervisor.to_string(),
        validated_checkboxes: vec![
            ValidatedCheckbox {
                id: "floor-1".to_string(),
                checked: true,
            },
            ValidatedCheckbox {
                id: "rack-1".to_string(),
                checked: false,
            },
        ],
    }
}

pub(super) fn record(id: &str, filename: &str, submitted_at: DateTime<Utc>) -> SubmissionRecord {
    SubmissionRecord {
        id: SubmissionId::from(id),
        title: "Daily Dock Sanitation".to_string(),
        original_filename: filename.to_string(),
        submitted_at,
        headings: headings(),
        supervisor_validation: None,
    }
}

pub(super) fn validated(
    mut record: SubmissionRecord,
    supervisor: &str,
    validated_at: DateTime<Utc>,
) -> SubmissionRecord {
    record.supervisor_validation = Some(
        SupervisorValidation::new(
            supervisor,
            BTreeMap::from([
                ("floor-1".to_string(), true),
                ("rack-1".to_string(), false),
            ]),
            validated_at,
        )
        .expect("complete sign-off"),
    );
    record
}

pub(super) fn build_service() -> (
    SubmissionService<InMemorySubmissionStore>,
    Arc<InMemorySubmissionStore>,
) {
    let store = Arc::new(InMemorySubmissionStore::default());
    (SubmissionService::new(store.clone()), store)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Store double whose backend is always down.
#[derive(Default)]
pub(super) struct UnavailableStore;

impl SubmissionStore for UnavailableStore {
    fn put(&self, _record: SubmissionRecord) -> Result<SubmissionRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn get(&self, _id: &SubmissionId) -> Result<SubmissionRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn list_all(&self) -> Result<SubmissionSnapshot, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn update(
        &self,
        _id: &SubmissionId,
        _mutator: &SubmissionMutator<'_>,
    ) -> Result<SubmissionRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}
