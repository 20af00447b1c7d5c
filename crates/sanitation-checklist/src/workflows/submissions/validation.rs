//! Supervisor validation state: whether a submission counts as validated and whether a new
//! sign-off may be applied to it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{IncompleteValidation, SubmissionRecord, SupervisorValidation};

/// Raised when a sign-off is attempted on a submission that already carries one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("checklist already validated by {supervisor_name} at {validated_at}")]
pub struct AlreadyValidated {
    pub supervisor_name: String,
    pub validated_at: DateTime<Utc>,
}

/// Every way a validation attempt can be turned away.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationRejection {
    #[error(transparent)]
    AlreadyValidated(#[from] AlreadyValidated),
    #[error(transparent)]
    Incomplete(#[from] IncompleteValidation),
}

/// A submission is validated only when the sign-off exists, names a supervisor, and holds at
/// least one checkbox verdict. Stored data with an empty verdict map stays unvalidated.
pub fn is_validated(record: &SubmissionRecord) -> bool {
    record.supervisor_validation.as_ref().is_some_and(|validation| {
        !validation.supervisor_name.is_empty() && !validation.validated_checkboxes.is_empty()
    })
}

pub fn can_validate(record: &SubmissionRecord) -> Result<(), AlreadyValidated> {
    match &record.supervisor_validation {
        Some(existing) if is_validated(record) => Err(AlreadyValidated {
            supervisor_name: existing.supervisor_name.clone(),
            validated_at: existing.validated_at,
        }),
        _ => Ok(()),
    }
}

/// Produce the validated copy of `record`. The caller persists it through
/// [`SubmissionStore::update`](super::store::SubmissionStore::update) so the check and the
/// write happen under the same store lock.
pub fn apply_validation(
    record: &SubmissionRecord,
    supervisor_name: &str,
    validated_checkboxes: BTreeMap<String, bool>,
    now: DateTime<Utc>,
) -> Result<SubmissionRecord, ValidationRejection> {
    can_validate(record)?;

    for task_id in validated_checkboxes.keys() {
        if !record.has_task(task_id) {
            tracing::warn!(
                submission_id = %record.id,
                task_id = %task_id,
                "validated checkbox not found under any heading"
            );
        }
    }

    let validation = SupervisorValidation::new(supervisor_name, validated_checkboxes, now)?;
    Ok(SubmissionRecord {
        supervisor_validation: Some(validation),
        ..record.clone()
    })
}
