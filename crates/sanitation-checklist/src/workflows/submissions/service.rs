use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::compliance::{ComplianceAggregator, ComplianceMetricRow, SupervisorMetricRow};
use super::domain::{
    ChecklistSubmission, SubmissionId, SubmissionRecord, ValidationRequest, ValidationStatusView,
};
use super::store::{StoreError, SubmissionStore};
use super::validation::{apply_validation, can_validate, ValidationRejection};

/// Intake checks applied before a submission is stored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeViolation {
    #[error("page title is missing from the submission")]
    MissingTitle,
    #[error("checklist contains no tasks")]
    MissingTasks,
    #[error("task id {0} appears more than once")]
    DuplicateTaskId(String),
}

/// Service composing the store, the validation rules, and the compliance aggregator.
pub struct SubmissionService<S> {
    store: Arc<S>,
    aggregator: ComplianceAggregator<S>,
}

impl<S> SubmissionService<S>
where
    S: SubmissionStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        let aggregator = ComplianceAggregator::new(store.clone());
        Self { store, aggregator }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Store a new checklist submission stamped with the current time.
    pub fn submit(
        &self,
        submission: ChecklistSubmission,
    ) -> Result<SubmissionRecord, SubmissionServiceError> {
        self.submit_at(submission, Utc::now())
    }

    pub fn submit_at(
        &self,
        submission: ChecklistSubmission,
        now: DateTime<Utc>,
    ) -> Result<SubmissionRecord, SubmissionServiceError> {
        check_intake(&submission)?;

        let record = SubmissionRecord {
            id: SubmissionId::generate(),
            title: submission.title.trim().to_string(),
            original_filename: submission.original_filename,
            submitted_at: now,
            headings: submission.headings,
            supervisor_validation: None,
        };

        let stored = self.store.put(record)?;
        tracing::info!(
            submission_id = %stored.id,
            filename = %stored.original_filename,
            tasks = stored.tasks().count(),
            "checklist submission stored"
        );
        Ok(stored)
    }

    /// Record a supervisor sign-off. Rejected when the checklist is already validated, even if a
    /// concurrent request got there between the pre-check and the write.
    pub fn validate(
        &self,
        id: &SubmissionId,
        request: ValidationRequest,
    ) -> Result<SubmissionRecord, SubmissionServiceError> {
        self.validate_at(id, request, Utc::now())
    }

    pub fn validate_at(
        &self,
        id: &SubmissionId,
        request: ValidationRequest,
        now: DateTime<Utc>,
    ) -> Result<SubmissionRecord, SubmissionServiceError> {
        let current = self.store.get(id)?;
        if let Err(existing) = can_validate(&current) {
            tracing::info!(submission_id = %id, %existing, "validation rejected");
            return Err(StoreError::AlreadyValidated(existing).into());
        }

        let checkboxes = request.checkbox_map();
        let supervisor_name = request.supervisor_name;
        let result = self.store.update(id, &|record| {
            apply_validation(record, &supervisor_name, checkboxes.clone(), now)
        });

        match result {
            Ok(record) => {
                tracing::info!(submission_id = %id, supervisor = %supervisor_name, "checklist validated");
                Ok(record)
            }
            Err(err) => {
                tracing::info!(submission_id = %id, error = %err, "validation rejected");
                Err(err.into())
            }
        }
    }

    pub fn get(&self, id: &SubmissionId) -> Result<SubmissionRecord, SubmissionServiceError> {
        Ok(self.store.get(id)?)
    }

    pub fn status(&self, id: &SubmissionId) -> Result<ValidationStatusView, SubmissionServiceError> {
        let record = self.store.get(id)?;
        Ok(ValidationStatusView::from(&record))
    }

    pub fn daily_metrics(&self) -> Result<Vec<ComplianceMetricRow>, SubmissionServiceError> {
        Ok(self.aggregator.daily_metrics()?)
    }

    pub fn supervisor_metrics(&self) -> Result<Vec<SupervisorMetricRow>, SubmissionServiceError> {
        Ok(self.aggregator.supervisor_metrics()?)
    }
}

fn check_intake(submission: &ChecklistSubmission) -> Result<(), IntakeViolation> {
    if submission.title.trim().is_empty() {
        return Err(IntakeViolation::MissingTitle);
    }

    let mut seen = BTreeSet::new();
    for task in submission.headings.iter().flat_map(|heading| &heading.tasks) {
        if !seen.insert(task.id.as_str()) {
            return Err(IntakeViolation::DuplicateTaskId(task.id.clone()));
        }
    }
    if seen.is_empty() {
        return Err(IntakeViolation::MissingTasks);
    }

    Ok(())
}

/// Error raised by the submission service.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeViolation),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ValidationRejection> for SubmissionServiceError {
    fn from(value: ValidationRejection) -> Self {
        Self::Store(value.into())
    }
}
