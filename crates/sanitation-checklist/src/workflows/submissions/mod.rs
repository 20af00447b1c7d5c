//! Checklist submission intake, one-time supervisor validation, and compliance reporting.

pub mod compliance;
pub mod domain;
pub mod file;
pub mod memory;
pub mod router;
pub mod service;
pub mod store;
pub mod validation;

#[cfg(test)]
mod tests;

pub use compliance::{
    daily_compliance, supervisor_activity, validation_rate, ComplianceAggregator,
    ComplianceMetricRow, SupervisorMetricRow,
};
pub use domain::{
    ChecklistHeading, ChecklistSubmission, ChecklistTask, IncompleteValidation, SubmissionId,
    SubmissionReceipt, SubmissionRecord, SupervisorValidation, ValidatedCheckbox,
    ValidationPageView, ValidationRequest, ValidationStatusView,
};
pub use file::FileSubmissionStore;
pub use memory::InMemorySubmissionStore;
pub use router::submission_router;
pub use service::{IntakeViolation, SubmissionService, SubmissionServiceError};
pub use store::{StoreError, SubmissionMutator, SubmissionSnapshot, SubmissionStore};
pub use validation::{
    apply_validation, can_validate, is_validated, AlreadyValidated, ValidationRejection,
};
