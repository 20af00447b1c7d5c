use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for stored checklist submissions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub String);

impl SubmissionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubmissionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single checkbox line on a checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistTask {
    pub id: String,
    pub label: String,
    pub checked: bool,
}

/// Heading grouping related tasks, kept in the order the form rendered them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistHeading {
    pub heading: String,
    pub tasks: Vec<ChecklistTask>,
}

/// Supervisor sign-off recorded once against a submission.
///
/// Fields stay public so legacy data can round-trip, but new sign-offs are built through
/// [`SupervisorValidation::new`], which refuses a blank name or an empty verdict map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorValidation {
    #[serde(default)]
    pub supervisor_name: String,
    #[serde(default)]
    pub validated_checkboxes: BTreeMap<String, bool>,
    pub validated_at: DateTime<Utc>,
}

impl SupervisorValidation {
    pub fn new(
        supervisor_name: impl Into<String>,
        validated_checkboxes: BTreeMap<String, bool>,
        validated_at: DateTime<Utc>,
    ) -> Result<Self, IncompleteValidation> {
        let supervisor_name = supervisor_name.into().trim().to_string();
        if supervisor_name.is_empty() {
            return Err(IncompleteValidation::MissingSupervisorName);
        }
        if validated_checkboxes.is_empty() {
            return Err(IncompleteValidation::NoValidatedCheckboxes);
        }

        Ok(Self {
            supervisor_name,
            validated_checkboxes,
            validated_at,
        })
    }

    /// Share of supervisor verdicts that confirmed the worker's entry, as a percentage.
    pub fn success_percentage(&self) -> Option<f64> {
        if self.validated_checkboxes.is_empty() {
            return None;
        }
        let confirmed = self
            .validated_checkboxes
            .values()
            .filter(|confirmed| **confirmed)
            .count();
        Some(confirmed as f64 / self.validated_checkboxes.len() as f64 * 100.0)
    }
}

/// Reasons a supervisor sign-off cannot be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IncompleteValidation {
    #[error("supervisor name is required")]
    MissingSupervisorName,
    #[error("at least one validated checkbox is required")]
    NoValidatedCheckboxes,
}

/// Persisted checklist submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub id: SubmissionId,
    pub title: String,
    pub original_filename: String,
    pub submitted_at: DateTime<Utc>,
    pub headings: Vec<ChecklistHeading>,
    #[serde(default)]
    pub supervisor_validation: Option<SupervisorValidation>,
}

impl SubmissionRecord {
    pub fn tasks(&self) -> impl Iterator<Item = &ChecklistTask> {
        self.headings.iter().flat_map(|heading| heading.tasks.iter())
    }

    pub fn has_task(&self, task_id: &str) -> bool {
        self.tasks().any(|task| task.id == task_id)
    }

    /// Checked tasks over all tasks, as a percentage. `None` for a checklist with no tasks.
    pub fn completion_percentage(&self) -> Option<f64> {
        let (checked, total) = self.tasks().fold((0usize, 0usize), |(checked, total), task| {
            (checked + usize::from(task.checked), total + 1)
        });
        if total == 0 {
            None
        } else {
            Some(checked as f64 / total as f64 * 100.0)
        }
    }

    pub fn is_validated(&self) -> bool {
        super::validation::is_validated(self)
    }
}

/// Inbound payload posted by the checklist form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistSubmission {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub original_filename: String,
    #[serde(default)]
    pub headings: Vec<ChecklistHeading>,
}

/// Per-task verdict as posted by the supervisor validation page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedCheckbox {
    pub id: String,
    pub checked: bool,
}

/// Supervisor validation form body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    #[serde(default)]
    pub supervisor_name: String,
    #[serde(default)]
    pub validated_checkboxes: Vec<ValidatedCheckbox>,
}

impl ValidationRequest {
    /// Collapse the posted list into a task-id keyed map; a repeated id keeps its last verdict.
    pub fn checkbox_map(&self) -> BTreeMap<String, bool> {
        self.validated_checkboxes
            .iter()
            .map(|checkbox| (checkbox.id.clone(), checkbox.checked))
            .collect()
    }
}

/// Status payload used by the validation page to decide between the form and the
/// "already validated" notice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationStatusView {
    pub file_id: SubmissionId,
    pub title: String,
    pub is_validated: bool,
    pub supervisor_validation: Option<SupervisorValidation>,
}

impl From<&SubmissionRecord> for ValidationStatusView {
    fn from(record: &SubmissionRecord) -> Self {
        let is_validated = record.is_validated();
        Self {
            file_id: record.id.clone(),
            title: record.title.clone(),
            is_validated,
            supervisor_validation: if is_validated {
                record.supervisor_validation.clone()
            } else {
                None
            },
        }
    }
}

/// Payload backing the supervisor validation page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationPageView {
    pub file_id: SubmissionId,
    pub title: String,
    pub headings: Vec<ChecklistHeading>,
    pub is_already_validated: bool,
    pub supervisor_validation: Option<SupervisorValidation>,
}

impl From<&SubmissionRecord> for ValidationPageView {
    fn from(record: &SubmissionRecord) -> Self {
        let status = ValidationStatusView::from(record);
        Self {
            file_id: status.file_id,
            title: status.title,
            headings: record.headings.clone(),
            is_already_validated: status.is_validated,
            supervisor_validation: status.supervisor_validation,
        }
    }
}

/// Receipt returned once a submission is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub message: &'static str,
    pub id: SubmissionId,
}
