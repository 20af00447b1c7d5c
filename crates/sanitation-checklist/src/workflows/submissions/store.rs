use super::domain::{SubmissionId, SubmissionRecord};
use super::validation::{is_validated, AlreadyValidated, ValidationRejection};

/// Mutation applied by [`SubmissionStore::update`]. It receives the current record and returns
/// its replacement.
pub type SubmissionMutator<'a> =
    dyn Fn(&SubmissionRecord) -> Result<SubmissionRecord, ValidationRejection> + 'a;

/// Storage abstraction for checklist submissions.
///
/// `update` must run the mutator and the write under one exclusive section, and must refuse to
/// replace a record that is already validated. Implementations enforce that with
/// [`guard_replacement`].
pub trait SubmissionStore: Send + Sync {
    fn put(&self, record: SubmissionRecord) -> Result<SubmissionRecord, StoreError>;
    fn get(&self, id: &SubmissionId) -> Result<SubmissionRecord, StoreError>;
    fn list_all(&self) -> Result<SubmissionSnapshot, StoreError>;
    fn update(
        &self,
        id: &SubmissionId,
        mutator: &SubmissionMutator<'_>,
    ) -> Result<SubmissionRecord, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("submission {0} not found")]
    NotFound(SubmissionId),
    #[error("submission {0} already exists")]
    DuplicateId(SubmissionId),
    #[error(transparent)]
    AlreadyValidated(AlreadyValidated),
    #[error("validation rejected: {0}")]
    Rejected(ValidationRejection),
    #[error("submission store unavailable: {0}")]
    Unavailable(String),
}

impl From<ValidationRejection> for StoreError {
    fn from(value: ValidationRejection) -> Self {
        match value {
            ValidationRejection::AlreadyValidated(existing) => Self::AlreadyValidated(existing),
            other => Self::Rejected(other),
        }
    }
}

/// Run `mutator` against `current` and check the result may be written in its place.
pub(crate) fn guard_replacement(
    current: &SubmissionRecord,
    mutator: &SubmissionMutator<'_>,
) -> Result<SubmissionRecord, StoreError> {
    if let (true, Some(existing)) = (is_validated(current), &current.supervisor_validation) {
        return Err(StoreError::AlreadyValidated(AlreadyValidated {
            supervisor_name: existing.supervisor_name.clone(),
            validated_at: existing.validated_at,
        }));
    }

    let mut next = mutator(current)?;
    // Identity and intake data never change after creation.
    next.id = current.id.clone();
    next.submitted_at = current.submitted_at;
    Ok(next)
}

/// Point-in-time copy of every stored record, ordered by id. Iterate it as often as needed.
#[derive(Debug, Clone, Default)]
pub struct SubmissionSnapshot {
    records: Vec<SubmissionRecord>,
}

impl SubmissionSnapshot {
    pub fn new(mut records: Vec<SubmissionRecord>) -> Self {
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Self { records }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SubmissionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a SubmissionSnapshot {
    type Item = &'a SubmissionRecord;
    type IntoIter = std::slice::Iter<'a, SubmissionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for SubmissionSnapshot {
    type Item = SubmissionRecord;
    type IntoIter = std::vec::IntoIter<SubmissionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
