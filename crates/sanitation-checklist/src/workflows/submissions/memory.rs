use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{SubmissionId, SubmissionRecord};
use super::store::{
    guard_replacement, StoreError, SubmissionMutator, SubmissionSnapshot, SubmissionStore,
};

/// Process-local store, used by tests and by `APP_STORAGE=memory`.
#[derive(Default, Clone)]
pub struct InMemorySubmissionStore {
    records: Arc<Mutex<HashMap<SubmissionId, SubmissionRecord>>>,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SubmissionId, SubmissionRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("submission store mutex poisoned".to_string()))
    }
}

impl SubmissionStore for InMemorySubmissionStore {
    fn put(&self, record: SubmissionRecord) -> Result<SubmissionRecord, StoreError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&record.id) {
            return Err(StoreError::DuplicateId(record.id));
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn get(&self, id: &SubmissionId) -> Result<SubmissionRecord, StoreError> {
        let guard = self.lock()?;
        guard
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn list_all(&self) -> Result<SubmissionSnapshot, StoreError> {
        let guard = self.lock()?;
        Ok(SubmissionSnapshot::new(guard.values().cloned().collect()))
    }

    fn update(
        &self,
        id: &SubmissionId,
        mutator: &SubmissionMutator<'_>,
    ) -> Result<SubmissionRecord, StoreError> {
        let mut guard = self.lock()?;
        let current = guard
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let next = guard_replacement(current, mutator)?;
        guard.insert(id.clone(), next.clone());
        Ok(next)
    }
}
