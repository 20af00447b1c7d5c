use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::domain::{SubmissionId, SubmissionRecord};
use super::store::{
    guard_replacement, StoreError, SubmissionMutator, SubmissionSnapshot, SubmissionStore,
};

const FILE_PREFIX: &str = "data_";
const FILE_SUFFIX: &str = ".json";

/// Stores each submission as `data_<id>.json` inside a data directory.
///
/// Writes are serialized through one lock per store instance, so a single process never
/// interleaves a validation check with another writer. Sharing a directory between processes
/// is not coordinated.
#[derive(Debug)]
pub struct FileSubmissionStore {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSubmissionStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, id: &SubmissionId) -> Result<PathBuf, StoreError> {
        let valid = !id.0.is_empty()
            && id
                .0
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !valid {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(self
            .data_dir
            .join(format!("{FILE_PREFIX}{}{FILE_SUFFIX}", id.0)))
    }

    fn read_record(&self, id: &SubmissionId, path: &Path) -> Result<SubmissionRecord, StoreError> {
        let raw = fs::read_to_string(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(id.clone()),
            _ => unavailable("read", path, err),
        })?;
        serde_json::from_str(&raw).map_err(|err| unavailable("parse", path, err))
    }

    fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir).map_err(|err| unavailable("create", &self.data_dir, err))
    }
}

impl SubmissionStore for FileSubmissionStore {
    fn put(&self, record: SubmissionRecord) -> Result<SubmissionRecord, StoreError> {
        let path = self.path_for(&record.id)?;
        let payload = serde_json::to_vec_pretty(&record)
            .map_err(|err| unavailable("serialize", &path, err))?;

        let _guard = lock(&self.write_lock)?;
        self.ensure_dir()?;
        if path.exists() {
            return Err(StoreError::DuplicateId(record.id));
        }
        write_replacing(&path, &payload)?;

        tracing::debug!(submission_id = %record.id, path = %path.display(), "submission file written");
        Ok(record)
    }

    fn get(&self, id: &SubmissionId) -> Result<SubmissionRecord, StoreError> {
        let path = self.path_for(id)?;
        self.read_record(id, &path)
    }

    fn list_all(&self) -> Result<SubmissionSnapshot, StoreError> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(SubmissionSnapshot::default())
            }
            Err(err) => return Err(unavailable("list", &self.data_dir, err)),
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| unavailable("list", &self.data_dir, err))?;
            let file_name = entry.file_name();
            let Some(id) = file_name
                .to_str()
                .and_then(|name| name.strip_prefix(FILE_PREFIX))
                .and_then(|name| name.strip_suffix(FILE_SUFFIX))
            else {
                continue;
            };
            let id = SubmissionId::from(id);
            records.push(self.read_record(&id, &entry.path())?);
        }

        Ok(SubmissionSnapshot::new(records))
    }

    fn update(
        &self,
        id: &SubmissionId,
        mutator: &SubmissionMutator<'_>,
    ) -> Result<SubmissionRecord, StoreError> {
        let path = self.path_for(id)?;
        let _guard = lock(&self.write_lock)?;

        let current = self.read_record(id, &path)?;
        let next = guard_replacement(&current, mutator)?;
        let payload =
            serde_json::to_vec_pretty(&next).map_err(|err| unavailable("serialize", &path, err))?;

        write_replacing(&path, &payload)?;

        Ok(next)
    }
}

/// Readers only ever see a complete file: write a sibling staging file, then rename it over
/// the target.
fn write_replacing(path: &Path, payload: &[u8]) -> Result<(), StoreError> {
    let staging = path.with_extension("json.tmp");
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&staging)
        .map_err(|err| unavailable("create", &staging, err))?;
    file.write_all(payload)
        .and_then(|()| file.sync_all())
        .map_err(|err| unavailable("write", &staging, err))?;
    fs::rename(&staging, path).map_err(|err| unavailable("replace", path, err))
}

fn lock(mutex: &Mutex<()>) -> Result<std::sync::MutexGuard<'_, ()>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("submission file lock poisoned".to_string()))
}

fn unavailable(action: &str, path: &Path, err: impl std::fmt::Display) -> StoreError {
    tracing::error!(path = %path.display(), error = %err, "failed to {action} submission file");
    StoreError::Unavailable(format!("failed to {action} {}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::submissions::domain::ChecklistHeading;
    use chrono::{TimeZone, Utc};

    fn record(id: &str) -> SubmissionRecord {
        SubmissionRecord {
            id: SubmissionId::from(id),
            title: "Restroom Sanitation".to_string(),
            original_filename: "restrooms.html".to_string(),
            submitted_at: Utc.with_ymd_and_hms(2025, 6, 2, 7, 15, 0).unwrap(),
            headings: vec![ChecklistHeading {
                heading: "Fixtures".to_string(),
                tasks: Vec::new(),
            }],
            supervisor_validation: None,
        }
    }

    #[test]
    fn writes_one_json_file_per_submission() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSubmissionStore::new(dir.path().join("data"));

        store.put(record("abc123")).expect("put succeeds");

        let path = dir.path().join("data").join("data_abc123.json");
        let raw = fs::read_to_string(path).expect("file exists");
        assert!(raw.contains("\"originalFilename\": \"restrooms.html\""));
        assert_eq!(store.get(&SubmissionId::from("abc123")).unwrap(), record("abc123"));
    }

    #[test]
    fn put_reports_duplicate_ids() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSubmissionStore::new(dir.path());

        store.put(record("abc123")).expect("first put");
        match store.put(record("abc123")) {
            Err(StoreError::DuplicateId(id)) => assert_eq!(id.as_str(), "abc123"),
            other => panic!("expected duplicate id, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_put_leaves_existing_file_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSubmissionStore::new(dir.path());
        store.put(record("abc123")).expect("first put");
        let path = dir.path().join("data_abc123.json");
        let before = fs::read_to_string(&path).unwrap();

        let mut replacement = record("abc123");
        replacement.title = "Overwritten".to_string();
        assert!(matches!(
            store.put(replacement),
            Err(StoreError::DuplicateId(_))
        ));

        assert_eq!(fs::read_to_string(&path).unwrap(), before);
        assert!(!dir.path().join("data_abc123.json.tmp").exists());
    }

    #[test]
    fn rejects_ids_that_escape_the_data_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSubmissionStore::new(dir.path());

        assert!(matches!(
            store.get(&SubmissionId::from("../secrets")),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn list_all_ignores_unrelated_files_and_missing_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSubmissionStore::new(dir.path().join("missing"));
        assert!(store.list_all().expect("empty listing").is_empty());

        let store = FileSubmissionStore::new(dir.path());
        store.put(record("b")).unwrap();
        store.put(record("a")).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let ids: Vec<_> = store
            .list_all()
            .unwrap()
            .iter()
            .map(|record| record.id.0.clone())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn corrupt_files_surface_as_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("data_bad.json"), "{ not json").unwrap();
        let store = FileSubmissionStore::new(dir.path());

        assert!(matches!(
            store.get(&SubmissionId::from("bad")),
            Err(StoreError::Unavailable(_))
        ));
    }
}
