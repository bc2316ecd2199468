//! History persistence — the external recorder seam and its local
//! implementations, plus player identity.
//!
//! The engine hands completed entries to a [`HistoryRecorder`] and never
//! waits on the result: appends are fire-and-forget, failures stay behind
//! the seam (logged, then discarded), and ordering between writes is not
//! guaranteed.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use thiserror::Error;

use crate::schema::history::HistoryEntry;

#[derive(Debug, Error)]
enum RecorderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON serialization error: {0}")]
    RonSer(#[from] ron::Error),
    #[error("RON deserialization error: {0}")]
    RonDe(#[from] ron::error::SpannedError),
}

/// External history store, seen from the engine's side.
pub trait HistoryRecorder: Send {
    /// Dispatches an entry. Must not block the caller; errors are the
    /// implementation's problem.
    fn append(&self, entry: HistoryEntry);

    /// Previously appended entries for `user_id`, oldest first. Failures
    /// yield an empty list.
    fn load(&self, user_id: &str) -> Vec<HistoryEntry>;
}

/// Discards everything. The default recorder.
pub struct NullRecorder;

impl HistoryRecorder for NullRecorder {
    fn append(&self, _entry: HistoryEntry) {}

    fn load(&self, _user_id: &str) -> Vec<HistoryEntry> {
        Vec::new()
    }
}

/// Shared in-memory store for tests and demos. Clones share the same
/// backing storage.
#[derive(Clone, Default)]
pub struct MemoryRecorder {
    entries: Arc<Mutex<Vec<HistoryEntry>>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry appended so far, in arrival order.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HistoryRecorder for MemoryRecorder {
    fn append(&self, entry: HistoryEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }

    fn load(&self, user_id: &str) -> Vec<HistoryEntry> {
        let mut matching: Vec<HistoryEntry> = match self.entries.lock() {
            Ok(entries) => entries
                .iter()
                .filter(|entry| entry.user_id == user_id)
                .cloned()
                .collect(),
            Err(_) => Vec::new(),
        };
        matching.sort_by_key(|entry| entry.timestamp);
        matching
    }
}

/// Persists entries to a RON file from a detached worker thread, so
/// `choose()` never waits on the filesystem. A `load()` may race appends
/// still sitting in the spool; callers get whatever has been flushed.
pub struct SpooledFileRecorder {
    tx: Option<mpsc::Sender<HistoryEntry>>,
    worker: Option<thread::JoinHandle<()>>,
    path: PathBuf,
}

impl SpooledFileRecorder {
    pub fn create(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let (tx, rx) = mpsc::channel::<HistoryEntry>();
        let worker_path = path.clone();

        let worker = thread::spawn(move || {
            let mut entries = match read_entries(&worker_path) {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!(error = %err, path = %worker_path.display(),
                        "existing history unreadable; starting empty");
                    Vec::new()
                }
            };
            for entry in rx {
                entries.push(entry);
                if let Err(err) = write_entries(&worker_path, &entries) {
                    tracing::warn!(error = %err, path = %worker_path.display(),
                        "history append failed; entry kept in memory only");
                }
            }
        });

        Self {
            tx: Some(tx),
            worker: Some(worker),
            path,
        }
    }
}

impl HistoryRecorder for SpooledFileRecorder {
    fn append(&self, entry: HistoryEntry) {
        let sent = self
            .tx
            .as_ref()
            .map(|tx| tx.send(entry).is_ok())
            .unwrap_or(false);
        if !sent {
            tracing::warn!("history spool worker is gone; entry dropped");
        }
    }

    fn load(&self, user_id: &str) -> Vec<HistoryEntry> {
        let mut matching: Vec<HistoryEntry> = match read_entries(&self.path) {
            Ok(entries) => entries
                .into_iter()
                .filter(|entry| entry.user_id == user_id)
                .collect(),
            Err(err) => {
                tracing::warn!(error = %err, "history load failed");
                Vec::new()
            }
        };
        matching.sort_by_key(|entry| entry.timestamp);
        matching
    }
}

impl Drop for SpooledFileRecorder {
    fn drop(&mut self) {
        // Close the spool and let the worker drain what it already has.
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn read_entries(path: &Path) -> Result<Vec<HistoryEntry>, RecorderError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    Ok(ron::from_str(&contents)?)
}

fn write_entries(path: &Path, entries: &[HistoryEntry]) -> Result<(), RecorderError> {
    let encoded = ron::to_string(&entries)?;
    std::fs::write(path, encoded)?;
    Ok(())
}

/// A stable player identity for history attribution. When no external
/// identity is supplied, a locally generated random id keeps the engine
/// fully functional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerIdentity {
    user_id: String,
}

impl PlayerIdentity {
    pub fn from_user_id(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    /// A freshly generated anonymous identity.
    pub fn anonymous() -> Self {
        Self {
            user_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn make_entry(user_id: &str, choice: &str, seconds: i64) -> HistoryEntry {
        HistoryEntry {
            scene_text: "The clerk calls your case.".to_string(),
            choice_text: choice.to_string(),
            user_id: user_id.to_string(),
            app_id: "docket-test".to_string(),
            timestamp: Utc.timestamp_opt(seconds, 0).unwrap(),
        }
    }

    #[test]
    fn null_recorder_loads_nothing() {
        let recorder = NullRecorder;
        recorder.append(make_entry("u", "a", 0));
        assert!(recorder.load("u").is_empty());
    }

    #[test]
    fn memory_recorder_filters_by_user_and_sorts_by_timestamp() {
        let recorder = MemoryRecorder::new();
        recorder.append(make_entry("alice", "second", 200));
        recorder.append(make_entry("bob", "other", 50));
        recorder.append(make_entry("alice", "first", 100));

        let loaded = recorder.load("alice");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].choice_text, "first");
        assert_eq!(loaded[1].choice_text, "second");
    }

    #[test]
    fn memory_recorder_clones_share_storage() {
        let recorder = MemoryRecorder::new();
        let handle = recorder.clone();
        recorder.append(make_entry("alice", "a", 0));
        assert_eq!(handle.len(), 1);
    }

    #[test]
    fn spooled_recorder_round_trips_through_the_file() {
        let path = std::env::temp_dir().join(format!(
            "docket-history-{}.ron",
            uuid::Uuid::new_v4()
        ));

        {
            let recorder = SpooledFileRecorder::create(&path);
            recorder.append(make_entry("alice", "later", 300));
            recorder.append(make_entry("alice", "earlier", 100));
            // Dropping joins the worker, so the spool is flushed.
        }

        let reopened = SpooledFileRecorder::create(&path);
        let loaded = reopened.load("alice");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].choice_text, "earlier");
        assert_eq!(loaded[1].choice_text, "later");
        drop(reopened);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn spooled_recorder_load_survives_missing_file() {
        let path = std::env::temp_dir().join(format!(
            "docket-missing-{}.ron",
            uuid::Uuid::new_v4()
        ));
        let recorder = SpooledFileRecorder::create(&path);
        assert!(recorder.load("nobody").is_empty());
    }

    #[test]
    fn anonymous_identities_are_distinct() {
        assert_ne!(PlayerIdentity::anonymous(), PlayerIdentity::anonymous());
        let fixed = PlayerIdentity::from_user_id("external-123");
        assert_eq!(fixed.user_id(), "external-123");
    }
}
