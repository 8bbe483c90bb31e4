//! JSON file learning store
//!
//! Layout: `{"profiles": {"<name>": {"bias": f, "samples": n, "timeouts": n}}}`.
//! The whole file is rewritten (temp file, then rename) after every update,
//! while the store lock is held. A missing or corrupt file starts an empty
//! store. Separate processes writing the same file race: last writer wins.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};

use super::{LearningBook, LearningError, LearningSample, LearningState, LearningStore};

/// File-backed learning store.
#[derive(Debug)]
pub struct JsonFileLearningStore {
    path: PathBuf,
    book: Mutex<LearningBook>,
}

impl JsonFileLearningStore {
    /// Open the store at `path`.
    ///
    /// Never fails: an unreadable file is treated as an empty store and is
    /// overwritten by the next update.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let book = load_book(&path).unwrap_or_default();
        info!(
            path = %path.display(),
            profiles = book.profiles.len(),
            "Learning store opened"
        );
        Self {
            path,
            book: Mutex::new(book),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, book: &LearningBook) -> Result<(), LearningError> {
        save_book(book, &self.path)
    }
}

impl LearningStore for JsonFileLearningStore {
    fn bias(&self, profile: &str) -> f64 {
        self.book
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .bias(profile)
    }

    fn state(&self, profile: &str) -> Option<LearningState> {
        self.book
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .profiles
            .get(profile)
            .copied()
    }

    fn update(&self, profile: &str, sample: &LearningSample) -> Result<LearningState, LearningError> {
        let mut book = self.book.lock().unwrap_or_else(PoisonError::into_inner);
        let state = book.record(profile, sample);
        self.persist(&book)?;
        debug!(
            profile,
            bias = state.bias,
            samples = state.samples,
            timeouts = state.timeouts,
            "Learning state persisted"
        );
        Ok(state)
    }

    fn reset(&self, profile: &str) -> Result<bool, LearningError> {
        let mut book = self.book.lock().unwrap_or_else(PoisonError::into_inner);
        let existed = book.profiles.remove(profile).is_some();
        if existed {
            self.persist(&book)?;
        }
        Ok(existed)
    }

    fn snapshot(&self) -> LearningBook {
        self.book
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn backend_name(&self) -> &'static str {
        "JsonFile"
    }
}

/// Read a learning book from disk.
///
/// Returns `None` when the file is missing or corrupt.
pub fn load_book(path: &Path) -> Option<LearningBook> {
    let json = match std::fs::read_to_string(path) {
        Ok(j) => j,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No learning state file found");
            return None;
        }
    };
    match serde_json::from_str::<LearningBook>(&json) {
        Ok(mut book) => {
            book.normalize();
            Some(book)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Corrupt learning state file, starting fresh");
            None
        }
    }
}

/// Write a learning book to disk atomically (write temp file, then rename).
pub fn save_book(book: &LearningBook, path: &Path) -> Result<(), LearningError> {
    let json = serde_json::to_vec_pretty(book)?;

    let tmp_path = path.with_extension("json.tmp");
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&tmp_path, &json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = tempdir().unwrap();
        let store = JsonFileLearningStore::open(dir.path().join("learning.json"));
        assert_eq!(store.bias("ci"), 1.0);
        assert!(store.snapshot().profiles.is_empty());
    }

    #[test]
    fn test_corrupt_file_resets_to_unit_bias() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("learning.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileLearningStore::open(&path);
        assert_eq!(store.bias("rpa"), 1.0);
        assert_eq!(store.bias("auto"), 1.0);
    }

    #[test]
    fn test_update_rewrites_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("learning.json");
        let store = JsonFileLearningStore::open(&path);

        store.update("ci", &LearningSample::success(1.0, 2.0)).unwrap();

        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["profiles"]["ci"]["bias"], 1.1);
        assert_eq!(on_disk["profiles"]["ci"]["samples"], 1);
        assert_eq!(on_disk["profiles"]["ci"]["timeouts"], 0);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_reopen_restores_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("learning.json");
        {
            let store = JsonFileLearningStore::open(&path);
            store.update("rpa", &LearningSample::failure(1.0, 1.0)).unwrap();
            store.update("testing", &LearningSample::success(2.0, 1.0)).unwrap();
        }
        let reopened = JsonFileLearningStore::open(&path);
        assert_eq!(reopened.bias("rpa"), 1.05);
        assert_eq!(reopened.state("rpa").unwrap().timeouts, 1);
        assert_eq!(reopened.bias("testing"), 0.95);
    }

    #[test]
    fn test_reopened_snapshot_matches_live_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("learning.json");
        let store = JsonFileLearningStore::open(&path);
        store.update("ci", &LearningSample::success(1.0, 2.0)).unwrap();
        store.update("ci", &LearningSample::failure(0.3, 0.7)).unwrap();
        store.update("rpa", &LearningSample::success(2.0, 1.3)).unwrap();
        store.update("safe", &LearningSample::success(0.0, 4.0)).unwrap();
        store.update("rpa", &LearningSample::failure(0.125, 0.5)).unwrap();

        assert_eq!(store.snapshot(), JsonFileLearningStore::open(&path).snapshot());
    }

    #[test]
    fn test_out_of_range_bias_clamped_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("learning.json");
        std::fs::write(
            &path,
            r#"{"profiles":{"ci":{"bias":100.0,"samples":1,"timeouts":0},"rpa":{"bias":-3.0,"samples":2,"timeouts":1}}}"#,
        )
        .unwrap();

        let store = JsonFileLearningStore::open(&path);
        assert_eq!(store.bias("ci"), 2.5);
        assert_eq!(store.bias("rpa"), 0.5);
        assert_eq!(store.state("rpa").unwrap().timeouts, 1);

        // the next update starts from the clamped value
        let state = store.update("ci", &LearningSample::success(1.0, 1.0)).unwrap();
        assert_eq!(state.bias, 2.35);
    }

    #[test]
    fn test_reset_persists_removal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("learning.json");
        let store = JsonFileLearningStore::open(&path);
        store.update("ci", &LearningSample::success(1.0, 1.0)).unwrap();
        assert!(store.reset("ci").unwrap());

        let book = load_book(&path).unwrap();
        assert!(book.profiles.is_empty());
    }
}
