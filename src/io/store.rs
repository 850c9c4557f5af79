use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::model::chat::ChatMessage;
use crate::model::config::Theme;
use crate::model::task::Task;
use crate::model::template::Template;

/// Storage keys. Each key maps to one JSON document in the data directory.
pub const TASKS_KEY: &str = "tasks";
pub const TEMPLATES_KEY: &str = "templates";
pub const THEME_KEY: &str = "theme";
pub const CHAT_HISTORY_KEY: &str = "chat_history";
pub const SESSION_KEY: &str = "session";
pub const UNDO_KEY: &str = "undo";

/// Error type for store operations that callers do surface (directory setup)
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not create data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("no data directory available (set --data-dir or TASKPAD_DATA)")]
    NoDataDir,
}

/// Key-value JSON store over flat files in the data directory.
///
/// Reads degrade to `None` on a missing or corrupt document and writes are
/// skipped on failure; both are logged. The in-memory state stays the source
/// of truth for the rest of the session either way.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Open (and create if needed) a store rooted at the given directory.
    pub fn open(dir: &Path) -> Result<Store, StoreError> {
        fs::create_dir_all(dir).map_err(|e| StoreError::CreateDir {
            path: dir.to_path_buf(),
            source: e,
        })?;
        Ok(Store {
            dir: dir.to_path_buf(),
        })
    }

    /// Resolve the default data directory: `$TASKPAD_DATA` if set, else the
    /// platform data dir for "taskpad".
    pub fn default_dir() -> Result<PathBuf, StoreError> {
        if let Ok(dir) = std::env::var("TASKPAD_DATA")
            && !dir.is_empty()
        {
            return Ok(PathBuf::from(dir));
        }
        directories::ProjectDirs::from("", "", "taskpad")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or(StoreError::NoDataDir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Read and deserialize the document under `key`.
    /// Missing file or corrupt JSON both read as `None`.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.key_path(key);
        let text = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "corrupt document in store, treating as empty");
                None
            }
        }
    }

    /// Serialize and write the document under `key`, atomically
    /// (temp file in the same directory, then rename).
    /// Failures are logged and the write is skipped.
    pub fn write<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_write(key, value) {
            tracing::warn!(key, error = %e, "store write skipped");
        }
    }

    fn try_write<T: Serialize>(&self, key: &str, value: &T) -> std::io::Result<()> {
        let text = serde_json::to_string_pretty(value)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(text.as_bytes())?;
        tmp.persist(self.key_path(key)).map_err(|e| e.error)?;
        Ok(())
    }

    /// Remove the document under `key`, ignoring a missing file.
    pub fn remove(&self, key: &str) {
        let path = self.key_path(key);
        if let Err(e) = fs::remove_file(&path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(key, error = %e, "store remove skipped");
        }
    }

    // --- Typed accessors for the well-known keys ---

    pub fn load_tasks(&self) -> Option<Vec<Task>> {
        self.read(TASKS_KEY)
    }

    pub fn save_tasks(&self, tasks: &[Task]) {
        self.write(TASKS_KEY, &tasks);
    }

    pub fn load_templates(&self) -> Vec<Template> {
        self.read(TEMPLATES_KEY).unwrap_or_default()
    }

    pub fn save_templates(&self, templates: &[Template]) {
        self.write(TEMPLATES_KEY, &templates);
    }

    pub fn theme(&self) -> Theme {
        self.read(THEME_KEY).unwrap_or_default()
    }

    pub fn set_theme(&self, theme: Theme) {
        self.write(THEME_KEY, &theme);
    }

    pub fn load_chat_history(&self) -> Vec<ChatMessage> {
        self.read(CHAT_HISTORY_KEY).unwrap_or_default()
    }

    pub fn save_chat_history(&self, history: &[ChatMessage]) {
        self.write(CHAT_HISTORY_KEY, &history);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Status;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn read_missing_key_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        assert!(store.load_tasks().is_none());
        assert!(store.load_templates().is_empty());
    }

    #[test]
    fn read_corrupt_document_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        fs::write(dir.path().join("tasks.json"), "not json {{{").unwrap();
        assert!(store.load_tasks().is_none());
    }

    #[test]
    fn tasks_round_trip_losslessly() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let mut task = Task::new(1, "Persist me".into());
        task.status = Status::Completed;
        task.completed_at = Some(chrono::Local::now());
        let tasks = vec![task, Task::new(2, "And me".into())];

        store.save_tasks(&tasks);
        let loaded = store.load_tasks().unwrap();
        assert_eq!(loaded, tasks);
    }

    #[test]
    fn theme_defaults_to_light_and_persists() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        assert_eq!(store.theme(), Theme::Light);

        store.set_theme(Theme::Dark);
        assert_eq!(store.theme(), Theme::Dark);

        // Persisted representation is the bare string literal
        let raw = fs::read_to_string(dir.path().join("theme.json")).unwrap();
        assert_eq!(raw.trim(), r#""dark""#);
    }

    #[test]
    fn remove_missing_key_is_silent() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        store.remove(SESSION_KEY);
    }
}
