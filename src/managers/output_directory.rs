//! Output Directory for OmniDownloader.
//!
//! Remembers the directory the user picked for saved files. The choice lives
//! in a single-slot key-value store; any store failure is logged and the
//! feature simply behaves as if nothing was saved.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, OptionalExtension};
use tracing::warn;

use crate::database::connection::Database;
use crate::types::errors::StoreError;

/// Fixed key of the saved directory slot.
pub const HANDLE_KEY: &str = "dir_handle";

/// Trait defining the persisted directory slot.
pub trait HandleStore: Send + Sync {
    fn get(&self) -> Result<Option<String>, StoreError>;
    fn put(&self, value: &str) -> Result<(), StoreError>;
    fn delete(&self) -> Result<(), StoreError>;
}

/// Directory slot backed by the `settings` table.
pub struct SqliteHandleStore {
    db: Arc<Database>,
}

impl SqliteHandleStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl HandleStore for SqliteHandleStore {
    fn get(&self) -> Result<Option<String>, StoreError> {
        let value = self
            .db
            .connection()
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![HANDLE_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, value: &str) -> Result<(), StoreError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        self.db.connection().execute(
            "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![HANDLE_KEY, value, now],
        )?;
        Ok(())
    }

    fn delete(&self) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute("DELETE FROM settings WHERE key = ?1", params![HANDLE_KEY])?;
        Ok(())
    }
}

/// Saved output directory with graceful degradation.
pub struct OutputDirectory {
    store: Box<dyn HandleStore>,
    current: Option<PathBuf>,
}

impl OutputDirectory {
    /// Loads the saved directory. A store failure or a stale path leaves the
    /// directory unset.
    pub fn load(store: Box<dyn HandleStore>) -> Self {
        let current = match store.get() {
            Ok(Some(raw)) => {
                let path = PathBuf::from(raw);
                if path.is_dir() {
                    Some(path)
                } else {
                    warn!(path = %path.display(), "saved output directory no longer exists");
                    None
                }
            }
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "failed to load saved output directory");
                None
            }
        };
        Self { store, current }
    }

    pub fn current(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    /// Selects `dir` for future saves. The selection holds for this session
    /// even if persisting it fails.
    pub fn choose(&mut self, dir: impl Into<PathBuf>) -> Result<(), StoreError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(StoreError::InvalidDirectory(dir.display().to_string()));
        }
        if let Err(err) = self.store.put(&dir.to_string_lossy()) {
            warn!(error = %err, "failed to persist output directory");
        }
        self.current = Some(dir);
        Ok(())
    }

    /// Forgets the saved directory.
    pub fn forget(&mut self) {
        if let Err(err) = self.store.delete() {
            warn!(error = %err, "failed to clear saved output directory");
        }
        self.current = None;
    }
}
