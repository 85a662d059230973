//! Save boundary: where finished files and archives are handed off.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::types::errors::SaveError;

/// Trait defining the final hand-off of bytes under a filename.
pub trait SaveTarget: Send + Sync {
    fn save(&self, bytes: &[u8], filename: &str) -> Result<PathBuf, SaveError>;
}

/// Replaces path separators and control characters so a name stays inside
/// the target directory.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "." | ".." => String::new(),
        _ => cleaned,
    }
}

/// Writes files into a directory, creating it on first use. Existing files
/// with the same name are overwritten.
#[derive(Debug, Clone)]
pub struct DirectorySaveTarget {
    dir: PathBuf,
}

impl DirectorySaveTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SaveTarget for DirectorySaveTarget {
    fn save(&self, bytes: &[u8], filename: &str) -> Result<PathBuf, SaveError> {
        let name = sanitize_filename(filename);
        if name.is_empty() {
            return Err(SaveError::InvalidFilename(filename.to_string()));
        }

        fs::create_dir_all(&self.dir)
            .map_err(|e| SaveError::IoError(format!("Failed to create {}: {}", self.dir.display(), e)))?;

        let path = self.dir.join(&name);
        fs::write(&path, bytes)
            .map_err(|e| SaveError::IoError(format!("Failed to write {}: {}", path.display(), e)))?;

        info!(path = %path.display(), bytes = bytes.len(), "saved file");
        Ok(path)
    }
}
