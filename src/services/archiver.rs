//! ZIP packaging of in-memory buffers.

use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::types::errors::ArchiveError;

/// Collects named buffers and writes them into a single ZIP.
///
/// Adding a name that is already present replaces the earlier bytes but keeps
/// the entry at its first position.
#[derive(Debug)]
pub struct Archiver {
    entries: Vec<(String, Vec<u8>)>,
    deflate: bool,
}

impl Archiver {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            deflate: true,
        }
    }

    /// Stores entries uncompressed when `deflate` is false.
    pub fn with_deflate(mut self, deflate: bool) -> Self {
        self.deflate = deflate;
        self
    }

    pub fn add(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = bytes,
            None => self.entries.push((name, bytes)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Writes every entry in insertion order and returns the archive bytes.
    pub fn finish(self) -> Result<Vec<u8>, ArchiveError> {
        let method = if self.deflate {
            CompressionMethod::Deflated
        } else {
            CompressionMethod::Stored
        };
        let options = FileOptions::default()
            .compression_method(method)
            .large_file(self.entries.iter().any(|(_, b)| b.len() as u64 >= u32::MAX as u64));

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in &self.entries {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(bytes)?;
        }
        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

impl Default for Archiver {
    fn default() -> Self {
        Self::new()
    }
}

/// Marks an archive build as in flight; the flag is released on drop.
pub struct BuildGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BuildGuard<'a> {
    /// Returns `None` when a build is already running.
    pub fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
