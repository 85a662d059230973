//! Compression Queue Manager for OmniDownloader.
//!
//! Tracks local files through the compressor and exports the results one by
//! one or as a single archive.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::archiver::{Archiver, BuildGuard};
use crate::services::compression_engine::{compress, is_image};
use crate::services::naming::{compressed_archive_name, compressed_output_name, now_millis};
use crate::services::save_target::SaveTarget;
use crate::types::compression::{
    CompressedFile, CompressionParams, CompressionReport, CompressionStatus, SourceFile,
};
use crate::types::errors::CompressionError;
use crate::types::media::{ArchiveReport, ItemFailure};

fn output_name(source: &SourceFile) -> String {
    compressed_output_name(&source.name, is_image(source))
}

/// Ordered list of files queued for compression.
pub struct CompressionQueueManager {
    items: Mutex<Vec<CompressedFile>>,
    archiving: AtomicBool,
    deflate_archives: bool,
}

impl CompressionQueueManager {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            archiving: AtomicBool::new(false),
            deflate_archives: true,
        }
    }

    pub fn with_deflate_archives(mut self, deflate: bool) -> Self {
        self.deflate_archives = deflate;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CompressedFile>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update<F: FnOnce(&mut CompressedFile)>(&self, id: &str, f: F) {
        if let Some(item) = self.lock().iter_mut().find(|i| i.id == id) {
            f(item);
        }
    }

    pub fn items(&self) -> Vec<CompressedFile> {
        self.lock().clone()
    }

    pub fn get(&self, id: &str) -> Option<CompressedFile> {
        self.lock().iter().find(|i| i.id == id).cloned()
    }

    pub fn completed_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|i| i.status == CompressionStatus::Completed)
            .count()
    }

    pub fn is_archiving(&self) -> bool {
        self.archiving.load(Ordering::Acquire)
    }

    /// Queues `files` ahead of existing entries and compresses them one at a
    /// time. A failing file is marked Error and the rest still run.
    pub fn add_files(&self, files: Vec<SourceFile>, params: CompressionParams) -> CompressionReport {
        self.add_entries(files.into_iter().map(|f| (f, None)).collect(), params)
    }

    /// Reads each path from disk and queues it like [`add_files`](Self::add_files).
    /// The path is kept as the entry's preview reference.
    ///
    /// # Errors
    /// Returns `CompressionError::Io` if any path cannot be read; nothing is
    /// queued in that case.
    pub fn add_paths<P: AsRef<Path>>(
        &self,
        paths: &[P],
        params: CompressionParams,
    ) -> Result<CompressionReport, CompressionError> {
        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let bytes = std::fs::read(path)
                .map_err(|e| CompressionError::Io(format!("{}: {}", path.display(), e)))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            entries.push((SourceFile::new(name, bytes), Some(path.to_path_buf())));
        }
        Ok(self.add_entries(entries, params))
    }

    fn add_entries(
        &self,
        entries: Vec<(SourceFile, Option<PathBuf>)>,
        params: CompressionParams,
    ) -> CompressionReport {
        let new_items: Vec<CompressedFile> = entries
            .into_iter()
            .map(|(source, preview)| CompressedFile {
                id: Uuid::new_v4().to_string(),
                original_size: source.bytes.len() as u64,
                source,
                compressed: None,
                compressed_size: None,
                status: CompressionStatus::Pending,
                progress: 0,
                error: None,
                preview,
            })
            .collect();
        let ids: Vec<String> = new_items.iter().map(|i| i.id.clone()).collect();
        self.lock().splice(0..0, new_items);

        let mut report = CompressionReport::default();
        for id in ids {
            let Some(source) = self.get(&id).map(|i| i.source) else {
                continue;
            };
            self.update(&id, |item| item.status = CompressionStatus::Processing);

            match compress(&source, params) {
                Ok(output) => {
                    debug!(
                        name = source.name.as_str(),
                        before = source.bytes.len(),
                        after = output.bytes.len(),
                        "compressed file"
                    );
                    self.update(&id, |item| {
                        item.compressed_size = Some(output.bytes.len() as u64);
                        item.compressed = Some(output.bytes);
                        item.status = CompressionStatus::Completed;
                        item.progress = 100;
                    });
                    report.completed.push(id);
                }
                Err(err) => {
                    warn!(name = source.name.as_str(), error = %err, "compression failed");
                    let message = err.to_string();
                    self.update(&id, |item| {
                        item.status = CompressionStatus::Error;
                        item.error = Some(message.clone());
                    });
                    report.failures.push(ItemFailure {
                        id,
                        name: source.name,
                        message,
                    });
                }
            }
        }

        info!(
            completed = report.completed.len(),
            failures = report.failures.len(),
            "compression batch finished"
        );
        report
    }

    pub fn remove(&self, id: &str) -> Result<CompressedFile, CompressionError> {
        let mut items = self.lock();
        let idx = items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| CompressionError::NotFound(id.to_string()))?;
        Ok(items.remove(idx))
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Saves one compressed output. Images are named `<base>.jpg`, other
    /// files keep their name.
    pub fn download_one(&self, id: &str, target: &dyn SaveTarget) -> Result<PathBuf, CompressionError> {
        let (name, bytes) = {
            let items = self.lock();
            let item = items
                .iter()
                .find(|i| i.id == id)
                .ok_or_else(|| CompressionError::NotFound(id.to_string()))?;
            let bytes = match (&item.status, &item.compressed) {
                (CompressionStatus::Completed, Some(bytes)) => bytes.clone(),
                _ => return Err(CompressionError::NotCompleted(id.to_string())),
            };
            (output_name(&item.source), bytes)
        };
        Ok(target.save(&bytes, &name)?)
    }

    /// Bundles every Completed entry into `Compressed_Batch_<millis>.zip`.
    ///
    /// Returns `Ok(None)` when a build is already in flight or nothing has
    /// completed.
    pub fn download_all_as_archive(
        &self,
        target: &dyn SaveTarget,
    ) -> Result<Option<ArchiveReport>, CompressionError> {
        let Some(_guard) = BuildGuard::acquire(&self.archiving) else {
            debug!("compressed archive build already running");
            return Ok(None);
        };

        let mut archiver = Archiver::new().with_deflate(self.deflate_archives);
        for item in self.lock().iter() {
            if let (CompressionStatus::Completed, Some(bytes)) = (&item.status, &item.compressed) {
                archiver.add(output_name(&item.source), bytes.clone());
            }
        }
        if archiver.is_empty() {
            return Ok(None);
        }

        let archive_name = compressed_archive_name(now_millis());
        let entries = archiver.names();
        let bytes = archiver.finish()?;
        let saved_path = target.save(&bytes, &archive_name)?;
        info!(archive = archive_name.as_str(), entries = entries.len(), "compressed archive saved");

        Ok(Some(ArchiveReport {
            archive_name,
            saved_path: Some(saved_path),
            entries,
            failures: Vec::new(),
        }))
    }
}

impl Default for CompressionQueueManager {
    fn default() -> Self {
        Self::new()
    }
}
