//! Download Queue Manager for OmniDownloader.
//!
//! Owns the ordered list of queued URLs and is the only place that mutates
//! them: enqueue and classification, bulk renaming, single downloads and the
//! batch archive. Work is strictly sequential; the item list is locked only
//! for short synchronous updates, never across an await.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::archiver::{Archiver, BuildGuard};
use crate::services::classifier::{resolve_analysis, Classifier};
use crate::services::fetch_engine::{FetchProgress, FetchedMedia, Fetcher};
use crate::services::naming::{download_archive_name, download_filename, now_millis, split_extension};
use crate::services::save_target::SaveTarget;
use crate::types::errors::{FetchError, QueueError};
use crate::types::media::{ArchiveReport, DownloadStatus, ItemFailure, MediaItem, MediaType};

/// Filename shown while an item waits for classification.
pub const ANALYZING_PLACEHOLDER: &str = "Analyzing...";
/// Message attached to items whose fetch failed during a batch archive.
pub const ARCHIVE_FETCH_FAILED: &str = "fetch failed";

/// Splits raw user input into fetchable URLs.
///
/// Tokens are whitespace separated. A bare host-looking token (no scheme,
/// contains a dot) gets `https://` prepended; anything that then does not
/// start with `http` is dropped.
pub fn normalize_url_input(input: &str) -> Vec<String> {
    input
        .split_whitespace()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            if !token.starts_with("http") && !token.contains("://") && token.contains('.') {
                format!("https://{}", token)
            } else {
                token.to_string()
            }
        })
        .filter(|url| url.starts_with("http"))
        .collect()
}

fn analyzing_item(url: &str) -> MediaItem {
    MediaItem {
        id: Uuid::new_v4().to_string(),
        original_url: url.to_string(),
        direct_url: None,
        filename: ANALYZING_PLACEHOLDER.to_string(),
        original_filename: None,
        media_type: MediaType::Other,
        status: DownloadStatus::Analyzing,
        progress: 0,
        error: None,
        size_label: None,
        speed_label: None,
        eta_label: None,
    }
}

/// Snapshot of what a fetch needs, taken under the lock.
struct FetchJob {
    id: String,
    url: String,
    filename: String,
    is_video: bool,
}

/// Ordered download queue.
pub struct QueueManager {
    items: Mutex<Vec<MediaItem>>,
    classifier: Arc<dyn Classifier>,
    fetcher: Arc<dyn Fetcher>,
    archiving: AtomicBool,
    deflate_archives: bool,
}

impl QueueManager {
    pub fn new(classifier: Arc<dyn Classifier>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            classifier,
            fetcher,
            archiving: AtomicBool::new(false),
            deflate_archives: true,
        }
    }

    pub fn with_deflate_archives(mut self, deflate: bool) -> Self {
        self.deflate_archives = deflate;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Vec<MediaItem>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Applies `f` to the item with `id`; returns false if it is gone.
    fn update<F: FnOnce(&mut MediaItem)>(&self, id: &str, f: F) -> bool {
        match self.lock().iter_mut().find(|i| i.id == id) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }

    // --- Queries ---

    pub fn items(&self) -> Vec<MediaItem> {
        self.lock().clone()
    }

    pub fn get(&self, id: &str) -> Option<MediaItem> {
        self.lock().iter().find(|i| i.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn is_archiving(&self) -> bool {
        self.archiving.load(Ordering::Acquire)
    }

    // --- Enqueue and classification ---

    /// Adds every URL found in `input` to the front of the queue and
    /// classifies them. Returns the new item ids in input order.
    pub async fn enqueue(&self, input: &str) -> Vec<String> {
        let urls = normalize_url_input(input);
        if urls.is_empty() {
            return Vec::new();
        }

        let new_items: Vec<MediaItem> = urls.iter().map(|u| analyzing_item(u)).collect();
        let ids: Vec<String> = new_items.iter().map(|i| i.id.clone()).collect();
        self.lock().splice(0..0, new_items);
        info!(count = ids.len(), "queued urls for analysis");

        let results = resolve_analysis(self.classifier.as_ref(), &urls).await;

        let mut items = self.lock();
        for item in items
            .iter_mut()
            .filter(|i| i.status == DownloadStatus::Analyzing && ids.contains(&i.id))
        {
            let Some(result) = results.iter().find(|r| r.url == item.original_url) else {
                debug!(url = item.original_url.as_str(), "no analysis result, item left analyzing");
                continue;
            };
            item.filename = result.suggested_filename.clone();
            item.original_filename = Some(result.suggested_filename.clone());
            item.media_type = result.media_type;
            item.status = DownloadStatus::Ready;
            item.direct_url = Some(item.original_url.clone());
        }

        ids
    }

    // --- Renaming ---

    /// Renames one item. Only Ready and Error items are editable.
    pub fn rename(&self, id: &str, name: &str) -> Result<(), QueueError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(QueueError::InvalidFilename(name.to_string()));
        }
        let mut items = self.lock();
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
        if !item.status.is_editable() {
            return Err(QueueError::NotEditable(id.to_string()));
        }
        item.filename = name.to_string();
        Ok(())
    }

    /// Prepends the trimmed `text` to every filename. Returns the number of
    /// items renamed.
    pub fn bulk_prefix(&self, text: &str) -> usize {
        let prefix = text.trim();
        if prefix.is_empty() {
            return 0;
        }
        let mut items = self.lock();
        for item in items.iter_mut() {
            item.filename = format!("{}{}", prefix, item.filename);
        }
        items.len()
    }

    /// Appends `-NN` (queue position, 1-based) before each extension.
    /// Running it twice appends a second suffix.
    pub fn sequence(&self) {
        let mut items = self.lock();
        for (idx, item) in items.iter_mut().enumerate() {
            let (base, ext) = split_extension(&item.filename);
            item.filename = format!("{}-{:02}{}", base, idx + 1, ext);
        }
    }

    /// Literal replace of every occurrence of `find` in every filename.
    /// A replacement that would leave a name blank is skipped. Returns the
    /// number of filenames that changed.
    pub fn search_replace(&self, find: &str, replace_with: &str) -> usize {
        if find.is_empty() {
            return 0;
        }
        let mut changed = 0;
        for item in self.lock().iter_mut() {
            let renamed = item.filename.replace(find, replace_with);
            if renamed == item.filename {
                continue;
            }
            if renamed.trim().is_empty() {
                debug!(id = item.id.as_str(), "replacement would blank filename, skipped");
                continue;
            }
            item.filename = renamed;
            changed += 1;
        }
        changed
    }

    /// Restores classifier-assigned names where one was recorded.
    pub fn reset_names(&self) {
        for item in self.lock().iter_mut() {
            if let Some(original) = &item.original_filename {
                item.filename = original.clone();
            }
        }
    }

    // --- Removal ---

    pub fn remove(&self, id: &str) -> Result<MediaItem, QueueError> {
        let mut items = self.lock();
        let idx = items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
        Ok(items.remove(idx))
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // --- Downloading ---

    async fn fetch_tracked(&self, job: &FetchJob) -> Result<FetchedMedia, FetchError> {
        let items = &self.items;
        let id = job.id.as_str();
        let mut on_progress = |p: FetchProgress| {
            let mut items = items.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(item) = items.iter_mut().find(|i| i.id == id) {
                item.progress = p.percent;
                item.speed_label = Some(p.status_label());
                if p.received_bytes > 0 {
                    item.size_label = Some(p.size_label());
                }
            }
        };
        self.fetcher.fetch(&job.url, job.is_video, &mut on_progress).await
    }

    fn mark_downloading(item: &mut MediaItem) {
        item.status = DownloadStatus::Downloading;
        item.progress = 0;
        item.error = None;
    }

    fn mark_completed(item: &mut MediaItem) {
        item.status = DownloadStatus::Completed;
        item.progress = 100;
        item.speed_label = Some("completed".to_string());
    }

    fn mark_failed(item: &mut MediaItem, message: &str) {
        item.status = DownloadStatus::Error;
        item.error = Some(message.to_string());
    }

    /// Fetches one item and saves it under its final name.
    ///
    /// Ready and Error items retry, Completed items download again. Items
    /// without a fetch target or already downloading are rejected.
    pub async fn download_one(&self, id: &str, target: &dyn SaveTarget) -> Result<PathBuf, QueueError> {
        let job = {
            let mut items = self.lock();
            let item = items
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
            let url = item
                .direct_url
                .clone()
                .ok_or_else(|| QueueError::NotReady(id.to_string()))?;
            if item.status == DownloadStatus::Downloading {
                return Err(QueueError::AlreadyDownloading(id.to_string()));
            }
            Self::mark_downloading(item);
            FetchJob {
                id: item.id.clone(),
                url,
                filename: item.filename.clone(),
                is_video: item.media_type.is_video(),
            }
        };

        let outcome = match self.fetch_tracked(&job).await {
            Ok(media) => {
                let name = download_filename(&job.filename, job.is_video);
                target.save(&media.bytes, &name).map_err(QueueError::from)
            }
            Err(err) => Err(QueueError::from(err)),
        };

        match &outcome {
            Ok(path) => {
                info!(id, path = %path.display(), "download completed");
                self.update(id, Self::mark_completed);
            }
            Err(err) => {
                warn!(id, error = %err, "download failed");
                let message = match err {
                    QueueError::Fetch(fetch) => fetch.last_message(),
                    other => other.to_string(),
                };
                self.update(id, |item| Self::mark_failed(item, &message));
            }
        }
        outcome
    }

    /// Fetches every Ready, Error and Completed item in queue order and
    /// saves them as one `Batch_<millis>.zip`.
    ///
    /// Returns `Ok(None)` when another archive build is in flight or nothing
    /// is eligible. A failed fetch marks its item Error and the batch goes on.
    /// Fetched items become Completed only once the archive is saved; if
    /// packaging or saving fails they are marked Error instead.
    pub async fn download_all_as_archive(
        &self,
        target: &dyn SaveTarget,
    ) -> Result<Option<ArchiveReport>, QueueError> {
        let Some(_guard) = BuildGuard::acquire(&self.archiving) else {
            debug!("archive build already running");
            return Ok(None);
        };

        let jobs: Vec<FetchJob> = self
            .lock()
            .iter()
            .filter(|i| i.status.is_archivable())
            .map(|i| FetchJob {
                id: i.id.clone(),
                url: i.direct_url.clone().unwrap_or_else(|| i.original_url.clone()),
                filename: i.filename.clone(),
                is_video: i.media_type.is_video(),
            })
            .collect();
        if jobs.is_empty() {
            return Ok(None);
        }

        let mut archiver = Archiver::new().with_deflate(self.deflate_archives);
        let mut fetched: Vec<&str> = Vec::new();
        let mut failures = Vec::new();

        for job in &jobs {
            if !self.claim_for_archive(&job.id) {
                debug!(id = job.id.as_str(), "item no longer archivable, skipped");
                continue;
            }
            match self.fetch_tracked(job).await {
                Ok(media) => {
                    archiver.add(download_filename(&job.filename, job.is_video), media.bytes);
                    fetched.push(&job.id);
                }
                Err(err) => {
                    warn!(id = job.id.as_str(), error = %err, "archive entry fetch failed");
                    self.update(&job.id, |item| Self::mark_failed(item, ARCHIVE_FETCH_FAILED));
                    failures.push(ItemFailure {
                        id: job.id.clone(),
                        name: job.filename.clone(),
                        message: err.last_message(),
                    });
                }
            }
        }

        let archive_name = download_archive_name(now_millis());
        let entries = archiver.names();
        let saved_path = if archiver.is_empty() {
            None
        } else {
            let saved = archiver
                .finish()
                .map_err(QueueError::from)
                .and_then(|bytes| target.save(&bytes, &archive_name).map_err(QueueError::from));
            match saved {
                Ok(path) => Some(path),
                Err(err) => {
                    warn!(archive = archive_name.as_str(), error = %err, "batch archive not saved");
                    let message = err.to_string();
                    for id in &fetched {
                        self.update(id, |item| Self::mark_failed(item, &message));
                    }
                    return Err(err);
                }
            }
        };
        for id in &fetched {
            self.update(id, Self::mark_completed);
        }

        info!(
            archive = archive_name.as_str(),
            entries = entries.len(),
            failures = failures.len(),
            "batch archive finished"
        );

        Ok(Some(ArchiveReport {
            archive_name,
            saved_path,
            entries,
            failures,
        }))
    }

    /// Marks a captured archive job Downloading if it is still archivable.
    /// An item removed or picked up by `download_one` since is left alone.
    fn claim_for_archive(&self, id: &str) -> bool {
        match self.lock().iter_mut().find(|i| i.id == id) {
            Some(item) if item.status.is_archivable() => {
                Self::mark_downloading(item);
                true
            }
            _ => false,
        }
    }
}
