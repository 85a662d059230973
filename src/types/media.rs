use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Media classification of a queued URL.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaType {
    Image,
    Video,
    Document,
    Other,
}

impl MediaType {
    pub fn is_video(&self) -> bool {
        matches!(self, MediaType::Video)
    }
}

/// Lifecycle of a download queue entry.
///
/// `Pending` is never produced by the queue itself; it is kept so that
/// serialized queue snapshots from older builds still deserialize.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum DownloadStatus {
    Pending,
    Analyzing,
    Ready,
    Downloading,
    Completed,
    Error,
}

impl DownloadStatus {
    /// Statuses picked up by the batch archive operation.
    pub fn is_archivable(&self) -> bool {
        matches!(
            self,
            DownloadStatus::Ready | DownloadStatus::Error | DownloadStatus::Completed
        )
    }

    /// Statuses in which the user may edit the filename.
    pub fn is_editable(&self) -> bool {
        matches!(self, DownloadStatus::Ready | DownloadStatus::Error)
    }
}

/// One URL tracked through the acquisition pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
    pub id: String,
    pub original_url: String,
    pub direct_url: Option<String>,
    pub filename: String,
    pub original_filename: Option<String>,
    pub media_type: MediaType,
    pub status: DownloadStatus,
    pub progress: u8,
    pub error: Option<String>,
    // Display-only metadata, never consulted for control flow.
    pub size_label: Option<String>,
    pub speed_label: Option<String>,
    pub eta_label: Option<String>,
}

/// Classifier output for a single URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub suggested_filename: String,
    pub is_direct_link: bool,
}

/// An entry that could not be processed during a batch operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemFailure {
    pub id: String,
    pub name: String,
    pub message: String,
}

/// Outcome of a batch archive build.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArchiveReport {
    pub archive_name: String,
    /// `None` when no entry could be fetched and nothing was saved.
    pub saved_path: Option<PathBuf>,
    pub entries: Vec<String>,
    pub failures: Vec<ItemFailure>,
}
