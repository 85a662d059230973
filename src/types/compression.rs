use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::media::ItemFailure;

pub const MIN_QUALITY: f32 = 0.05;
pub const MAX_QUALITY: f32 = 1.0;
pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 1.0;
pub const DEFAULT_QUALITY: f32 = 0.2;
pub const DEFAULT_SCALE: f32 = 0.6;

/// Lifecycle of a compression queue entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompressionStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

/// A local file handed to the compressor.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub name: String,
    /// Declared MIME type. When absent it is guessed from the file extension.
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            bytes,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Quality and scale factors for image re-encoding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CompressionParams {
    pub quality: f32,
    pub scale: f32,
}

impl CompressionParams {
    /// Builds parameters clamped into the supported ranges.
    /// Non-finite inputs fall back to the defaults.
    pub fn new(quality: f32, scale: f32) -> Self {
        let quality = if quality.is_finite() {
            quality.clamp(MIN_QUALITY, MAX_QUALITY)
        } else {
            DEFAULT_QUALITY
        };
        let scale = if scale.is_finite() {
            scale.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            DEFAULT_SCALE
        };
        Self { quality, scale }
    }
}

impl Default for CompressionParams {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            scale: DEFAULT_SCALE,
        }
    }
}

/// One local file tracked through the compression pipeline.
#[derive(Debug, Clone)]
pub struct CompressedFile {
    pub id: String,
    pub source: SourceFile,
    pub compressed: Option<Vec<u8>>,
    pub original_size: u64,
    pub compressed_size: Option<u64>,
    pub status: CompressionStatus,
    pub progress: u8,
    pub error: Option<String>,
    pub preview: Option<PathBuf>,
}

impl CompressedFile {
    /// Percentage of bytes saved, 0 when the output is not smaller.
    pub fn savings_percent(&self) -> u8 {
        match self.compressed_size {
            Some(compressed) if self.original_size > 0 && compressed < self.original_size => {
                let saved = 1.0 - compressed as f64 / self.original_size as f64;
                (saved * 100.0).round() as u8
            }
            _ => 0,
        }
    }
}

/// Outcome of processing a batch of local files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompressionReport {
    pub completed: Vec<String>,
    pub failures: Vec<ItemFailure>,
}
