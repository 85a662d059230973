use serde::{Deserialize, Serialize};

use super::compression::{DEFAULT_QUALITY, DEFAULT_SCALE};

pub const DEFAULT_PROXY_PREFIX: &str = "https://corsproxy.io/?";
pub const DEFAULT_CLASSIFIER_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CLASSIFIER_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_USER_AGENT: &str = concat!("omnidownloader/", env!("CARGO_PKG_VERSION"));

/// Top-level application settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppSettings {
    pub fetch: FetchSettings,
    pub classifier: ClassifierSettings,
    pub compression: CompressionSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

/// HTTP retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FetchSettings {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Whether the relay strategy is tried after a failed direct fetch.
    pub proxy_enabled: bool,
    /// Prefix the percent-encoded target URL is appended to.
    pub proxy_prefix: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 120,
            proxy_enabled: true,
            proxy_prefix: DEFAULT_PROXY_PREFIX.to_string(),
        }
    }
}

/// Remote URL classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifierSettings {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    /// Overrides the `API_KEY` environment variable when set.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_CLASSIFIER_ENDPOINT.to_string(),
            model: DEFAULT_CLASSIFIER_MODEL.to_string(),
            api_key: None,
        }
    }
}

/// Default parameters for the local compressor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompressionSettings {
    pub quality: f32,
    pub scale: f32,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            scale: DEFAULT_SCALE,
        }
    }
}

/// Output behaviour for saved files and archives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputSettings {
    /// Deflate archive entries instead of storing them.
    pub deflate_archives: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            deflate_archives: true,
        }
    }
}
