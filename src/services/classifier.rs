//! URL classification for OmniDownloader.
//!
//! The remote classifier asks a Generative Language model to label each URL
//! with a media type and a suggested filename. Whenever it fails, or leaves a
//! URL out of its answer, the local extension heuristic fills in.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::services::naming::{ensure_video_extension, filename_from_url, url_path};
use crate::types::errors::ClassifierError;
use crate::types::media::{AnalysisResult, MediaType};
use crate::types::settings::ClassifierSettings;

pub const API_KEY_ENV: &str = "API_KEY";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "m4v", "avi", "mkv"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "pptx", "doc", "docx"];

/// Trait defining URL classification.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, urls: &[String]) -> Result<Vec<AnalysisResult>, ClassifierError>;
}

/// Lower-cased extension of the URL path, if any.
fn url_extension(url: &str) -> Option<String> {
    let path = url_path(url);
    let last_segment = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = last_segment.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// Classifies a URL by its file extension.
pub fn classify_by_extension(url: &str) -> AnalysisResult {
    let media_type = match url_extension(url).as_deref() {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => MediaType::Image,
        Some(ext) if VIDEO_EXTENSIONS.contains(&ext) => MediaType::Video,
        Some(ext) if DOCUMENT_EXTENSIONS.contains(&ext) => MediaType::Document,
        _ => MediaType::Other,
    };

    let mut suggested_filename = filename_from_url(url);
    if media_type.is_video() {
        suggested_filename = ensure_video_extension(&suggested_filename);
    }

    AnalysisResult {
        url: url.to_string(),
        media_type,
        suggested_filename,
        is_direct_link: true,
    }
}

/// Offline classifier driven purely by file extensions.
#[derive(Debug, Default, Clone)]
pub struct HeuristicClassifier;

#[async_trait]
impl Classifier for HeuristicClassifier {
    async fn classify(&self, urls: &[String]) -> Result<Vec<AnalysisResult>, ClassifierError> {
        Ok(urls.iter().map(|u| classify_by_extension(u)).collect())
    }
}

/// Classifier backed by the Generative Language `generateContent` API.
pub struct GeminiClassifier {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Zeroizing<String>,
}

impl GeminiClassifier {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: Zeroizing::new(api_key.into()),
        }
    }

    /// Builds a classifier from settings, reading the key from the settings
    /// override or the `API_KEY` environment variable.
    pub fn from_settings(settings: &ClassifierSettings) -> Result<Self, ClassifierError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or(ClassifierError::MissingApiKey)?;
        Ok(Self::new(&settings.endpoint, &settings.model, api_key))
    }

    fn build_prompt(urls: &[String]) -> String {
        format!(
            "Analyze the following URLs and determine if they are direct links to images, videos, or documents (PDF/PPTX).\n\
             For each URL, suggest a filename and identify its media type.\n\n\
             URLs to analyze:\n{}\n\n\
             Return a structured JSON array.",
            urls.join("\n")
        )
    }

    fn build_request(urls: &[String]) -> serde_json::Value {
        json!({
            "contents": [{ "parts": [{ "text": Self::build_prompt(urls) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "url": { "type": "STRING" },
                            "type": {
                                "type": "STRING",
                                "enum": ["IMAGE", "VIDEO", "DOCUMENT", "OTHER"]
                            },
                            "suggestedFilename": { "type": "STRING" },
                            "isDirectLink": { "type": "BOOLEAN" }
                        },
                        "required": ["url", "type", "suggestedFilename", "isDirectLink"]
                    }
                }
            }
        })
    }

    /// Extracts the JSON array from a `generateContent` response body.
    pub fn parse_response(body: &serde_json::Value) -> Result<Vec<AnalysisResult>, ClassifierError> {
        let text = body
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|t| t.as_str())
            .ok_or_else(|| ClassifierError::ParseError("response has no text part".to_string()))?;

        serde_json::from_str(text.trim()).map_err(|e| ClassifierError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl Classifier for GeminiClassifier {
    async fn classify(&self, urls: &[String]) -> Result<Vec<AnalysisResult>, ClassifierError> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }
        if self.api_key.trim().is_empty() {
            return Err(ClassifierError::MissingApiKey);
        }

        let endpoint = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let response = self
            .client
            .post(&endpoint)
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&Self::build_request(urls))
            .send()
            .await
            .map_err(|e| ClassifierError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifierError::ProviderError(format!("HTTP {}", status.as_u16())));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ClassifierError::ParseError(e.to_string()))?;

        let results = Self::parse_response(&body)?;
        debug!(requested = urls.len(), returned = results.len(), "classifier answered");
        Ok(results)
    }
}

/// Makes a classifier answer safe to merge: empty names fall back to the
/// URL's last segment and video names carry the `.mov` extension.
fn normalize_result(mut result: AnalysisResult) -> AnalysisResult {
    if result.suggested_filename.trim().is_empty() {
        result.suggested_filename = filename_from_url(&result.url);
    }
    if result.media_type.is_video() {
        result.suggested_filename = ensure_video_extension(&result.suggested_filename);
    }
    result
}

/// Classifies `urls`, one result per input URL in input order.
///
/// A classifier failure switches every URL to the extension heuristic; URLs
/// the classifier left out are filled in individually the same way.
pub async fn resolve_analysis(classifier: &dyn Classifier, urls: &[String]) -> Vec<AnalysisResult> {
    if urls.is_empty() {
        return Vec::new();
    }

    let mut answered = match classifier.classify(urls).await {
        Ok(results) => results,
        Err(err) => {
            warn!(error = %err, "classifier failed, using extension heuristic");
            Vec::new()
        }
    };

    urls.iter()
        .map(|url| match answered.iter().position(|r| &r.url == url) {
            Some(idx) => normalize_result(answered.remove(idx)),
            None => {
                debug!(url = url.as_str(), "no classifier result, using extension heuristic");
                classify_by_extension(url)
            }
        })
        .collect()
}
