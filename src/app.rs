//! App Core for OmniDownloader.
//!
//! Central struct holding the database, settings and both queues.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::database::connection::Database;
use crate::managers::compression_queue::CompressionQueueManager;
use crate::managers::output_directory::{OutputDirectory, SqliteHandleStore};
use crate::managers::queue_manager::QueueManager;
use crate::platform;
use crate::services::classifier::{Classifier, GeminiClassifier, HeuristicClassifier};
use crate::services::fetch_engine::FetchEngine;
use crate::services::save_target::DirectorySaveTarget;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::compression::CompressionParams;
use crate::types::settings::ClassifierSettings;

/// Central application struct.
pub struct App {
    pub db: Arc<Database>,
    pub settings_engine: SettingsEngine,
    pub output_directory: OutputDirectory,
    pub queue: QueueManager,
    pub compressor: CompressionQueueManager,
}

/// Picks the remote classifier when it is enabled and a key is available,
/// otherwise the extension heuristic.
pub fn select_classifier(settings: &ClassifierSettings) -> Arc<dyn Classifier> {
    if settings.enabled {
        match GeminiClassifier::from_settings(settings) {
            Ok(classifier) => return Arc::new(classifier),
            Err(err) => warn!(error = %err, "remote classifier unavailable, using extension heuristic"),
        }
    }
    Arc::new(HeuristicClassifier)
}

impl App {
    /// Creates a new App.
    ///
    /// `settings_path` overrides the platform settings location. A settings
    /// file that fails to load is logged and the defaults are used.
    pub fn new(db_path: &str, settings_path: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Arc::new(Database::open(db_path)?);

        let mut settings_engine = SettingsEngine::new(settings_path);
        if let Err(err) = settings_engine.load() {
            warn!(error = %err, "failed to load settings, using defaults");
        }
        let settings = settings_engine.get_settings().clone();

        let output_directory = OutputDirectory::load(Box::new(SqliteHandleStore::new(db.clone())));

        let fetcher = FetchEngine::new(&settings.fetch)
            .map_err(|e| format!("FetchEngine init failed: {}", e))?;
        let queue = QueueManager::new(select_classifier(&settings.classifier), Arc::new(fetcher))
            .with_deflate_archives(settings.output.deflate_archives);
        let compressor =
            CompressionQueueManager::new().with_deflate_archives(settings.output.deflate_archives);

        info!(db = db_path, "app initialized");

        Ok(Self {
            db,
            settings_engine,
            output_directory,
            queue,
            compressor,
        })
    }

    /// Opens the app with its database under the platform data directory.
    pub fn open_default() -> Result<Self, Box<dyn std::error::Error>> {
        let data_dir = platform::get_data_dir();
        std::fs::create_dir_all(&data_dir)?;
        let db_path = data_dir.join("omnidownloader.db");
        Self::new(&db_path.to_string_lossy(), None)
    }

    /// Directory files are saved to: the chosen output directory, else the
    /// platform download directory.
    pub fn output_dir(&self) -> PathBuf {
        self.output_directory
            .current()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(platform::get_download_dir)
    }

    pub fn save_target(&self) -> DirectorySaveTarget {
        DirectorySaveTarget::new(self.output_dir())
    }

    /// Compression parameters from the settings, clamped.
    pub fn compression_params(&self) -> CompressionParams {
        let c = &self.settings_engine.get_settings().compression;
        CompressionParams::new(c.quality, c.scale)
    }
}
