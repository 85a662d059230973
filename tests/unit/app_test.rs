//! App core wiring tests.

use omnidownloader::app::{select_classifier, App};
use omnidownloader::platform;
use omnidownloader::services::classifier::Classifier;
use omnidownloader::services::settings_engine::SettingsEngineTrait;
use omnidownloader::types::settings::ClassifierSettings;
use tempfile::TempDir;

fn app_in(dir: &TempDir) -> App {
    let db_path = dir.path().join("app.db");
    let settings_path = dir.path().join("settings.json").to_string_lossy().to_string();
    App::new(&db_path.to_string_lossy(), Some(settings_path)).unwrap()
}

#[test]
fn new_app_starts_empty_with_defaults() {
    let dir = TempDir::new().unwrap();
    let app = app_in(&dir);

    assert!(app.queue.is_empty());
    assert!(app.compressor.items().is_empty());
    assert!(app.output_directory.current().is_none());
    assert_eq!(app.output_dir(), platform::get_download_dir());
    assert_eq!(app.compression_params().quality, 0.2);
}

#[test]
fn chosen_output_directory_survives_restart() {
    let dir = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    {
        let mut app = app_in(&dir);
        app.output_directory.choose(out.path()).unwrap();
        assert_eq!(app.save_target().dir(), out.path());
    }

    let app = app_in(&dir);
    assert_eq!(app.output_dir(), out.path());
}

#[test]
fn compression_params_follow_settings_and_clamp() {
    let dir = TempDir::new().unwrap();
    let mut app = app_in(&dir);
    app.settings_engine
        .set_value("compression.scale", serde_json::json!(3.0))
        .unwrap();
    assert_eq!(app.compression_params().scale, 1.0);
}

#[test]
fn disabled_classifier_selects_heuristic() {
    let settings = ClassifierSettings {
        enabled: false,
        api_key: Some("ignored".to_string()),
        ..ClassifierSettings::default()
    };
    let classifier = select_classifier(&settings);
    let results = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(classifier.classify(&["https://a.com/x.gif".to_string()]))
        .unwrap();
    assert_eq!(results[0].suggested_filename, "x.gif");
}
