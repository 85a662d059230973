// OmniDownloader services
// Stateless or self-contained building blocks: fetching, classification, naming, compression, archiving, saving, settings.

pub mod archiver;
pub mod classifier;
pub mod compression_engine;
pub mod fetch_engine;
pub mod naming;
pub mod save_target;
pub mod settings_engine;
