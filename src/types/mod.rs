// OmniDownloader shared type definitions

pub mod compression;
pub mod errors;
pub mod media;
pub mod settings;
