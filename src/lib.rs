//! OmniDownloader: batch media fetcher with bulk renaming, ZIP packaging and
//! local image recompression.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod platform;
pub mod services;
pub mod types;
