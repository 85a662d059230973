// OmniDownloader platform paths.
// Selected per OS with `cfg(target_os)`.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
use linux as os;

#[cfg(target_os = "macos")]
use macos as os;

#[cfg(target_os = "windows")]
use windows as os;

/// Directory holding `settings.json`.
///
/// - **Linux**: `~/.config/omnidownloader` (or `$XDG_CONFIG_HOME/omnidownloader`)
/// - **macOS**: `~/Library/Application Support/OmniDownloader`
/// - **Windows**: `%APPDATA%/OmniDownloader`
pub fn get_config_dir() -> PathBuf {
    os::get_config_dir()
}

/// Directory holding the SQLite database.
///
/// - **Linux**: `~/.local/share/omnidownloader` (or `$XDG_DATA_HOME/omnidownloader`)
/// - **macOS**: `~/Library/Application Support/OmniDownloader`
/// - **Windows**: `%APPDATA%/OmniDownloader`
pub fn get_data_dir() -> PathBuf {
    os::get_data_dir()
}

/// Fallback save location when no output directory was chosen.
pub fn get_download_dir() -> PathBuf {
    os::get_download_dir()
}
