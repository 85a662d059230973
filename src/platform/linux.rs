// Linux paths
// Config:    ~/.config/omnidownloader
// Data:      ~/.local/share/omnidownloader
// Downloads: $XDG_DOWNLOAD_DIR or ~/Downloads

use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "omnidownloader";

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// `$XDG_CONFIG_HOME/omnidownloader`, else `~/.config/omnidownloader`.
pub fn get_config_dir() -> PathBuf {
    match env::var("XDG_CONFIG_HOME") {
        Ok(xdg) => PathBuf::from(xdg).join(APP_DIR),
        Err(_) => home_dir().join(".config").join(APP_DIR),
    }
}

/// `$XDG_DATA_HOME/omnidownloader`, else `~/.local/share/omnidownloader`.
pub fn get_data_dir() -> PathBuf {
    match env::var("XDG_DATA_HOME") {
        Ok(xdg) => PathBuf::from(xdg).join(APP_DIR),
        Err(_) => home_dir().join(".local").join("share").join(APP_DIR),
    }
}

pub fn get_download_dir() -> PathBuf {
    match env::var("XDG_DOWNLOAD_DIR") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => home_dir().join("Downloads"),
    }
}
