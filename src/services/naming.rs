//! Filename policy shared by the acquisition and compression pipelines.
//!
//! Every boundary that produces a video filename goes through
//! [`ensure_video_extension`] so that saved videos always carry `.mov`.

pub const VIDEO_EXTENSION: &str = ".mov";
pub const VIDEO_MIME_TYPE: &str = "video/quicktime";
pub const COMPRESSED_IMAGE_EXTENSION: &str = ".jpg";
pub const FALLBACK_FILENAME: &str = "file";

const DOWNLOAD_ARCHIVE_PREFIX: &str = "Batch_";
const COMPRESSED_ARCHIVE_PREFIX: &str = "Compressed_Batch_";

/// Splits a trailing `.ext` (ASCII alphanumerics only) off a filename.
/// Returns `(base, ext)` where `ext` includes the dot or is empty.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx)
            if idx + 1 < name.len()
                && name[idx + 1..].bytes().all(|b| b.is_ascii_alphanumeric()) =>
        {
            (&name[..idx], &name[idx..])
        }
        _ => (name, ""),
    }
}

/// Removes the last extension, if any (anything after the final `.` that
/// contains no path separator).
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 && !name[idx + 1..].contains('/') && idx + 1 < name.len() => {
            &name[..idx]
        }
        _ => name,
    }
}

/// Forces a `.mov` extension, keeping the base name. Names that already end
/// in `.mov` (any case) are returned unchanged.
pub fn ensure_video_extension(name: &str) -> String {
    if name.to_ascii_lowercase().ends_with(VIDEO_EXTENSION) {
        return name.to_string();
    }
    format!("{}{}", strip_extension(name), VIDEO_EXTENSION)
}

/// Name a fetched item is saved under.
pub fn download_filename(name: &str, is_video: bool) -> String {
    if is_video {
        ensure_video_extension(name)
    } else {
        name.to_string()
    }
}

/// Name a compressed file is saved under: re-encoded images get `.jpg`,
/// pass-through files keep their name.
pub fn compressed_output_name(name: &str, is_image: bool) -> String {
    if is_image {
        format!("{}{}", strip_extension(name), COMPRESSED_IMAGE_EXTENSION)
    } else {
        name.to_string()
    }
}

/// Strips the query string and fragment from a URL.
pub fn url_path(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Last `/`-separated path segment of a URL, or [`FALLBACK_FILENAME`].
pub fn filename_from_url(url: &str) -> String {
    match url_path(url).rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment.to_string(),
        _ => FALLBACK_FILENAME.to_string(),
    }
}

pub fn download_archive_name(unix_millis: u128) -> String {
    format!("{}{}.zip", DOWNLOAD_ARCHIVE_PREFIX, unix_millis)
}

pub fn compressed_archive_name(unix_millis: u128) -> String {
    format!("{}{}.zip", COMPRESSED_ARCHIVE_PREFIX, unix_millis)
}

pub fn now_millis() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}
