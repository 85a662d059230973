//! Compression Engine for OmniDownloader.
//!
//! Images are decoded, rescaled and re-encoded as JPEG. Anything that is not
//! an image (video included) passes through untouched so that playback
//! compatibility is never put at risk.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{GenericImageView, ImageReader};

use crate::services::naming::{compressed_output_name, split_extension};
use crate::types::compression::{CompressionParams, SourceFile};
use crate::types::errors::CompressionError;

pub const OUTPUT_MIME_TYPE: &str = "image/jpeg";

/// Result of compressing one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionOutput {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub output_name: String,
    /// Output pixel dimensions; `None` for pass-through files.
    pub dimensions: Option<(u32, u32)>,
    pub passthrough: bool,
}

/// Guesses a MIME type from a filename extension.
pub fn guess_mime_type(name: &str) -> Option<&'static str> {
    let (_, ext) = split_extension(name);
    let mime = match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(mime)
}

/// Whether the source is treated as an image (declared or guessed MIME type
/// under `image/`).
pub fn is_image(source: &SourceFile) -> bool {
    source
        .mime_type
        .as_deref()
        .or_else(|| guess_mime_type(&source.name))
        .map(|m| m.starts_with("image/"))
        .unwrap_or(false)
}

/// Output dimensions for a scale factor: `floor(dim * scale)`, at least 1.
pub fn scaled_dimensions(width: u32, height: u32, scale: f32) -> (u32, u32) {
    let scale_dim = |d: u32| ((d as f32 * scale).floor() as u32).max(1);
    (scale_dim(width), scale_dim(height))
}

fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Compresses one source file.
pub fn compress(source: &SourceFile, params: CompressionParams) -> Result<CompressionOutput, CompressionError> {
    if !is_image(source) {
        return Ok(CompressionOutput {
            bytes: source.bytes.clone(),
            mime_type: source
                .mime_type
                .clone()
                .or_else(|| guess_mime_type(&source.name).map(str::to_string))
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            output_name: compressed_output_name(&source.name, false),
            dimensions: None,
            passthrough: true,
        });
    }

    let img = ImageReader::new(Cursor::new(&source.bytes))
        .with_guessed_format()
        .map_err(|e| CompressionError::Decode(e.to_string()))?
        .decode()
        .map_err(|e| CompressionError::Decode(e.to_string()))?;

    let (width, height) = img.dimensions();
    let (out_width, out_height) = scaled_dimensions(width, height, params.scale);
    let resized = if (out_width, out_height) == (width, height) {
        img
    } else {
        img.resize_exact(out_width, out_height, FilterType::Triangle)
    };

    let rgb = resized.to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, jpeg_quality(params.quality))
        .encode_image(&rgb)
        .map_err(|e| CompressionError::Encode(e.to_string()))?;

    Ok(CompressionOutput {
        bytes,
        mime_type: OUTPUT_MIME_TYPE.to_string(),
        output_name: compressed_output_name(&source.name, true),
        dimensions: Some((out_width, out_height)),
        passthrough: false,
    })
}
