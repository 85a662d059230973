//! Compression engine tests with generated images.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};
use omnidownloader::services::compression_engine::{
    compress, guess_mime_type, is_image, scaled_dimensions, OUTPUT_MIME_TYPE,
};
use omnidownloader::types::compression::{CompressionParams, SourceFile};
use omnidownloader::types::errors::CompressionError;
use rstest::rstest;

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 251) as u8, (y % 241) as u8, ((x * y) % 239) as u8])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn default_params_shrink_1000_square_to_600() {
    let source = SourceFile::new("big.png", png_bytes(1000, 1000));
    let output = compress(&source, CompressionParams::new(0.2, 0.6)).unwrap();

    assert_eq!(output.dimensions, Some((600, 600)));
    assert_eq!(output.mime_type, OUTPUT_MIME_TYPE);
    assert_eq!(output.output_name, "big.jpg");
    assert!(!output.passthrough);

    let decoded = image::load_from_memory(&output.bytes).unwrap();
    assert_eq!(decoded.dimensions(), (600, 600));
}

#[test]
fn non_image_passes_through_unchanged() {
    let bytes = vec![42u8; 50_000];
    let source = SourceFile::new("clip.mp4", bytes.clone());
    let output = compress(&source, CompressionParams::default()).unwrap();

    assert!(output.passthrough);
    assert_eq!(output.bytes, bytes);
    assert_eq!(output.output_name, "clip.mp4");
    assert_eq!(output.dimensions, None);
}

#[test]
fn declared_mime_type_wins_over_extension() {
    let source = SourceFile::new("no_extension", png_bytes(40, 20)).with_mime_type("image/png");
    assert!(is_image(&source));
    let output = compress(&source, CompressionParams::new(0.5, 0.5)).unwrap();
    assert_eq!(output.dimensions, Some((20, 10)));
}

#[test]
fn undecodable_image_is_a_decode_error() {
    let source = SourceFile::new("broken.png", vec![0u8; 64]);
    let result = compress(&source, CompressionParams::default());
    assert!(matches!(result, Err(CompressionError::Decode(_))));
}

#[rstest]
#[case(1000, 1000, 0.6, (600, 600))]
#[case(1000, 1000, 0.7, (700, 700))]
#[case(3, 1, 0.1, (1, 1))]
#[case(1920, 1080, 0.5, (960, 540))]
fn scaled_dimensions_floor_with_minimum(
    #[case] w: u32,
    #[case] h: u32,
    #[case] scale: f32,
    #[case] expected: (u32, u32),
) {
    assert_eq!(scaled_dimensions(w, h, scale), expected);
}

#[rstest]
#[case("a.JPG", Some("image/jpeg"))]
#[case("b.webp", Some("image/webp"))]
#[case("c.mov", Some("video/quicktime"))]
#[case("d.unknown", None)]
#[case("noext", None)]
fn mime_guessing(#[case] name: &str, #[case] expected: Option<&str>) {
    assert_eq!(guess_mime_type(name), expected);
}

#[test]
fn params_are_clamped() {
    let params = CompressionParams::new(5.0, 0.0);
    assert_eq!(params.quality, 1.0);
    assert!((params.scale - 0.1).abs() < f32::EPSILON);

    let params = CompressionParams::new(f32::NAN, f32::INFINITY);
    assert_eq!(params, CompressionParams::default());
}
