//! OmniDownloader demo.
//!
//! Runs the whole pipeline offline: heuristic classification, bulk renaming,
//! archive packaging from an in-process fetcher, and local image compression.
//! Set `RUST_LOG=debug` for the component logs.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing_subscriber::EnvFilter;

use omnidownloader::managers::compression_queue::CompressionQueueManager;
use omnidownloader::managers::queue_manager::QueueManager;
use omnidownloader::services::classifier::HeuristicClassifier;
use omnidownloader::services::fetch_engine::{FetchPhase, FetchProgress, FetchedMedia, Fetcher};
use omnidownloader::services::naming::now_millis;
use omnidownloader::services::save_target::DirectorySaveTarget;
use omnidownloader::types::compression::{CompressionParams, SourceFile};
use omnidownloader::types::errors::FetchError;

/// Serves a fixed-size synthetic body for every URL; `/missing` paths fail.
struct OfflineFetcher;

#[async_trait]
impl Fetcher for OfflineFetcher {
    async fn fetch(
        &self,
        url: &str,
        _is_video: bool,
        progress: &mut (dyn FnMut(FetchProgress) + Send),
    ) -> Result<FetchedMedia, FetchError> {
        if url.contains("/missing") {
            return Err(FetchError::AllStrategiesFailed("HTTP 404".to_string()));
        }
        let bytes = url.as_bytes().repeat(64);
        progress(FetchProgress {
            phase: FetchPhase::Finished,
            strategy: "offline".to_string(),
            percent: 100,
            received_bytes: bytes.len() as u64,
            total_bytes: Some(bytes.len() as u64),
        });
        Ok(FetchedMedia {
            bytes,
            content_type: None,
        })
    }
}

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  📦 {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

fn demo_dir() -> PathBuf {
    std::env::temp_dir().join(format!("omnidownloader-demo-{}", now_millis()))
}

async fn demo_queue(out: &Path) {
    section("Download Queue");

    let queue = QueueManager::new(Arc::new(HeuristicClassifier), Arc::new(OfflineFetcher));
    let ids = queue
        .enqueue(
            "example.com/photos/cat.jpg\n\
             https://cdn.example.org/clips/intro.mp4 \
             https://docs.example.net/report.pdf \
             not-a-url \
             https://example.com/missing/banner.png",
        )
        .await;
    println!("  Queued {} urls", ids.len());
    for item in queue.items() {
        println!("    {:<12} {:?} {:?}", item.filename, item.media_type, item.status);
    }

    queue.bulk_prefix("trip_");
    queue.sequence();
    let changed = queue.search_replace("trip_", "holiday_");
    println!("  Renamed: prefix + sequence + replace ({} changed)", changed);
    for item in queue.items() {
        println!("    {}", item.filename);
    }

    let target = DirectorySaveTarget::new(out);
    match queue.download_all_as_archive(&target).await {
        Ok(Some(report)) => {
            println!("  Archive {} with {} entries", report.archive_name, report.entries.len());
            for failure in &report.failures {
                println!("    failed: {} ({})", failure.name, failure.message);
            }
            if let Some(path) = report.saved_path {
                println!("  Saved to {}", path.display());
            }
        }
        Ok(None) => println!("  Nothing to archive"),
        Err(err) => println!("  Archive failed: {}", err),
    }

    queue.reset_names();
    println!("  Names reset, first item: {:?}", queue.items().first().map(|i| i.filename.clone()));
    println!("  ✓ QueueManager OK");
    println!();
}

fn generated_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut buf = Vec::new();
    if let Err(err) = image::DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png) {
        println!("  PNG generation failed: {}", err);
    }
    buf
}

fn demo_compression(out: &Path) {
    section("Compression Queue");

    let compressor = CompressionQueueManager::new();
    let report = compressor.add_files(
        vec![
            SourceFile::new("gradient.png", generated_png(800, 600)),
            SourceFile::new("notes.txt", b"plain text stays as is".to_vec()),
            SourceFile::new("broken.png", vec![0u8; 32]),
        ],
        CompressionParams::default(),
    );
    println!(
        "  Compressed {} files, {} failed",
        report.completed.len(),
        report.failures.len()
    );
    for item in compressor.items() {
        println!(
            "    {:<14} {:>8} -> {:>8} bytes ({}% saved)",
            item.source.name,
            item.original_size,
            item.compressed_size.unwrap_or(0),
            item.savings_percent()
        );
    }

    let target = DirectorySaveTarget::new(out);
    match compressor.download_all_as_archive(&target) {
        Ok(Some(report)) => println!("  Archive {} with {} entries", report.archive_name, report.entries.len()),
        Ok(None) => println!("  Nothing to archive"),
        Err(err) => println!("  Archive failed: {}", err),
    }
    println!("  ✓ CompressionQueueManager OK");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║             OmniDownloader v{} — Demo Mode              ║", env!("CARGO_PKG_VERSION"));
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let out = demo_dir();
    demo_queue(&out).await;
    demo_compression(&out);

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("  Output written to {}", out.display());
    println!("═══════════════════════════════════════════════════════════════");
}
