//! ColorForge - film emulation photo editor
//!
//! Entry point: sets up logging, builds the shared caches and warms the
//! preview tier for the images passed on the command line.
//!
//! Usage: `colorforge [--config <cache.json>] [image paths...]`

mod warmup;

use anyhow::{Context, Result};
use colorforge_cache::{CacheConfig, CacheContext};
use colorforge_core::{bytes_to_mb, PixelBuffer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use warmup::{warm_initial_buffers, ImageItem, SyntheticDecoder};

/// Preview size used for decode-ahead.
const PREVIEW_SIZE: (u32, u32) = (1920, 1280);

/// Thumbnail size for the browser grid.
const THUMBNAIL_SIZE: (u32, u32) = (256, 170);

struct Args {
    config: Option<PathBuf>,
    images: Vec<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut config = None;
    let mut images = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args.next().context("--config needs a path")?;
            config = Some(PathBuf::from(path));
        } else {
            images.push(PathBuf::from(arg));
        }
    }
    Ok(Args { config, images })
}

/// Explicit path first, then the user config file if it exists, otherwise
/// defaults.
fn load_config(explicit: Option<PathBuf>) -> Result<CacheConfig> {
    if let Some(path) = explicit {
        return CacheConfig::load(&path)
            .with_context(|| format!("Failed to load cache config from {}", path.display()));
    }
    match CacheConfig::default_path() {
        Some(path) if path.exists() => {
            info!(path = %path.display(), "Loading cache config");
            CacheConfig::load(&path)
                .with_context(|| format!("Failed to load cache config from {}", path.display()))
        }
        _ => Ok(CacheConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("ColorForge starting...");

    let args = parse_args()?;
    let config = load_config(args.config)?;
    let caches = CacheContext::new(&config)?;

    let items: Vec<ImageItem> = args
        .images
        .into_iter()
        .map(|path| ImageItem::new(path, PREVIEW_SIZE.0, PREVIEW_SIZE.1))
        .collect();

    for item in &items {
        let thumbnail = PixelBuffer::test_pattern(THUMBNAIL_SIZE.0, THUMBNAIL_SIZE.1);
        caches
            .thumbnails()
            .insert(item.path.clone(), Arc::new(thumbnail));
    }

    let summary = warm_initial_buffers(
        Arc::clone(caches.standard()),
        Arc::new(SyntheticDecoder),
        &items,
        num_cpus::get(),
    )
    .await;

    let stats = caches.standard().stats();
    info!(
        decoded = summary.decoded,
        skipped = summary.skipped,
        failed = summary.failed,
        evictions = summary.evictions,
        resident = stats.entry_count,
        resident_mb = bytes_to_mb(stats.total_cost),
        utilization = stats.utilization(),
        thumbnails = caches.thumbnails().len(),
        "Preview cache ready"
    );

    caches.clear_all().await;
    Ok(())
}
