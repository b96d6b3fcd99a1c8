//! album-browse: page through a running album server from the terminal,
//! using the same cache and orchestration as the web client.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use album_client::{
    CacheManager, CacheOptions, CacheStorage, FetchMode, FileStorage, Gallery, GalleryOptions,
    HttpPhotoApi, LoadOutcome, MemoryStorage, PhotoApi, SystemClock, TextRenderer,
    TracingNotifier,
};
use album_types::PhotoId;

#[derive(Debug, Parser)]
#[command(name = "album-browse", about = "Browse a photo album server from the terminal")]
struct Cli {
    /// Base URL of the album server
    #[arg(long, env = "ALBUM_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    /// Photos per page
    #[arg(long, default_value_t = 12)]
    limit: u32,

    /// Persist the cache here; in-memory only otherwise
    #[arg(long, env = "ALBUM_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Seconds before a cached page is considered stale
    #[arg(long, default_value_t = 300)]
    ttl_secs: u64,

    /// Fetch the whole catalog in one request instead of paging
    #[arg(long)]
    all: bool,

    /// Number of pages to load (0 loads until the catalog is exhausted)
    #[arg(long, default_value_t = 1)]
    pages: u32,

    /// Drop the persisted cache before loading
    #[arg(long)]
    clear_cache: bool,

    /// Show a single photo instead of the grid
    #[arg(long)]
    photo: Option<u64>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let api = HttpPhotoApi::new(&cli.base_url, Duration::from_secs(cli.timeout_secs))
        .context("Failed to create HTTP client")?;

    if let Some(id) = cli.photo {
        let photo = api
            .fetch_photo(PhotoId::new(id))
            .await
            .with_context(|| format!("Failed to fetch photo {id}"))?;
        println!("Photo {} {}", photo.id, photo.url);
        return Ok(());
    }

    let storage: Arc<dyn CacheStorage> = match &cli.cache_dir {
        Some(dir) => Arc::new(FileStorage::new(dir)),
        None => Arc::new(MemoryStorage::new()),
    };
    let cache = Arc::new(CacheManager::new(
        storage,
        Arc::new(SystemClock),
        CacheOptions {
            ttl: Duration::from_secs(cli.ttl_secs),
            ..CacheOptions::default()
        },
    ));

    let options = GalleryOptions {
        limit: cli.limit,
        mode: if cli.all {
            FetchMode::All
        } else {
            FetchMode::Paginated
        },
        ..GalleryOptions::default()
    };
    let gallery = Gallery::new(
        api,
        cache,
        TextRenderer::new(io::stdout()),
        TracingNotifier,
        options,
    );

    let first = if cli.clear_cache {
        gallery.clear_cache_and_reload().await
    } else {
        gallery.fetch_initial().await
    };
    if first.is_stale() {
        gallery.revalidate().await;
    }
    if let LoadOutcome::Failed(err) = first {
        bail!("Failed to load photos from {}: {}", cli.base_url, err);
    }

    let mut loaded_pages = 1;
    while cli.pages == 0 || loaded_pages < cli.pages {
        match gallery.load_more().await {
            LoadOutcome::Loaded { .. } => loaded_pages += 1,
            LoadOutcome::Failed(err) => bail!("Failed to load more photos: {}", err),
            LoadOutcome::Skipped | LoadOutcome::Superseded => break,
        }
    }

    let status = gallery.status();
    let cache_status = gallery.cache_status();
    tracing::debug!(?status, ?cache_status, "done");
    Ok(())
}
