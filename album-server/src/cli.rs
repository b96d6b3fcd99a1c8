use std::path::PathBuf;

use clap::Parser;

/// CLI for the album HTTP server. Every flag overrides the config file.
#[derive(Debug, Clone, Parser)]
#[command(name = "album-server", about = "Serve the photo album catalog over HTTP")]
pub struct Cli {
    /// Path to album.yml (optional; built-in defaults otherwise)
    #[arg(long, env = "ALBUM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen address for the HTTP API
    #[arg(long, env = "ALBUM_ADDR")]
    pub listen_addr: Option<String>,

    /// JSON catalog of `{id, url}` records
    #[arg(long, env = "ALBUM_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Directory holding static assets and the SPA entry point
    #[arg(long, env = "ALBUM_PUBLIC_DIR")]
    pub public_dir: Option<PathBuf>,

    /// Runtime mode: development, production or test
    #[arg(long, env = "ALBUM_ENV")]
    pub mode: Option<String>,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,
}
