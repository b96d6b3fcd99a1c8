use std::path::{Path, PathBuf};

use album_core::{Config, RuntimeMode};
use anyhow::{Context, Result};

use crate::cli::Cli;

/// Runtime configuration derived from the config file plus CLI/env overrides.
#[derive(Debug, Clone)]
pub struct AlbumConfig {
    pub listen_addr: String,
    pub public_dir: PathBuf,
    pub mode: RuntimeMode,
    /// File-level settings, with catalog overrides already applied
    pub site: Config,
}

impl AlbumConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut site = match &cli.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("Failed to load config {:?}", path))?,
            None => Config::default(),
        };

        // A catalog given on the command line replaces whatever the file declared.
        if let Some(catalog) = &cli.catalog {
            site.photos = None;
            site.paths.catalog = Some(absolutize(catalog)?);
        }

        let mode = match &cli.mode {
            Some(raw) => raw.parse::<RuntimeMode>()?,
            None => site.runtime_mode()?,
        };

        let listen_addr = cli
            .listen_addr
            .clone()
            .unwrap_or_else(|| site.server.listen_addr.clone());

        let public_dir = match &cli.public_dir {
            Some(dir) => absolutize(dir)?,
            None => site.public_dir(),
        };

        Ok(Self {
            listen_addr,
            public_dir,
            mode,
            site,
        })
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_relative() {
        Ok(std::env::current_dir()?.join(path))
    } else {
        Ok(path.to_path_buf())
    }
}
