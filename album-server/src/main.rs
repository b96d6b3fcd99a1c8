//! album-server: JSON API over a static photo catalog, plus the SPA shell.

use anyhow::Result;
use clap::Parser;

use album_server::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    album_server::run_with_cli(cli).await
}
