mod logging;
mod slideshow;

use anyhow::Context;
use pmoconfig::Config;
use pmoplaylist::PlaybackScheduler;
use pmoscan::DirectoryScanner;
use slideshow::{Slideshow, TracingSink};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ========== PHASE 1 : Configuration et logs ==========
    let config = Arc::new(Config::load_config("").context("Failed to load configuration")?);
    logging::init_logging(&config);
    info!(config_dir = %config.directory().display(), "📷 PMOPhoto starting");

    // ========== PHASE 2 : Playlist et scan initial ==========
    let playlist = Arc::new(PlaybackScheduler::new());
    let scanner = Arc::new(
        DirectoryScanner::from_config(&config, playlist.clone())
            .context("Failed to prepare photo directory")?,
    );

    let scanner_init = scanner.clone();
    let count = tokio::task::spawn_blocking(move || scanner_init.initial_scan()).await??;
    info!(count, directory = %scanner.directory().display(), "✅ Photo backlog loaded");

    // ========== PHASE 3 : Surveillance et diaporama ==========
    let stop = CancellationToken::new();
    let watcher = scanner.clone().watch(config.get_rescan_interval(), stop.clone());

    let slideshow = Slideshow::from_config(&config, playlist.clone(), TracingSink);
    let slideshow_stop = stop.clone();
    let show = tokio::spawn(async move { slideshow.run(slideshow_stop).await });

    info!("Press Ctrl+C to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C, stopping now");
    }

    info!("🛑 Shutting down");
    stop.cancel();

    if let Err(e) = watcher.await {
        warn!(error = %e, "Directory watcher ended abnormally");
    }
    let shown = show.await.context("Slideshow task failed")?;

    let stats = playlist.stats();
    info!(
        shown,
        fresh = stats.fresh,
        pool = stats.pool,
        already_shown = stats.shown,
        cycles = stats.cycles,
        "👋 PMOPhoto stopped"
    );

    Ok(())
}
