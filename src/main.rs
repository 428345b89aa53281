mod app;
mod cli;
mod clock;
mod config;
mod db;
mod event;
mod export;
mod host;
mod logging;
mod session;
mod store;
mod time_utils;
mod tui;
mod types;
mod ui;
mod updater;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use tracing::{error, info};

use crate::clock::SystemClock;
use crate::config::AppConfig;
use crate::host::{Host, LocalHost};
use crate::session::{SessionSettings, TimerController};
use crate::store::{AppStore, TimerStore};

/// Soft-deleted rows older than this are removed on startup.
const PURGE_AFTER_DAYS: i64 = 30;

#[tokio::main]
async fn main() -> Result<()> {
    let cli_opts = cli::Cli::parse();
    let config = AppConfig::load()?;
    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!("Failed to create data directory {}", config.data_dir.display())
    })?;

    let prefix = if cli_opts.command.is_some() {
        logging::CLI_PREFIX
    } else {
        logging::TUI_PREFIX
    };
    logging::enable_logging(prefix, &config.log_dir(), &config.log_level, cli_opts.verbose)?;

    let conn = db::init(&config.db_path())?;
    let purged = db::purge_soft_deleted(Utc::now() - Duration::days(PURGE_AFTER_DAYS), &conn)?;
    if purged > 0 {
        info!(purged, "removed old deleted records");
    }
    let host = LocalHost::new(conn, config.data_dir.clone(), SystemClock, config.bell);

    if let Some(command) = cli_opts.command {
        return cli::run(command, &host, &config).await;
    }

    let host: Arc<dyn Host> = Arc::new(host);
    let app_store = AppStore::load(&config.selection_path(), config.alert_minutes)?;
    let (controller, mut session_events) = TimerController::new(
        host,
        TimerStore::new(),
        app_store,
        SessionSettings::from_config(&config),
    );
    controller.restore().await?;

    let mut app = app::App::new(controller.clone());
    let mut terminal = tui::init()?;
    let result = event::run(&mut app, &mut terminal, &mut session_events).await;

    tui::restore()?;
    if let Err(e) = controller.shutdown().await {
        error!(error = %e, "could not stop the timer on exit");
    }

    result
}
