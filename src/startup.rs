use crate::components::event_cache::{EventCache, JsonFileCacheStore};
use crate::components::overlay::{
    read_commands, spawn_key_reader, start_scheduler, OverlayHandle, TerminalPresenter,
    TerminalSession,
};
use crate::components::{CalendarProvider, GoogleCalendarHandle};
use crate::config::{Config, ConfigStore, JsonConfigStore};
use crate::error::Error;
use crate::shutdown;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        // stdout belongs to the overlay
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Wire up the actors and run the overlay until shutdown
pub async fn start_overlay(config: Config) -> miette::Result<()> {
    rust_i18n::set_locale(&config.locale);
    info!("Setting locale to {}", config.locale);

    let settings: Arc<dyn ConfigStore> = Arc::new(JsonConfigStore::new(&config.settings_file));
    let cache = EventCache::new(Arc::new(JsonFileCacheStore::new(&config.cache_file)));
    let refresh_interval = Duration::from_secs(config.refresh_interval);
    let tick = Duration::from_millis(config.tick_millis);
    let event_count = config.event_count;

    let config = Arc::new(RwLock::new(config));
    let calendar = GoogleCalendarHandle::new(Arc::clone(&config), Arc::clone(&settings));
    let provider: Arc<dyn CalendarProvider> = Arc::new(calendar.clone());
    let overlay = OverlayHandle::new(provider, cache, settings, event_count);

    match overlay.refresh().await {
        Ok(outcome) => info!("Initial refresh: {:?}", outcome),
        Err(e) => error!("Initial refresh failed: {}", e),
    }

    // Restores the terminal when start_overlay returns
    let _session = TerminalSession::enter()?;
    let tasks = start_scheduler(overlay.clone(), TerminalPresenter::stdout(), refresh_interval, tick);

    let (command_tx, command_rx) = mpsc::channel(8);
    let key_reader = spawn_key_reader(command_tx);

    let (quit_tx, quit_rx) = oneshot::channel();
    let input_overlay = overlay.clone();
    let input_task = tokio::spawn(async move {
        read_commands(command_rx, input_overlay, quit_tx).await;
    });

    let (shutdown_send, shutdown_recv) = oneshot::channel();
    let signal_overlay = overlay.clone();
    let signal_calendar = calendar.clone();
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, signal_overlay, signal_calendar).await;
    });

    tokio::select! {
        _ = shutdown_recv => {
            info!("Received shutdown signal, stopping overlay...");
        }
        _ = wait_for_quit(quit_rx) => {
            info!("Quit requested, stopping overlay...");
            shutdown::shutdown_components(&overlay, &calendar).await;
        }
    }

    input_task.abort();
    for task in tasks {
        task.abort();
    }
    // Dropping the command receiver lets the key reader finish its poll and exit
    let _ = input_task.await;
    let _ = key_reader.await;

    Ok(())
}

/// Resolves only when a quit was actually requested, not when input closes
async fn wait_for_quit(quit_rx: oneshot::Receiver<()>) {
    if quit_rx.await.is_err() {
        std::future::pending::<()>().await;
    }
}
