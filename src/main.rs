//! clusteralert - cluster event handler and alert notifier
//!
//! Loads configuration, initializes logging and runs the daemon until
//! Ctrl-C.

use anyhow::Result;
use clap::Parser;
use clusteralert::{app::App, cli::Cli, config::Config};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            tracing_subscriber::fmt().init();
            error!("Failed to load configuration: {}", err);
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("clusteralert starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Config File: {}", cli.config_path().display());
    info!("Log Level: {}", config.log_level);
    info!("Listen Address: {}", config.server.listen_address);
    info!("Events Enabled: {}", config.events.enabled);
    info!("Event Handlers: {} event name(s)", config.events.handlers.len());
    info!("Event Queue Capacity: {}", config.events.queue_capacity);
    match config.events.handler_timeout() {
        Some(timeout) => info!("Handler Timeout: {}s", timeout.as_secs()),
        None => info!("Handler Timeout: none"),
    }
    info!(
        "Email Notifier: {}",
        enabled(config.notifiers.email.as_ref().map(|c| c.enabled))
    );
    info!(
        "Log Notifier: {}",
        enabled(config.notifiers.log.as_ref().map(|c| c.enabled))
    );
    info!(
        "Custom Notifier: {}",
        enabled(config.notifiers.custom.as_ref().map(|c| c.enabled))
    );
    info!("-------------------------------------------------------");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let app = App::builder(config)
        .config_path(cli.config_path())
        .build(shutdown_rx)
        .await?;

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        info!("Shutdown signal received. Shutting down gracefully...");
        let _ = shutdown_tx.send(true);
    });

    app.run().await?;
    info!("All tasks shut down. Exiting.");
    Ok(())
}

fn enabled(flag: Option<bool>) -> &'static str {
    if flag.unwrap_or(false) {
        "Enabled"
    } else {
        "Disabled"
    }
}
