#![allow(dead_code)]
//! Test helpers for running the full application instance.

use anyhow::Result;
use clusteralert::{
    app::{App, AppBuilder},
    config::Config,
    core::{ConfigProvider, Notifier},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::{net::TcpListener, sync::watch, task::JoinHandle, time::timeout};

/// A running instance of the application for testing purposes.
pub struct TestApp {
    pub addr: SocketAddr,
    pub shutdown_tx: watch::Sender<bool>,
    pub app_handle: JoinHandle<Result<()>>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Shuts down the application and waits for it to terminate.
    pub async fn shutdown(self, timeout_duration: Duration) -> Result<()> {
        self.shutdown_tx.send(true)?;
        match timeout(timeout_duration, self.app_handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(anyhow::anyhow!("App failed to shut down within the timeout")),
        }
    }
}

/// Starts the application on an ephemeral port with the given fakes.
pub async fn spawn_app(
    config_provider: Arc<dyn ConfigProvider>,
    notifiers: Vec<Arc<dyn Notifier>>,
) -> Result<TestApp> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let app: App = AppBuilder::new(Config::default())
        .config_provider_override(config_provider)
        .notifiers_override(notifiers)
        .listener_override(listener)
        .build(shutdown_rx)
        .await?;
    let addr = app.local_addr();
    let app_handle = tokio::spawn(app.run());

    Ok(TestApp {
        addr,
        shutdown_tx,
        app_handle,
    })
}
