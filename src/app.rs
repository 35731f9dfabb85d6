//! The main application logic, decoupled from the entry point.

use crate::{
    config::{Config, FileConfigProvider},
    core::{ConfigProvider, Message, Notifier},
    events::{event_queue, EventDispatcher, HandlerExecutor, IngressGate},
    internal_metrics::MetricsBuilder,
    notification::{build_notifiers, NotificationManager},
    server::{HttpServer, ServerState},
    task_manager::TaskManager,
};
use anyhow::Result;
use async_channel::Sender;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, instrument};

/// Number of alert batches buffered between the transport and the
/// notification manager.
const ALERT_QUEUE_CAPACITY: usize = 64;

/// A handle to the running application.
pub struct App {
    task_manager: TaskManager,
    local_addr: SocketAddr,
    metrics_addr: Option<SocketAddr>,
    gate: Arc<IngressGate>,
    alerts_tx: Sender<Vec<Message>>,
}

impl App {
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// Address the HTTP transport is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn metrics_addr(&self) -> Option<SocketAddr> {
        self.metrics_addr
    }

    /// The ingress gate, for callers that bypass the HTTP transport.
    pub fn gate(&self) -> Arc<IngressGate> {
        self.gate.clone()
    }

    /// Sender feeding alert batches to the notification manager.
    pub fn alerts_tx(&self) -> Sender<Vec<Message>> {
        self.alerts_tx.clone()
    }

    /// Waits for the shutdown signal and then for every task to finish.
    pub async fn run(self) -> Result<()> {
        let mut shutdown_rx = self.task_manager.shutdown_rx();
        let _ = shutdown_rx.changed().await;
        info!("Shutdown signal received. Waiting for tasks to complete...");

        // Close the queues so nothing new is accepted while draining.
        self.alerts_tx.close();
        let panicked = self.task_manager.join_all().await;
        if !panicked.is_empty() {
            anyhow::bail!("{} task(s) panicked: {:?}", panicked.len(), panicked);
        }
        Ok(())
    }
}

/// Builder for the main application.
///
/// Components can be overridden for tests.
pub struct AppBuilder {
    config: Config,
    config_path: PathBuf,
    config_provider_override: Option<Arc<dyn ConfigProvider>>,
    notifiers_override: Option<Vec<Arc<dyn Notifier>>>,
    listener_override: Option<TcpListener>,
}

impl AppBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            config_path: PathBuf::from(crate::config::DEFAULT_CONFIG_PATH),
            config_provider_override: None,
            notifiers_override: None,
            listener_override: None,
        }
    }

    /// The file the event configuration is reloaded from.
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    /// Overrides the configuration provider used by the event path.
    pub fn config_provider_override(mut self, provider: Arc<dyn ConfigProvider>) -> Self {
        self.config_provider_override = Some(provider);
        self
    }

    /// Overrides the notifiers built from the configuration.
    pub fn notifiers_override(mut self, notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        self.notifiers_override = Some(notifiers);
        self
    }

    /// Serves HTTP on an already bound listener instead of binding
    /// `server.listen_address`.
    pub fn listener_override(mut self, listener: TcpListener) -> Self {
        self.listener_override = Some(listener);
        self
    }

    /// Builds and starts all components, returning a runnable `App`.
    #[instrument(skip_all)]
    pub async fn build(self, shutdown_rx: watch::Receiver<bool>) -> Result<App> {
        let config = self.config;
        let task_manager = TaskManager::new(shutdown_rx);

        // =========================================================================
        // 1. Metrics
        // =========================================================================
        let metrics_addr = match MetricsBuilder::new(config.metrics.clone())
            .build(task_manager.shutdown_rx())
            .await?
        {
            Some((server, addr)) => {
                task_manager.spawn("MetricsServer", server.run());
                Some(addr)
            }
            None => None,
        };

        // =========================================================================
        // 2. Event path: gate -> bounded queue -> dispatcher
        // =========================================================================
        let config_provider = match self.config_provider_override {
            Some(provider) => provider,
            None => Arc::new(FileConfigProvider::new(
                self.config_path,
                config.events.clone(),
            )) as Arc<dyn ConfigProvider>,
        };

        let (batches_tx, batches_rx) = event_queue(config.events.queue_capacity);
        let executor = HandlerExecutor::new(config.events.handler_timeout());
        let dispatcher = EventDispatcher::new(config_provider.clone(), executor, batches_rx);
        task_manager.spawn("EventDispatcher", dispatcher.run(task_manager.shutdown_rx()));

        let gate = Arc::new(IngressGate::new(config_provider, batches_tx));

        // =========================================================================
        // 3. Notification path
        // =========================================================================
        let notifiers = match self.notifiers_override {
            Some(notifiers) => notifiers,
            None => build_notifiers(&config.notifiers)?,
        };
        let (alerts_tx, alerts_rx) = async_channel::bounded(ALERT_QUEUE_CAPACITY);
        let manager = NotificationManager::new(notifiers, alerts_rx);
        task_manager.spawn("NotificationManager", manager.run(task_manager.shutdown_rx()));

        // =========================================================================
        // 4. HTTP transport
        // =========================================================================
        let listener = match self.listener_override {
            Some(listener) => listener,
            None => TcpListener::bind(config.server.listen_address).await?,
        };
        let local_addr = listener.local_addr()?;
        let state = ServerState {
            gate: gate.clone(),
            alerts_tx: alerts_tx.clone(),
        };
        let server = HttpServer::new(listener, state, task_manager.shutdown_rx());
        task_manager.spawn("HttpServer", server.run());

        info!(%local_addr, "Alert daemon initialized.");

        Ok(App {
            task_manager,
            local_addr,
            metrics_addr,
            gate,
            alerts_tx,
        })
    }
}
