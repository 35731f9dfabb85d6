//! Configuration management for the alert daemon
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer built-in defaults, a `clusteralert.toml`
//! file, `CLUSTERALERT_` environment variables and command-line arguments.
//!
//! It also provides `FileConfigProvider`, the `ConfigProvider` used by the
//! event path, which re-reads the `events` section on every reload.

use crate::cli::Cli;
use crate::core::ConfigProvider;
use anyhow::Result;
use arc_swap::ArcSwap;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration file used when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "clusteralert.toml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// HTTP transport settings.
    pub server: ServerConfig,
    /// Cluster event handling.
    pub events: EventsConfig,
    /// Notification sinks for alert batches.
    #[serde(default)]
    pub notifiers: NotifiersConfig,
    /// Prometheus metrics exporter.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address the HTTP transport listens on.
    pub listen_address: SocketAddr,
}

/// Configuration for cluster event handling.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct EventsConfig {
    /// Whether incoming event batches are dispatched at all.
    pub enabled: bool,
    /// Executables to run for each event name, in invocation order.
    pub handlers: HashMap<String, Vec<String>>,
    /// Number of batches the event queue holds before senders wait.
    pub queue_capacity: usize,
    /// Upper bound on a single handler run. `None` or `0` disables it.
    pub handler_timeout_seconds: Option<u64>,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            handlers: HashMap::new(),
            queue_capacity: 16,
            handler_timeout_seconds: default_handler_timeout(),
        }
    }
}

impl EventsConfig {
    pub fn handler_timeout(&self) -> Option<Duration> {
        bounded(self.handler_timeout_seconds)
    }
}

/// The set of configured notifiers. Absent sections are disabled.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct NotifiersConfig {
    pub email: Option<EmailConfig>,
    pub log: Option<LogNotifierConfig>,
    pub custom: Option<CustomNotifierConfig>,
}

fn default_true() -> bool {
    true
}

fn default_handler_timeout() -> Option<u64> {
    Some(60)
}

fn bounded(seconds: Option<u64>) -> Option<Duration> {
    seconds.filter(|secs| *secs > 0).map(Duration::from_secs)
}

/// Configuration for email notifications.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    /// Cluster name shown in the subject and body.
    pub cluster_name: String,
    /// Path to a template overriding the built-in one.
    pub template: Option<PathBuf>,
    /// SMTP server host name.
    pub url: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub sender_alias: String,
    pub sender_email: String,
    pub receivers: Vec<String>,
    /// SMTP connection timeout.
    pub timeout_seconds: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cluster_name: "cluster".to_string(),
            template: None,
            url: "localhost".to_string(),
            port: 25,
            username: String::new(),
            password: String::new(),
            sender_alias: "Cluster Alerts".to_string(),
            sender_email: String::new(),
            receivers: Vec::new(),
            timeout_seconds: 30,
        }
    }
}

/// Configuration for the log-file notifier.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LogNotifierConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub path: PathBuf,
}

/// Configuration for the external-program notifier.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CustomNotifierConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub handlers: Vec<String>,
    /// Upper bound on a single handler run. `0` disables it.
    #[serde(default = "default_handler_timeout")]
    pub timeout_seconds: Option<u64>,
}

impl CustomNotifierConfig {
    pub fn handler_timeout(&self) -> Option<Duration> {
        bounded(self.timeout_seconds)
    }
}

/// Configuration for the Prometheus metrics exporter.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub listen_address: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_address: SocketAddr::from(([127, 0, 0, 1], 9090)),
        }
    }
}

impl Config {
    /// Loads the application configuration, layering defaults, the TOML
    /// file, environment variables and command-line arguments.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config: Config = base_figment(&cli.config_path())
            .merge(cli.clone())
            .extract()?;
        Ok(config)
    }
}

/// Defaults, file and environment layers shared by `Config::load` and
/// `FileConfigProvider::reload`.
fn base_figment(config_path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(config_path))
        // e.g. CLUSTERALERT_EVENTS__ENABLED=false
        .merge(Env::prefixed("CLUSTERALERT_").split("__"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerConfig {
                listen_address: SocketAddr::from(([127, 0, 0, 1], 9000)),
            },
            events: EventsConfig::default(),
            notifiers: NotifiersConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// A `ConfigProvider` backed by the configuration file and environment.
///
/// `reload` re-extracts the `events` section and swaps it in atomically, so
/// readers always see a complete snapshot.
pub struct FileConfigProvider {
    path: PathBuf,
    events: ArcSwap<EventsConfig>,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>, initial: EventsConfig) -> Self {
        Self {
            path: path.into(),
            events: ArcSwap::from_pointee(initial),
        }
    }

    /// The snapshot currently in effect.
    pub fn current(&self) -> Arc<EventsConfig> {
        self.events.load_full()
    }
}

impl ConfigProvider for FileConfigProvider {
    fn reload(&self) -> Result<()> {
        let events: EventsConfig = base_figment(&self.path)
            .extract_inner("events")
            .map_err(|e| {
                warn!(path = %self.path.display(), error = %e, "Failed to reload configuration, keeping previous values");
                e
            })?;
        debug!(enabled = events.enabled, handlers = events.handlers.len(), "Reloaded event configuration");
        self.events.store(Arc::new(events));
        Ok(())
    }

    fn events_enabled(&self) -> bool {
        self.events.load().enabled
    }

    fn event_handlers(&self, event_name: &str) -> Vec<String> {
        self.events
            .load()
            .handlers
            .get(event_name)
            .cloned()
            .unwrap_or_default()
    }
}
