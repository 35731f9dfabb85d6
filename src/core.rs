//! Core domain types and service traits
//!
//! This module defines the records that flow through the daemon (cluster
//! events and health-check alert records) and the trait contracts for the
//! external configuration source and for notification sinks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A cluster-level occurrence delivered for handler dispatch.
///
/// The canonical encoding handed to handlers is a JSON object with the keys
/// `ID`, `Name` and `Payload`, followed by any additional fields the upstream
/// system attached (for instance `NodeFilter` or `LTime`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    /// Unique identifier of the event
    #[serde(rename = "ID")]
    pub id: String,
    /// Event name, used to select the handlers to run
    pub name: String,
    /// Free-form payload attached by the sender
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Any other fields delivered with the event, kept as-is
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Event {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Status reported by a single health check.
///
/// Values other than `passing`, `warning` and `critical` are preserved as
/// `Unknown` so that they still render, but they are not counted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CheckStatus {
    Passing,
    Warning,
    Critical,
    Unknown(String),
}

impl CheckStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CheckStatus::Passing => "passing",
            CheckStatus::Warning => "warning",
            CheckStatus::Critical => "critical",
            CheckStatus::Unknown(other) => other,
        }
    }
}

impl From<String> for CheckStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "passing" => CheckStatus::Passing,
            "warning" => CheckStatus::Warning,
            "critical" => CheckStatus::Critical,
            _ => CheckStatus::Unknown(value),
        }
    }
}

impl From<&str> for CheckStatus {
    fn from(value: &str) -> Self {
        CheckStatus::from(value.to_string())
    }
}

impl From<CheckStatus> for String {
    fn from(status: CheckStatus) -> Self {
        match status {
            CheckStatus::Unknown(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single health-check observation (an alert record).
///
/// Encoded with PascalCase keys (`Node`, `Service`, `Check`, `Status`,
/// `Timestamp`, `Notes`, `Output`) on every wire: HTTP, log file and custom
/// notifier stdin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Message {
    /// Name of the node the check ran on
    pub node: String,
    /// Service the check belongs to, empty for node-level checks
    #[serde(default)]
    pub service: String,
    /// Name of the check
    pub check: String,
    pub status: CheckStatus,
    /// When the check entered its current status
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub output: String,
}

impl Message {
    pub fn is_critical(&self) -> bool {
        self.status == CheckStatus::Critical
    }

    pub fn is_warning(&self) -> bool {
        self.status == CheckStatus::Warning
    }

    pub fn is_passing(&self) -> bool {
        self.status == CheckStatus::Passing
    }
}

/// Cluster-wide status derived from a batch of alert records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverallStatus {
    #[default]
    Ok,
    Unstable,
    Critical,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OverallStatus::Ok => "OK",
            OverallStatus::Unstable => "UNSTABLE",
            OverallStatus::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Source of the cluster configuration consulted by the event path.
///
/// Implementations are read fresh on every relevant operation; the event
/// path never caches the values returned here.
pub trait ConfigProvider: Send + Sync {
    /// Refreshes the provider's view of the configuration.
    ///
    /// # Returns
    /// * `Err` if the configuration could not be read; the previous view
    ///   stays in effect.
    fn reload(&self) -> anyhow::Result<()>;

    /// Whether cluster events should be handled at all.
    fn events_enabled(&self) -> bool;

    /// The executables configured for an event name, in invocation order.
    fn event_handlers(&self, event_name: &str) -> Vec<String>;
}

/// A pluggable sink that turns a batch of alert records into a delivered
/// notification.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A short, unique name used for logging and metrics (e.g. "email").
    fn name(&self) -> &str;

    /// Delivers a notification for the given alerts.
    ///
    /// Returns `true` only if the notification was delivered. Failures are
    /// logged by the notifier itself.
    async fn notify(&self, alerts: &[Message]) -> bool;
}
