//! A notification daemon for cluster health and cluster events.
//!
//! Cluster events are admitted through an `IngressGate`, queued on a bounded
//! channel and dispatched by a single worker to external handler programs.
//! Batches of health-check alert records are summarized, rendered and handed
//! to pluggable notifiers (email, log file, external programs).

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod internal_metrics;
pub mod notification;
pub mod server;
pub mod summary;
pub mod task_manager;

// Re-export core types for convenience
pub use crate::core::*;
pub use crate::error::Error;
pub use crate::summary::{summarize, AlertSummary};
