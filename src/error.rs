//! Error taxonomy for a single event or notification attempt.
//!
//! Every variant is recovered at the boundary where it occurs: it is logged
//! and processing moves on to the next handler, event, or notifier.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// An event or alert batch could not be serialized.
    #[error("unable to encode payload: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    HandlerExecution(#[from] HandlerExecutionError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// The notification template could not be loaded or rendered.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("unable to read template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template error: {0}")]
    Render(#[from] minijinja::Error),
}

/// A handler subprocess could not be run to a successful exit.
#[derive(Error, Debug)]
pub enum HandlerExecutionError {
    #[error("unable to start handler {handler}: {source}")]
    Spawn {
        handler: String,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error while running handler {handler}: {source}")]
    Io {
        handler: String,
        #[source]
        source: std::io::Error,
    },

    #[error("handler {handler} exited with {status}")]
    NonZeroExit {
        handler: String,
        status: ExitStatus,
        output: String,
    },

    #[error("handler {handler} did not finish within {limit:?}")]
    TimedOut { handler: String, limit: Duration },
}

/// The mail transport refused or failed to deliver a message.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("unable to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("mail transport failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}
