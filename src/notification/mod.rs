//! Alert notification: rendering, the notifier implementations and the
//! manager that fans alert batches out to them.
//!
//! Every sink implements the `Notifier` trait and is selected by
//! configuration, so the manager never needs to know which kinds exist.

pub mod custom;
pub mod email;
pub mod log;
pub mod manager;
pub mod render;

use crate::config::NotifiersConfig;
use crate::core::Notifier;
use crate::events::HandlerExecutor;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

pub use custom::CustomNotifier;
pub use email::{EmailNotifier, MailTransport, SmtpMailer};
pub use log::LogNotifier;
pub use manager::NotificationManager;
pub use render::{render, render_template, TemplateSource};

/// Builds the notifiers enabled in the configuration.
pub fn build_notifiers(config: &NotifiersConfig) -> Result<Vec<Arc<dyn Notifier>>> {
    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();

    if let Some(email) = config.email.as_ref().filter(|c| c.enabled) {
        info!(server = %email.url, port = email.port, receivers = email.receivers.len(), "Email notifier enabled.");
        notifiers.push(Arc::new(EmailNotifier::new(email.clone())?));
    }

    if let Some(log) = config.log.as_ref().filter(|c| c.enabled) {
        info!(path = %log.path.display(), "Log notifier enabled.");
        notifiers.push(Arc::new(LogNotifier::new(log.path.clone())));
    }

    if let Some(custom) = config.custom.as_ref().filter(|c| c.enabled) {
        info!(handlers = custom.handlers.len(), "Custom notifier enabled.");
        notifiers.push(Arc::new(CustomNotifier::new(
            custom.handlers.clone(),
            HandlerExecutor::new(custom.handler_timeout()),
        )));
    }

    Ok(notifiers)
}
