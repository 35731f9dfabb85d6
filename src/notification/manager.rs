//! The notification manager is a long-lived actor that receives alert
//! batches and hands each one to every configured notifier.

use crate::core::{Message, Notifier};
use async_channel::Receiver;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// The `NotificationManager` actor.
pub struct NotificationManager {
    notifiers: Vec<Arc<dyn Notifier>>,
    alerts_rx: Receiver<Vec<Message>>,
}

impl NotificationManager {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>, alerts_rx: Receiver<Vec<Message>>) -> Self {
        Self {
            notifiers,
            alerts_rx,
        }
    }

    /// Runs the manager's main loop until shutdown or until the alert
    /// channel is closed.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(notifiers = self.notifiers.len(), "NotificationManager started.");
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("NotificationManager received shutdown signal.");
                    break;
                }
                result = self.alerts_rx.recv() => {
                    match result {
                        Ok(alerts) => {
                            self.dispatch(&alerts).await;
                        }
                        Err(_) => {
                            info!("Alert channel closed. Shutting down NotificationManager.");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Sends one batch to every notifier. Returns how many succeeded.
    pub async fn dispatch(&self, alerts: &[Message]) -> usize {
        if alerts.is_empty() {
            debug!("Empty alert batch, nothing to notify");
            return 0;
        }

        let mut delivered = 0;
        for notifier in &self.notifiers {
            let name = notifier.name().to_string();
            if notifier.notify(alerts).await {
                metrics::counter!("notifications_total", "notifier" => name, "outcome" => "success").increment(1);
                delivered += 1;
            } else {
                warn!(notifier = %name, "Notifier failed to deliver alert batch");
                metrics::counter!("notifications_total", "notifier" => name, "outcome" => "failure").increment(1);
            }
        }
        delivered
    }
}
