//! The ingress gate: the boundary between the transport and the event queue.

use crate::core::ConfigProvider;
use crate::events::dispatcher::EventBatch;
use async_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// What the gate did with a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The first batch after start-up is a connectivity probe and is dropped.
    WarmUp,
    /// Event handling is disabled by configuration; the batch was dropped.
    Disabled,
    /// The batch was handed to the dispatcher queue.
    Queued,
    /// The dispatcher is gone; the batch could not be queued.
    Closed,
}

impl Admission {
    /// Whether the caller should report success upstream. Dropping a batch
    /// on purpose is not a failure.
    pub fn is_accepted(self) -> bool {
        !matches!(self, Admission::Closed)
    }
}

pub struct IngressGate {
    config: Arc<dyn ConfigProvider>,
    batches_tx: Sender<EventBatch>,
    /// Set by the first admitted call.
    armed: AtomicBool,
}

impl IngressGate {
    pub fn new(config: Arc<dyn ConfigProvider>, batches_tx: Sender<EventBatch>) -> Self {
        Self {
            config,
            batches_tx,
            armed: AtomicBool::new(false),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Admits a batch of events.
    ///
    /// Waits while the event queue is full.
    pub async fn admit(&self, batch: EventBatch) -> Admission {
        if let Err(e) = self.config.reload() {
            warn!(error = %e, "Unable to refresh configuration, using previous values");
        }

        if !self.armed.swap(true, Ordering::SeqCst) {
            info!("Now watching for events.");
            metrics::counter!("events_dropped_total", "reason" => "warmup")
                .increment(batch.len() as u64);
            return Admission::WarmUp;
        }

        if !self.config.events_enabled() {
            info!(events = batch.len(), "Event handling disabled. Event ignored.");
            metrics::counter!("events_dropped_total", "reason" => "disabled")
                .increment(batch.len() as u64);
            return Admission::Disabled;
        }

        let count = batch.len();
        match self.batches_tx.send(batch).await {
            Ok(()) => {
                metrics::counter!("events_received_total").increment(count as u64);
                info!(events = count, "Event batch queued");
                Admission::Queued
            }
            Err(_) => {
                warn!(events = count, "Event queue is closed, batch dropped");
                Admission::Closed
            }
        }
    }
}
