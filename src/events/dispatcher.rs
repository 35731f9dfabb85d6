//! The event dispatcher: the single consumer of the event queue.
//!
//! Batches are taken from the queue in the order they were sent. Within a
//! batch, events are processed in their given order, and for each event the
//! configured handlers run one after another. A failing handler never stops
//! its siblings or later events.

use crate::core::{ConfigProvider, Event};
use crate::error::Error;
use crate::events::executor::HandlerExecutor;
use async_channel::{Receiver, Sender};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// A batch of events as delivered by one ingestion call.
pub type EventBatch = Vec<Event>;

/// Creates the bounded queue between the ingress gate and the dispatcher.
///
/// Once `capacity` batches are waiting, senders wait until the dispatcher
/// takes one. A capacity of zero is treated as one.
pub fn event_queue(capacity: usize) -> (Sender<EventBatch>, Receiver<EventBatch>) {
    async_channel::bounded(capacity.max(1))
}

/// The outcome of one handler invocation for one event.
#[derive(Debug)]
pub struct HandlerRun {
    pub handler: String,
    pub result: Result<Vec<u8>, Error>,
}

pub struct EventDispatcher {
    config: Arc<dyn ConfigProvider>,
    executor: HandlerExecutor,
    batches_rx: Receiver<EventBatch>,
}

impl EventDispatcher {
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        executor: HandlerExecutor,
        batches_rx: Receiver<EventBatch>,
    ) -> Self {
        Self {
            config,
            executor,
            batches_rx,
        }
    }

    /// Runs the dispatch loop until shutdown is signalled or every sender
    /// has been dropped. A batch that has been taken off the queue is always
    /// processed to the end.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("Event dispatcher started.");
        loop {
            let batch = tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Event dispatcher received shutdown signal.");
                    break;
                }
                res = self.batches_rx.recv() => res,
            };

            match batch {
                Ok(batch) => self.process_batch(batch).await,
                Err(_) => {
                    info!("Event queue closed, dispatcher shutting down.");
                    break;
                }
            }
        }
        info!("Event dispatcher finished.");
    }

    pub async fn process_batch(&self, batch: EventBatch) {
        debug!(events = batch.len(), "Dispatching event batch");
        for event in &batch {
            self.process_event(event).await;
        }
    }

    /// Runs every handler configured for the event's name, in order.
    pub async fn process_event(&self, event: &Event) -> Vec<HandlerRun> {
        info!(event_id = %event.id, event_name = %event.name, "Processing event");
        let handlers = self.config.event_handlers(&event.name);
        if handlers.is_empty() {
            debug!(event_name = %event.name, "No handlers configured for event");
        }

        let mut runs = Vec::with_capacity(handlers.len());
        for handler in handlers {
            let result = self.executor.run(event, &handler).await;
            match &result {
                Ok(output) => {
                    metrics::counter!("handler_runs_total", "outcome" => "success").increment(1);
                    info!(
                        event_id = %event.id,
                        handler = %handler,
                        output = %String::from_utf8_lossy(output),
                        "Handler completed"
                    );
                }
                Err(e) => {
                    metrics::counter!("handler_runs_total", "outcome" => "failure").increment(1);
                    warn!(event_id = %event.id, handler = %handler, error = %e, "Error running handler");
                }
            }
            runs.push(HandlerRun { handler, result });
        }

        info!(event_id = %event.id, "Event processed");
        runs
    }
}
