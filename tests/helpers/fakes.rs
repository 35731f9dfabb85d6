#![allow(dead_code)]
//! Fake collaborators that record how they were used.

use async_trait::async_trait;
use clusteralert::core::{ConfigProvider, Message, Notifier};
use clusteralert::error::DeliveryError;
use clusteralert::notification::MailTransport;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// A `ConfigProvider` with in-memory values that records every handler
/// lookup, which is the dispatcher's per-event processing order.
#[derive(Default)]
pub struct RecordingConfig {
    pub disabled: AtomicBool,
    pub handlers: Mutex<HashMap<String, Vec<String>>>,
    pub lookups: Mutex<Vec<String>>,
    pub reloads: AtomicUsize,
    pub looked_up: Notify,
}

impl RecordingConfig {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.disabled.store(!enabled, Ordering::SeqCst);
    }

    pub fn set_handlers(&self, event_name: &str, handlers: &[&str]) {
        self.handlers.lock().unwrap().insert(
            event_name.to_string(),
            handlers.iter().map(|h| h.to_string()).collect(),
        );
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    /// Waits until at least `count` events have been processed.
    pub async fn wait_for_lookups(&self, count: usize, timeout: Duration) {
        let wait = async {
            loop {
                let notified = self.looked_up.notified();
                if self.lookups.lock().unwrap().len() >= count {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait)
            .await
            .expect("Timed out waiting for events to be dispatched");
    }
}

impl ConfigProvider for RecordingConfig {
    fn reload(&self) -> anyhow::Result<()> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn events_enabled(&self) -> bool {
        !self.disabled.load(Ordering::SeqCst)
    }

    fn event_handlers(&self, event_name: &str) -> Vec<String> {
        self.lookups.lock().unwrap().push(event_name.to_string());
        self.looked_up.notify_waiters();
        self.handlers
            .lock()
            .unwrap()
            .get(event_name)
            .cloned()
            .unwrap_or_default()
    }
}

/// A notifier that records every batch it receives.
pub struct RecordingNotifier {
    name: &'static str,
    succeed: bool,
    pub batches: Mutex<Vec<Vec<Message>>>,
    pub received: Notify,
}

impl RecordingNotifier {
    pub fn new(name: &'static str, succeed: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            succeed,
            batches: Mutex::new(Vec::new()),
            received: Notify::new(),
        })
    }

    pub fn batches(&self) -> Vec<Vec<Message>> {
        self.batches.lock().unwrap().clone()
    }

    pub async fn wait_for_batches(&self, count: usize, timeout: Duration) {
        let wait = async {
            loop {
                let notified = self.received.notified();
                if self.batches.lock().unwrap().len() >= count {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait)
            .await
            .expect("Timed out waiting for alert batches");
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        self.name
    }

    async fn notify(&self, alerts: &[Message]) -> bool {
        self.batches.lock().unwrap().push(alerts.to_vec());
        self.received.notify_waiters();
        self.succeed
    }
}

/// A mail transport that keeps the formatted messages.
#[derive(Default)]
pub struct CapturingTransport {
    pub sent: Mutex<Vec<String>>,
    pub fail: bool,
}

#[async_trait]
impl MailTransport for CapturingTransport {
    async fn send(&self, message: lettre::Message) -> Result<(), DeliveryError> {
        if self.fail {
            return Err(DeliveryError::Transport("connection refused".into()));
        }
        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();
        self.sent.lock().unwrap().push(raw);
        Ok(())
    }
}
