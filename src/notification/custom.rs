//! A notifier that hands the alert batch to external programs.
//!
//! Each configured program receives the batch as a JSON array of alert
//! records on stdin, using the same executor as event handlers.

use crate::core::{Message, Notifier};
use crate::events::HandlerExecutor;
use async_trait::async_trait;
use tracing::{error, info};

pub struct CustomNotifier {
    handlers: Vec<String>,
    executor: HandlerExecutor,
}

impl CustomNotifier {
    pub fn new(handlers: Vec<String>, executor: HandlerExecutor) -> Self {
        Self { handlers, executor }
    }
}

#[async_trait]
impl Notifier for CustomNotifier {
    fn name(&self) -> &str {
        "custom"
    }

    /// Runs every handler, even after a failure. Returns `true` only if all
    /// of them succeeded.
    async fn notify(&self, alerts: &[Message]) -> bool {
        let input = match serde_json::to_vec(alerts) {
            Ok(input) => input,
            Err(e) => {
                error!(error = %e, "Unable to encode alerts for custom notifiers");
                return false;
            }
        };

        let mut all_ok = true;
        for handler in &self.handlers {
            match self.executor.run_with_input(handler, input.clone()).await {
                Ok(output) => {
                    info!(
                        handler = %handler,
                        output = %String::from_utf8_lossy(&output),
                        "Custom notifier completed"
                    );
                }
                Err(e) => {
                    error!(handler = %handler, error = %e, "Custom notifier failed");
                    all_ok = false;
                }
            }
        }
        all_ok
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::CheckStatus;
    use chrono::Utc;

    fn alerts() -> Vec<Message> {
        vec![Message {
            node: "n1".to_string(),
            service: "redis".to_string(),
            check: "tcp".to_string(),
            status: CheckStatus::Warning,
            timestamp: Utc::now(),
            notes: String::new(),
            output: String::new(),
        }]
    }

    #[tokio::test]
    async fn test_all_handlers_succeed() {
        let notifier = CustomNotifier::new(
            vec!["cat".to_string(), "true".to_string()],
            HandlerExecutor::default(),
        );
        assert!(notifier.notify(&alerts()).await);
    }

    #[tokio::test]
    async fn test_one_failing_handler_fails_the_notification() {
        let notifier = CustomNotifier::new(
            vec!["false".to_string(), "cat".to_string()],
            HandlerExecutor::default(),
        );
        assert!(!notifier.notify(&alerts()).await);
    }
}
