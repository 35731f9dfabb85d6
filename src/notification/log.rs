//! A notifier that appends alert records to a log file, one JSON object
//! per line.

use crate::core::{Message, Notifier};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};

pub struct LogNotifier {
    path: PathBuf,
}

impl LogNotifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn append(&self, alerts: &[Message]) -> anyhow::Result<()> {
        let mut lines = Vec::new();
        for alert in alerts {
            serde_json::to_writer(&mut lines, alert)?;
            lines.push(b'\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&lines).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, alerts: &[Message]) -> bool {
        match self.append(alerts).await {
            Ok(()) => {
                info!(path = %self.path.display(), alerts = alerts.len(), "Alerts written to log file.");
                true
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Unable to write alerts to log file");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CheckStatus;
    use chrono::Utc;
    use tempfile::tempdir;

    fn alert(node: &str, status: &str) -> Message {
        Message {
            node: node.to_string(),
            service: String::new(),
            check: "serfHealth".to_string(),
            status: CheckStatus::from(status),
            timestamp: Utc::now(),
            notes: String::new(),
            output: "Agent not live or unreachable".to_string(),
        }
    }

    #[tokio::test]
    async fn test_appends_one_line_per_alert() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("alerts.log");
        let notifier = LogNotifier::new(&path);

        assert!(notifier.notify(&[alert("a", "critical")]).await);
        assert!(notifier.notify(&[alert("b", "passing"), alert("c", "warning")]).await);

        let contents = std::fs::read_to_string(&path).unwrap();
        let nodes: Vec<String> = contents
            .lines()
            .map(|line| serde_json::from_str::<Message>(line).unwrap().node)
            .collect();
        assert_eq!(nodes, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_unwritable_path_returns_false() {
        let dir = tempdir().unwrap();
        let notifier = LogNotifier::new(dir.path().join("missing-dir").join("alerts.log"));
        assert!(!notifier.notify(&[alert("a", "critical")]).await);
    }
}
