//! Aggregation of alert records into a cluster-wide summary.

use crate::core::{CheckStatus, Message, OverallStatus};
use std::collections::BTreeMap;

/// The aggregated view of a batch of alert records.
///
/// Computed fresh for every notification; never stored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlertSummary {
    pub status: OverallStatus,
    pub pass_count: usize,
    pub warn_count: usize,
    pub fail_count: usize,
    /// Alert records grouped by node name, in arrival order within a node.
    ///
    /// Node iteration order is not part of the contract.
    pub nodes: BTreeMap<String, Vec<Message>>,
}

impl AlertSummary {
    pub fn is_critical(&self) -> bool {
        self.status == OverallStatus::Critical
    }

    pub fn is_warning(&self) -> bool {
        self.status == OverallStatus::Unstable
    }

    pub fn is_passing(&self) -> bool {
        self.status == OverallStatus::Ok
    }

    /// Total number of alert records across all nodes.
    pub fn len(&self) -> usize {
        self.nodes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Summarizes a batch of alert records in a single pass.
///
/// Records with an unrecognized status are grouped under their node but are
/// left out of all three counts.
pub fn summarize(messages: &[Message]) -> AlertSummary {
    let mut summary = AlertSummary::default();

    for message in messages {
        match message.status {
            CheckStatus::Passing => summary.pass_count += 1,
            CheckStatus::Warning => summary.warn_count += 1,
            CheckStatus::Critical => summary.fail_count += 1,
            CheckStatus::Unknown(_) => {}
        }
        summary
            .nodes
            .entry(message.node.clone())
            .or_default()
            .push(message.clone());
    }

    summary.status = if summary.fail_count > 0 {
        OverallStatus::Critical
    } else if summary.warn_count > 0 {
        OverallStatus::Unstable
    } else {
        OverallStatus::Ok
    };

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn message(node: &str, check: &str, status: &str) -> Message {
        Message {
            node: node.to_string(),
            service: String::new(),
            check: check.to_string(),
            status: CheckStatus::from(status),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            notes: String::new(),
            output: String::new(),
        }
    }

    #[test]
    fn test_critical_takes_precedence_over_warning() {
        let summary = summarize(&[
            message("a", "disk", "critical"),
            message("a", "load", "warning"),
        ]);

        assert_eq!(summary.status, OverallStatus::Critical);
        assert_eq!(summary.fail_count, 1);
        assert_eq!(summary.warn_count, 1);
        assert_eq!(summary.pass_count, 0);
    }

    #[test]
    fn test_warning_without_critical_is_unstable() {
        let summary = summarize(&[
            message("a", "disk", "passing"),
            message("b", "load", "warning"),
        ]);
        assert_eq!(summary.status, OverallStatus::Unstable);
        assert!(summary.is_warning());
    }

    #[test]
    fn test_empty_batch_is_ok() {
        let summary = summarize(&[]);
        assert_eq!(summary.status, OverallStatus::Ok);
        assert_eq!(
            (summary.pass_count, summary.warn_count, summary.fail_count),
            (0, 0, 0)
        );
        assert!(summary.is_empty());
    }

    #[test]
    fn test_groups_by_node_preserving_arrival_order() {
        let summary = summarize(&[
            message("A", "http", "passing"),
            message("B", "disk", "critical"),
            message("A", "load", "warning"),
        ]);

        assert_eq!(summary.nodes.len(), 2);
        let a: Vec<_> = summary.nodes["A"].iter().map(|m| m.status.as_str()).collect();
        let b: Vec<_> = summary.nodes["B"].iter().map(|m| m.status.as_str()).collect();
        assert_eq!(a, vec!["passing", "warning"]);
        assert_eq!(b, vec!["critical"]);
        assert_eq!(
            (summary.pass_count, summary.warn_count, summary.fail_count),
            (1, 1, 1)
        );
        assert_eq!(summary.status, OverallStatus::Critical);
        assert_eq!(summary.len(), 3);
    }

    #[test]
    fn test_unknown_status_is_grouped_but_not_counted() {
        let summary = summarize(&[
            message("A", "http", "flapping"),
            message("A", "disk", "passing"),
        ]);

        assert_eq!(summary.pass_count, 1);
        assert_eq!(summary.warn_count, 0);
        assert_eq!(summary.fail_count, 0);
        assert_eq!(summary.status, OverallStatus::Ok);
        assert_eq!(summary.nodes["A"].len(), 2);
    }

    #[test]
    fn test_summarize_is_idempotent() {
        let batch = vec![
            message("x", "a", "warning"),
            message("y", "b", "passing"),
            message("x", "c", "critical"),
        ];
        assert_eq!(summarize(&batch), summarize(&batch));
    }
}
