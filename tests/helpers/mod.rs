#![allow(dead_code)]
pub mod app;
pub mod fakes;

use chrono::{TimeZone, Utc};
use clusteralert::core::{CheckStatus, Message};

/// Builds an alert record with a fixed timestamp.
pub fn message(node: &str, check: &str, status: &str) -> Message {
    Message {
        node: node.to_string(),
        service: String::new(),
        check: check.to_string(),
        status: CheckStatus::from(status),
        timestamp: Utc.with_ymd_and_hms(2024, 5, 17, 8, 30, 0).unwrap(),
        notes: String::new(),
        output: format!("{check} is {status}"),
    }
}
