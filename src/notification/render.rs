//! Renders an alert summary into a notification body.
//!
//! The template is a strategy: the built-in HTML template, or a file given
//! by the operator. A file that cannot be read or rendered fails the render;
//! there is no fallback to the built-in template once a file is requested.
//!
//! Every template sees the same context:
//!
//! | name | value |
//! |---|---|
//! | `cluster_name` | cluster name |
//! | `system_status` | `OK`, `UNSTABLE` or `CRITICAL` |
//! | `pass_count`, `warn_count`, `fail_count` | counts |
//! | `is_critical`, `is_warning`, `is_passing` | derived from `system_status` |
//! | `nodes` | map of node name to its alert records |
//!
//! Each alert record carries its own fields (`node`, `service`, `check`,
//! `status`, `timestamp`, `notes`, `output`) plus `is_critical`,
//! `is_warning` and `is_passing` derived from its status.

use crate::core::{CheckStatus, Message, OverallStatus};
use chrono::{DateTime, Utc};
use crate::error::TemplateError;
use crate::summary::AlertSummary;
use minijinja::{AutoEscape, Environment};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::PathBuf;

const DEFAULT_TEMPLATE: &str = include_str!("templates/alert.html");

/// Where the notification template comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TemplateSource {
    #[default]
    Builtin,
    File(PathBuf),
}

impl From<Option<PathBuf>> for TemplateSource {
    fn from(path: Option<PathBuf>) -> Self {
        path.map_or(TemplateSource::Builtin, TemplateSource::File)
    }
}

impl TemplateSource {
    fn load(&self) -> Result<Cow<'static, str>, TemplateError> {
        match self {
            TemplateSource::Builtin => Ok(Cow::Borrowed(DEFAULT_TEMPLATE)),
            TemplateSource::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|source| TemplateError::Read {
                    path: path.clone(),
                    source,
                }),
        }
    }

    /// Reads the template text on the async runtime.
    pub async fn read(&self) -> Result<Cow<'static, str>, TemplateError> {
        match self {
            TemplateSource::Builtin => Ok(Cow::Borrowed(DEFAULT_TEMPLATE)),
            TemplateSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .map(Cow::Owned)
                .map_err(|source| TemplateError::Read {
                    path: path.clone(),
                    source,
                }),
        }
    }
}

#[derive(Serialize)]
struct MessageView<'a> {
    node: &'a str,
    service: &'a str,
    check: &'a str,
    status: &'a CheckStatus,
    timestamp: &'a DateTime<Utc>,
    notes: &'a str,
    output: &'a str,
    is_critical: bool,
    is_warning: bool,
    is_passing: bool,
}

impl<'a> From<&'a Message> for MessageView<'a> {
    fn from(message: &'a Message) -> Self {
        Self {
            node: &message.node,
            service: &message.service,
            check: &message.check,
            status: &message.status,
            timestamp: &message.timestamp,
            notes: &message.notes,
            output: &message.output,
            is_critical: message.is_critical(),
            is_warning: message.is_warning(),
            is_passing: message.is_passing(),
        }
    }
}

#[derive(Serialize)]
struct RenderContext<'a> {
    cluster_name: &'a str,
    system_status: OverallStatus,
    fail_count: usize,
    warn_count: usize,
    pass_count: usize,
    is_critical: bool,
    is_warning: bool,
    is_passing: bool,
    nodes: BTreeMap<&'a str, Vec<MessageView<'a>>>,
}

impl<'a> RenderContext<'a> {
    fn new(summary: &'a AlertSummary, cluster_name: &'a str) -> Self {
        let nodes = summary
            .nodes
            .iter()
            .map(|(node, messages)| {
                (node.as_str(), messages.iter().map(MessageView::from).collect())
            })
            .collect();

        Self {
            cluster_name,
            system_status: summary.status,
            fail_count: summary.fail_count,
            warn_count: summary.warn_count,
            pass_count: summary.pass_count,
            is_critical: summary.is_critical(),
            is_warning: summary.is_warning(),
            is_passing: summary.is_passing(),
            nodes,
        }
    }
}

/// Renders `summary` with the template from `source`.
///
/// Output is HTML-escaped. Nothing is returned unless rendering completed.
pub fn render(
    summary: &AlertSummary,
    cluster_name: &str,
    source: &TemplateSource,
) -> Result<String, TemplateError> {
    render_template(summary, cluster_name, &source.load()?)
}

/// Renders `summary` with already loaded template text.
pub fn render_template(
    summary: &AlertSummary,
    cluster_name: &str,
    template: &str,
) -> Result<String, TemplateError> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    let template = env.template_from_str(template)?;

    Ok(template.render(RenderContext::new(summary, cluster_name))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CheckStatus;
    use crate::summary::summarize;
    use chrono::{TimeZone, Utc};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn message(node: &str, service: &str, check: &str, status: &str) -> Message {
        Message {
            node: node.to_string(),
            service: service.to_string(),
            check: check.to_string(),
            status: CheckStatus::from(status),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            notes: String::new(),
            output: "HTTP GET returned <500>".to_string(),
        }
    }

    fn template_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_empty_summary_renders_zero_counts_and_ok() {
        let file = template_file(
            "PassCount={{ pass_count }}, WarnCount={{ warn_count }}, FailCount={{ fail_count }} {{ system_status }}",
        );
        let source = TemplateSource::File(file.path().to_path_buf());

        let rendered = render(&summarize(&[]), "prod", &source).unwrap();

        assert_eq!(rendered, "PassCount=0, WarnCount=0, FailCount=0 OK");
    }

    #[test]
    fn test_builtin_template_renders_nodes_and_checks() {
        let summary = summarize(&[
            message("web-1", "nginx", "http", "critical"),
            message("db-1", "", "disk", "passing"),
        ]);

        let rendered = render(&summary, "prod-east", &TemplateSource::Builtin).unwrap();

        assert!(rendered.contains("prod-east"));
        assert!(rendered.contains("System is CRITICAL"));
        assert!(rendered.contains("Node: web-1"));
        assert!(rendered.contains("Node: db-1"));
        assert!(rendered.contains("nginx: http"));
        assert!(rendered.contains("#d9342b"));
        // Check output is escaped.
        assert!(rendered.contains("&lt;500&gt;"));
    }

    #[test]
    fn test_per_message_predicates_are_available() {
        let file = template_file(
            "{% for node, checks in nodes|items %}{{ node }}:{% for c in checks %}{% if c.is_critical %}C{% elif c.is_warning %}W{% elif c.is_passing %}P{% else %}?{% endif %}{% endfor %};{% endfor %}",
        );
        let summary = summarize(&[
            message("a", "", "x", "passing"),
            message("a", "", "y", "flapping"),
            message("a", "", "z", "warning"),
            message("b", "", "x", "critical"),
        ]);

        let rendered = render(
            &summary,
            "c",
            &TemplateSource::File(file.path().to_path_buf()),
        )
        .unwrap();

        assert_eq!(rendered, "a:P?W;b:C;");
    }

    #[test]
    fn test_missing_override_is_an_error() {
        let source = TemplateSource::File(PathBuf::from("/nonexistent/template.html"));
        let err = render(&summarize(&[]), "prod", &source).unwrap_err();
        assert!(matches!(err, TemplateError::Read { .. }));
    }

    #[tokio::test]
    async fn test_async_read_matches_blocking_render() {
        let file = template_file("{{ cluster_name }}={{ system_status }}");
        let source = TemplateSource::File(file.path().to_path_buf());
        let summary = summarize(&[]);

        let text = source.read().await.unwrap();
        assert_eq!(
            render_template(&summary, "prod", &text).unwrap(),
            render(&summary, "prod", &source).unwrap()
        );

        let missing = TemplateSource::File(PathBuf::from("/nonexistent/template.html"));
        assert!(matches!(missing.read().await, Err(TemplateError::Read { .. })));
        assert_eq!(TemplateSource::Builtin.read().await.unwrap(), DEFAULT_TEMPLATE);
    }

    #[test]
    fn test_unparseable_override_is_an_error() {
        let file = template_file("{% if %}");
        let source = TemplateSource::File(file.path().to_path_buf());
        let err = render(&summarize(&[]), "prod", &source).unwrap_err();
        assert!(matches!(err, TemplateError::Render(_)));
    }

    #[test]
    fn test_template_source_from_option() {
        assert_eq!(TemplateSource::from(None), TemplateSource::Builtin);
        assert_eq!(
            TemplateSource::from(Some(PathBuf::from("/etc/t.html"))),
            TemplateSource::File(PathBuf::from("/etc/t.html"))
        );
    }
}
