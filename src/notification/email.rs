//! Email notifications over an authenticated SMTP session.

use crate::config::EmailConfig;
use crate::core::{Message, Notifier};
use crate::error::{DeliveryError, Error};
use crate::notification::render::{render_template, TemplateSource};
use crate::summary::{summarize, AlertSummary};
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

/// A trait for transports that can deliver a built email.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: lettre::Message) -> Result<(), DeliveryError>;
}

/// SMTP transport using STARTTLS when the server offers it.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn from_config(config: &EmailConfig) -> Result<Self, DeliveryError> {
        let tls = TlsParameters::new(config.url.clone())
            .map_err(|e| DeliveryError::Transport(Box::new(e)))?;
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.url)
            .port(config.port)
            .tls(Tls::Opportunistic(tls))
            .timeout(Some(Duration::from_secs(config.timeout_seconds)));
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }
        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, message: lettre::Message) -> Result<(), DeliveryError> {
        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError::Transport(Box::new(e)))
    }
}

pub struct EmailNotifier {
    config: EmailConfig,
    template: TemplateSource,
    transport: Arc<dyn MailTransport>,
}

impl EmailNotifier {
    /// Creates a notifier that sends through the SMTP server in `config`.
    pub fn new(config: EmailConfig) -> Result<Self, DeliveryError> {
        let transport = Arc::new(SmtpMailer::from_config(&config)?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: EmailConfig, transport: Arc<dyn MailTransport>) -> Self {
        let template = TemplateSource::from(config.template.clone());
        Self {
            config,
            template,
            transport,
        }
    }

    /// Renders and sends one email for `summary`.
    ///
    /// Returns `true` only once the transport reports success. There is no
    /// retry.
    #[instrument(skip_all, fields(status = %summary.status, alerts = summary.len()))]
    pub async fn deliver(&self, summary: &AlertSummary) -> bool {
        match self.try_deliver(summary).await {
            Ok(()) => {
                info!("Email notification sent.");
                true
            }
            Err(e @ Error::Template(_)) => {
                error!(error = %e, "Template error, unable to send email notification");
                false
            }
            Err(e) => {
                error!(error = %e, "Unable to send email notification");
                false
            }
        }
    }

    async fn try_deliver(&self, summary: &AlertSummary) -> Result<(), Error> {
        let template = self.template.read().await?;
        let body = render_template(summary, &self.config.cluster_name, &template)?;
        let message = self.build_message(summary, body)?;
        self.transport.send(message).await?;
        Ok(())
    }

    fn build_message(
        &self,
        summary: &AlertSummary,
        body: String,
    ) -> Result<lettre::Message, DeliveryError> {
        let sender = Mailbox::new(
            Some(self.config.sender_alias.clone()).filter(|alias| !alias.is_empty()),
            self.config.sender_email.parse()?,
        );

        let mut builder = lettre::Message::builder()
            .from(sender)
            .subject(format!("{} is {}", self.config.cluster_name, summary.status))
            .header(ContentType::TEXT_HTML);
        for receiver in &self.config.receivers {
            builder = builder.to(receiver.parse()?);
        }

        Ok(builder.body(body)?)
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &str {
        "email"
    }

    async fn notify(&self, alerts: &[Message]) -> bool {
        self.deliver(&summarize(alerts)).await
    }
}
