use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;
use tracing::debug;

use anbud_config::SmtpSettings;

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// `Skipped` means the transport itself declined to send (disabled by
/// configuration). Callers treat it as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailOutcome {
    Delivered,
    Skipped,
}

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("Message build error: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<EmailOutcome, MailerError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, MailerError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
                .port(settings.port);

        if !settings.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ));
        }

        let from = format!("{} <{}>", settings.from_name, settings.from_address).parse()?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<EmailOutcome, MailerError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(message.to.parse()?)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(message.html_body.clone())?;

        self.transport.send(email).await?;
        debug!(to = %message.to, subject = %message.subject, "Email delivered");
        Ok(EmailOutcome::Delivered)
    }
}

/// Stand-in transport for deployments with email switched off. Every
/// send reports `Skipped`.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, message: &EmailMessage) -> Result<EmailOutcome, MailerError> {
        debug!(to = %message.to, subject = %message.subject, "Email transport disabled, skipping");
        Ok(EmailOutcome::Skipped)
    }
}

pub fn mailer_from_settings(
    settings: &SmtpSettings,
) -> Result<std::sync::Arc<dyn Mailer>, MailerError> {
    if settings.enabled {
        Ok(std::sync::Arc::new(SmtpMailer::new(settings)?))
    } else {
        Ok(std::sync::Arc::new(DisabledMailer))
    }
}
