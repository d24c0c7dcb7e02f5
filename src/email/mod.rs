pub mod templates;

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::{MailConfig, SmtpConfig, TlsMode};

/// Mail connectivity or delivery failure. Never affects stored submissions.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportError {
    pub message: String,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TransportError {}

impl From<String> for TransportError {
    fn from(s: String) -> Self {
        TransportError { message: s }
    }
}

impl From<&str> for TransportError {
    fn from(s: &str) -> Self {
        TransportError {
            message: s.to_string(),
        }
    }
}

/// A fully rendered HTML message.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub from_name: String,
    pub from_address: String,
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
}

/// A single connection's worth of mail transport.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn verify_connectivity(&self) -> Result<(), TransportError>;
    async fn send(&self, mail: &OutgoingMail) -> Result<(), TransportError>;
}

/// Hands out a fresh transport per submission. Transports are not reused.
pub trait Mailer: Send + Sync {
    fn open(&self) -> Result<Box<dyn MailSender>, TransportError>;
}

#[derive(Debug, Clone)]
pub struct MailAddresses {
    pub from: String,
    pub admin_recipient: String,
    pub site_name: String,
}

/// A mailer together with the addresses the notifications use.
#[derive(Clone)]
pub struct Notifier {
    pub mailer: Arc<dyn Mailer>,
    pub addresses: MailAddresses,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, addresses: MailAddresses) -> Self {
        Self { mailer, addresses }
    }

    pub fn from_config(config: &MailConfig) -> Self {
        Self {
            mailer: Arc::new(SmtpMailer::new(config.smtp.clone())),
            addresses: MailAddresses {
                from: config.from.clone(),
                admin_recipient: config.recipient.clone(),
                site_name: config.site_name.clone(),
            },
        }
    }

    /// Open a transport and check it accepts connections.
    pub async fn self_test(&self) -> Result<(), TransportError> {
        let sender = self.mailer.open()?;
        sender.verify_connectivity().await
    }
}

pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

impl Mailer for SmtpMailer {
    fn open(&self) -> Result<Box<dyn MailSender>, TransportError> {
        let transport = build_smtp_transport(&self.config)?;
        Ok(Box::new(SmtpSender { transport }))
    }
}

pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

#[async_trait]
impl MailSender for SmtpSender {
    async fn verify_connectivity(&self) -> Result<(), TransportError> {
        let reachable = self
            .transport
            .test_connection()
            .await
            .map_err(|e| format!("SMTP connection check failed: {e}"))?;

        if reachable {
            Ok(())
        } else {
            Err("SMTP server did not accept the connection".into())
        }
    }

    async fn send(&self, mail: &OutgoingMail) -> Result<(), TransportError> {
        let message = build_message(mail)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| format!("Failed to send email: {e}"))?;

        Ok(())
    }
}

pub fn build_message(mail: &OutgoingMail) -> Result<Message, TransportError> {
    let from_address: Address = mail
        .from_address
        .parse()
        .map_err(|e| format!("Invalid from address: {e}"))?;
    let to: Address = mail
        .to
        .parse()
        .map_err(|e| format!("Invalid to address: {e}"))?;

    let mut builder = Message::builder()
        .from(Mailbox::new(Some(mail.from_name.clone()), from_address))
        .to(Mailbox::new(None, to))
        .subject(mail.subject.clone());

    if let Some(reply_to) = &mail.reply_to {
        let reply_to: Address = reply_to
            .parse()
            .map_err(|e| format!("Invalid reply-to address: {e}"))?;
        builder = builder.reply_to(Mailbox::new(None, reply_to));
    }

    let message = builder
        .header(ContentType::TEXT_HTML)
        .body(mail.html.clone())
        .map_err(|e| format!("Failed to build email: {e}"))?;

    Ok(message)
}

pub fn build_smtp_transport(
    config: &SmtpConfig,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, TransportError> {
    let creds = Credentials::new(config.user.clone(), config.pass.clone());

    let transport = match config.tls {
        TlsMode::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| format!("SMTP relay error: {e}"))?
            .port(config.port)
            .credentials(creds)
            .build(),
        TlsMode::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .credentials(creds)
            .build(),
        TlsMode::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("SMTP starttls error: {e}"))?
            .port(config.port)
            .credentials(creds)
            .build(),
    };

    Ok(transport)
}
