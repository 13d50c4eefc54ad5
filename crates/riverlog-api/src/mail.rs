use std::sync::Arc;

use anyhow::Result;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{error, info, warn};

/// SMTP settings, all taken from the environment by the server.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub host: String,
    /// Login name, also used as the sender address.
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingMail {
    pub fn reset_token(to: &str, token: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Your Password Reset Token".to_string(),
            body: format!("Use the following token to reset your password: {}", token),
        }
    }
}

/// Outbound mail transport. `send` blocks; callers go through [`dispatch`].
pub trait Mailer: Send + Sync + 'static {
    fn send(&self, mail: &OutgoingMail) -> Result<()>;
}

/// Implicit-TLS SMTP relay.
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let from: Mailbox = config.user.parse()?;
        let transport = SmtpTransport::relay(&config.host)?
            .credentials(Credentials::new(config.user.clone(), config.password.clone()))
            .build();

        info!("SMTP mailer configured for {}", config.host);
        Ok(Self { transport, from })
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(mail.to.parse::<Mailbox>()?)
            .subject(mail.subject.clone())
            .body(mail.body.clone())?;

        self.transport.send(&message)?;
        Ok(())
    }
}

/// Used when no mail host is configured: drops the message with a warning.
pub struct DisabledMailer;

impl Mailer for DisabledMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<()> {
        warn!("Mail transport not configured, dropping '{}' to {}", mail.subject, mail.to);
        Ok(())
    }
}

/// Fire-and-forget send on the blocking pool. Failures are logged only.
pub fn dispatch(mailer: Arc<dyn Mailer>, mail: OutgoingMail) {
    tokio::task::spawn_blocking(move || match mailer.send(&mail) {
        Ok(()) => info!("Sent '{}' to {}", mail.subject, mail.to),
        Err(e) => error!("Failed to send '{}' to {}: {}", mail.subject, mail.to, e),
    });
}
