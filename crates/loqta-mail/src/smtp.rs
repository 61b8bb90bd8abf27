use std::time::Duration;

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::{debug, info};

use crate::address::is_valid_email;
use crate::classify::{ClassifiedFailure, classify_send_failure};
use crate::config::{MailConfigError, SmtpConfig};

/// SMTP connect/socket timeout. Greeting and TLS negotiation fall under the
/// same budget.
const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum MailError {
    #[error("{}", .0)]
    Config(#[from] MailConfigError),

    #[error("Invalid email address format")]
    InvalidRecipient { address: String },

    #[error("{}", .0.message)]
    Send(ClassifiedFailure),
}

impl MailError {
    pub fn details(&self) -> String {
        match self {
            Self::Config(e) => e.details(),
            Self::InvalidRecipient { address } => {
                format!("The email address \"{address}\" is not valid.")
            }
            Self::Send(c) => c.details.clone(),
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::Config(_) => 500,
            Self::InvalidRecipient { .. } => 400,
            Self::Send(c) => c.status,
        }
    }
}

/// Outbound SMTP mailer. STARTTLS on the configured port, credentials from
/// the environment, one delivery attempt per call — fallback strategy is the
/// caller's concern.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    pub fn from_env() -> Result<Self, MailError> {
        Self::new(&SmtpConfig::from_env()?)
    }

    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Send(classify_send_failure(&e.to_string())))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        let sender = if is_valid_email(&config.username) {
            config.username.parse().map_err(|_| MailError::InvalidRecipient {
                address: config.username.clone(),
            })?
        } else {
            // SMTP username is not always an address (API-key logins);
            // fall back to the service sender.
            "noreply@loqta.app".parse().map_err(|_| MailError::InvalidRecipient {
                address: "noreply@loqta.app".into(),
            })?
        };
        let from = Mailbox::new(Some("Loqta".to_string()), sender);

        Ok(Self { transport, from })
    }

    /// Connection + credential probe without sending anything.
    pub async fn verify(&self) -> Result<(), ClassifiedFailure> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(classify_send_failure("connection refused by SMTP server")),
            Err(e) => Err(classify_send_failure(&e.to_string())),
        }
    }

    /// One delivery attempt of an HTML + plaintext alternative message.
    /// Returns the server's acknowledgment line.
    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        html: &str,
        text: &str,
    ) -> Result<String, MailError> {
        let to = to.trim();
        if !is_valid_email(to) {
            return Err(MailError::InvalidRecipient {
                address: to.to_string(),
            });
        }

        let recipient: Mailbox = to.parse().map_err(|_| MailError::InvalidRecipient {
            address: to.to_string(),
        })?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject.trim())
            .multipart(MultiPart::alternative_plain_html(
                text.to_string(),
                html.to_string(),
            ))
            .map_err(|e| MailError::Send(classify_send_failure(&e.to_string())))?;

        debug!("Sending email to {} ({})", to, subject);

        match self.transport.send(message).await {
            Ok(response) => {
                let ack = response.message().collect::<Vec<_>>().join(" ");
                info!("Email sent to {}: {}", to, ack);
                Ok(ack)
            }
            Err(e) => Err(MailError::Send(classify_send_failure(&e.to_string()))),
        }
    }
}
