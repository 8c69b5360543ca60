//! # Verification email delivery
//!
//! The account flows only need one call, [`Mailer::send_verification`]. Three
//! implementations exist:
//!
//! | Type | Used when |
//! |------|-----------|
//! | [`SmtpMailer`] | `mail.smtp_host` is configured; STARTTLS relay via `lettre` |
//! | [`LogMailer`] | no SMTP relay is configured; the code is written to the log |
//! | [`MemoryMailer`] | tests; records every message it is asked to send |

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::auth::verification::REGISTRATION_CODE_TTL_MINUTES;
use crate::config::MailSettings;

const SUBJECT: &str = "Your DiaryApp verification code";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid email address '{0}'")]
    Address(String),
    #[error("Failed to build email: {0}")]
    Message(String),
    #[error("Failed to send email: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification(&self, to: &str, code: &str) -> Result<(), MailError>;
}

/// Pick the SMTP mailer when a relay is configured, otherwise the log-only one.
pub fn from_settings(settings: &MailSettings) -> Result<Arc<dyn Mailer>, MailError> {
    match settings.smtp_host {
        Some(_) => Ok(Arc::new(SmtpMailer::new(settings)?)),
        None => {
            tracing::warn!("mail.smtp_host is not set; verification codes will be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

fn verification_body(code: &str) -> String {
    format!(
        r#"<html>
<body>
    <p>Hello!</p>
    <p>Your DiaryApp account verification code:</p>
    <h1 style="color: coral; font-size: 24px;">{code}</h1>
    <p>The code expires in {REGISTRATION_CODE_TTL_MINUTES} minutes or less.</p>
    <p>The DiaryApp team</p>
</body>
</html>"#
    )
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &MailSettings) -> Result<Self, MailError> {
        let host = settings
            .smtp_host
            .as_deref()
            .ok_or_else(|| MailError::Transport("mail.smtp_host is not set".to_string()))?;

        let from = settings
            .from
            .parse::<Mailbox>()
            .map_err(|_| MailError::Address(settings.from.clone()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(settings.smtp_port);
        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_verification(&self, to: &str, code: &str) -> Result<(), MailError> {
        let recipient = to
            .parse::<Mailbox>()
            .map_err(|_| MailError::Address(to.to_string()))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(SUBJECT)
            .header(ContentType::TEXT_HTML)
            .body(verification_body(code))
            .map_err(|e| MailError::Message(e.to_string()))?;

        self.transport.send(message).await.map_err(|e| {
            tracing::error!(to, error = %e, "verification email failed");
            MailError::Transport(e.to_string())
        })?;

        tracing::info!(to, "verification email sent");
        Ok(())
    }
}

/// Development mailer: writes the code to the log instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification(&self, to: &str, code: &str) -> Result<(), MailError> {
        tracing::info!(to, code, "verification code (no SMTP relay configured)");
        Ok(())
    }
}

/// A message captured by [`MemoryMailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCode {
    pub to: String,
    pub code: String,
}

/// Records verification messages in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryMailer {
    sent: Arc<Mutex<Vec<SentCode>>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentCode> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent code sent to `to`.
    pub fn last_code_for(&self, to: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|m| m.to == to)
            .map(|m| m.code)
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send_verification(&self, to: &str, code: &str) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentCode {
                to: to.to_string(),
                code: code.to_string(),
            });
        Ok(())
    }
}
