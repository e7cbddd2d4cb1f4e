//! Outgoing email for password resets.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::MailConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<()>;
}

/// Sends through an SMTP relay with STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(config: &MailConfig) -> Result<Self> {
        let (Some(username), Some(password)) = (&config.username, &config.password) else {
            anyhow::bail!("SMTP requires EMAIL_USER and EMAIL_PASS");
        };
        let sender = config.sender().context("No sender address configured")?;
        let from: Mailbox = sender
            .parse()
            .with_context(|| format!("Invalid sender address: {sender}"))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .with_context(|| format!("Invalid SMTP host: {}", config.smtp_host))?
            .port(config.smtp_port)
            .credentials(Credentials::new(username.clone(), password.clone()))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        let to: Mailbox = mail
            .to
            .parse()
            .with_context(|| format!("Invalid recipient address: {}", mail.to))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject)
            .multipart(MultiPart::alternative_plain_html(mail.text, mail.html))
            .context("Failed to build email")?;

        self.transport
            .send(message)
            .await
            .context("SMTP delivery failed")?;
        Ok(())
    }
}

/// Used when no SMTP credentials are configured. Only the envelope is logged;
/// bodies carry reset tokens.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        tracing::info!(to = %mail.to, subject = %mail.subject, "SMTP not configured, email not sent");
        Ok(())
    }
}

/// Pick the SMTP mailer when credentials exist, otherwise the log-only one.
pub fn from_config(config: &MailConfig) -> Result<Box<dyn Mailer>> {
    if config.smtp_enabled() {
        Ok(Box::new(SmtpMailer::from_config(config)?))
    } else {
        tracing::warn!("EMAIL_USER/EMAIL_PASS not set; password-reset emails will only be logged");
        Ok(Box::new(LogMailer))
    }
}

pub fn reset_email(to: &str, link: &str) -> OutgoingMail {
    let text = format!("Hi,\nClick the link to reset your password: {link}");
    let html = format!(
        r#"<html>
<body style="font-family: Arial, sans-serif; color: #333;">
  <h2>Password Reset Requested</h2>
  <p>Hello,</p>
  <p>We received a request to reset your password. Click the button below to continue:</p>
  <p>
    <a href="{link}" style="background-color: #007bff; color: white; padding: 10px 20px; text-decoration: none; border-radius: 5px;">Reset Password</a>
  </p>
  <p>If you didn't request this, you can safely ignore this email.</p>
  <br>
  <p>Thanks,<br>The Medibot Team</p>
</body>
</html>"#
    );

    OutgoingMail {
        to: to.to_string(),
        subject: "Reset Your Password".to_string(),
        text,
        html,
    }
}
