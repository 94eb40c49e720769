use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::config::SmtpConfig;

/// Outbound HTML mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_html(&self, to: &str, subject: &str, html: String) -> anyhow::Result<()>;
}

/// STARTTLS relay with username/password login.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let from: Mailbox = cfg
            .sender
            .parse()
            .with_context(|| format!("invalid SENDER_EMAIL {:?}", cfg.sender))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.server)
            .with_context(|| format!("smtp relay {}", cfg.server))?
            .port(cfg.port)
            .credentials(Credentials::new(cfg.username.clone(), cfg.password.clone()))
            .build();
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_html(&self, to: &str, subject: &str, html: String) -> anyhow::Result<()> {
        let to: Mailbox = to
            .parse()
            .with_context(|| format!("invalid recipient {to:?}"))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.clone())
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
            .context("build email")?;
        self.transport.send(message).await.context("smtp send")?;
        info!(to = %to, subject, "email sent");
        Ok(())
    }
}

/// Used when SMTP settings are absent; every send fails.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send_html(&self, _to: &str, _subject: &str, _html: String) -> anyhow::Result<()> {
        anyhow::bail!("email is not configured")
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub struct SentMail {
        pub to: String,
        pub subject: String,
        pub html: String,
    }

    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<SentMail>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_html(&self, to: &str, subject: &str, html: String) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(SentMail {
                to: to.to_string(),
                subject: subject.to_string(),
                html,
            });
            Ok(())
        }
    }
}
