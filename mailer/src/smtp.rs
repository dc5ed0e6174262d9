//! SMTP sender.
//!
//! Sends one multipart (plain text + HTML) message per verification over an
//! authenticated SMTP session. Port 465 uses implicit TLS; any other port
//! upgrades with STARTTLS.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use wordrop_types::Email;

use crate::sender::verification_link;
use crate::template::{render_html, render_text};
use crate::{MailConfig, MailError, NotificationSender};

const IMPLICIT_TLS_PORT: u16 = 465;

pub struct SmtpMailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    config: MailConfig,
}

impl SmtpMailSender {
    pub fn new(config: MailConfig) -> Result<Self, MailError> {
        if config.smtp_host.is_empty() {
            return Err(MailError::Config("smtp_host is empty".into()));
        }
        if config.sender_email.is_empty() {
            return Err(MailError::Config("sender_email is empty".into()));
        }
        let from = sender_mailbox(&config)?;

        let builder = if config.smtp_port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
        };
        let mut builder = builder
            .port(config.smtp_port)
            .timeout(Some(Duration::from_millis(config.request_timeout_ms)));
        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            config,
        })
    }

    fn message(&self, email: &Email, username: &str, token: &str) -> Result<Message, MailError> {
        build_message(&self.config, self.from.clone(), email, username, token)
    }
}

impl std::fmt::Debug for SmtpMailSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailSender")
            .field("smtp_host", &self.config.smtp_host)
            .field("smtp_port", &self.config.smtp_port)
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl NotificationSender for SmtpMailSender {
    async fn send_verification(
        &self,
        email: &Email,
        username: &str,
        token: &str,
    ) -> Result<(), MailError> {
        let message = self.message(email, username, token)?;
        self.transport.send(message).await.map_err(|e| {
            tracing::warn!(to = %email, error = %e, "SMTP relay refused verification email");
            MailError::Smtp(e)
        })?;

        tracing::info!(to = %email, "verification email sent");
        Ok(())
    }
}

fn sender_mailbox(config: &MailConfig) -> Result<Mailbox, MailError> {
    let address = config
        .sender_email
        .parse::<Address>()
        .map_err(|e| MailError::Config(format!("sender_email: {e}")))?;
    let name = (!config.sender_name.is_empty()).then(|| config.sender_name.clone());
    Ok(Mailbox::new(name, address))
}

fn build_message(
    config: &MailConfig,
    from: Mailbox,
    email: &Email,
    username: &str,
    token: &str,
) -> Result<Message, MailError> {
    let link = verification_link(&config.base_url, token);
    let to = Mailbox::new(
        Some(username.to_string()),
        email
            .as_str()
            .parse::<Address>()
            .map_err(|e| MailError::Message(format!("recipient: {e}")))?,
    );

    Message::builder()
        .from(from)
        .to(to)
        .subject(config.subject.as_str())
        .multipart(MultiPart::alternative_plain_html(
            render_text(username, &link, config.link_ttl_secs),
            render_html(username, &link, config.link_ttl_secs),
        ))
        .map_err(|e| MailError::Message(e.to_string()))
}
