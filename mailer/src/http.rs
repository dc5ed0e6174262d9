//! Transactional-mail HTTP API sender.
//!
//! Posts one JSON message per verification:
//!
//! ```json
//! { "sender": {"name": "...", "email": "..."},
//!   "to": [{"email": "...", "name": "..."}],
//!   "subject": "...", "htmlContent": "...", "textContent": "..." }
//! ```
//!
//! Any non-2xx answer is [`MailError::Rejected`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use wordrop_types::Email;

use crate::sender::verification_link;
use crate::template::{render_html, render_text};
use crate::{MailConfig, MailError, NotificationSender};

#[derive(Debug, Serialize)]
struct Party<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutgoingMessage<'a> {
    sender: Party<'a>,
    to: Vec<Party<'a>>,
    subject: &'a str,
    html_content: String,
    text_content: String,
}

pub struct HttpMailSender {
    client: reqwest::Client,
    config: MailConfig,
}

impl HttpMailSender {
    pub fn new(config: MailConfig) -> Result<Self, MailError> {
        if config.api_url.is_empty() {
            return Err(MailError::Config("api_url is empty".into()));
        }
        if config.api_key.is_empty() {
            return Err(MailError::Config("api_key is empty".into()));
        }
        if config.sender_email.is_empty() {
            return Err(MailError::Config("sender_email is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self { client, config })
    }

    fn message<'a>(&'a self, email: &'a Email, username: &'a str, token: &str) -> OutgoingMessage<'a> {
        let link = verification_link(&self.config.base_url, token);
        OutgoingMessage {
            sender: Party {
                email: &self.config.sender_email,
                name: &self.config.sender_name,
            },
            to: vec![Party {
                email: email.as_str(),
                name: username,
            }],
            subject: &self.config.subject,
            html_content: render_html(username, &link, self.config.link_ttl_secs),
            text_content: render_text(username, &link, self.config.link_ttl_secs),
        }
    }
}

impl std::fmt::Debug for HttpMailSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMailSender")
            .field("api_url", &self.config.api_url)
            .field("sender_email", &self.config.sender_email)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl NotificationSender for HttpMailSender {
    async fn send_verification(
        &self,
        email: &Email,
        username: &str,
        token: &str,
    ) -> Result<(), MailError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .header("api-key", &self.config.api_key)
            .json(&self.message(email, username, token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(to = %email, status = status.as_u16(), "mail API rejected verification email");
            return Err(MailError::Rejected {
                status: status.as_u16(),
            });
        }

        tracing::info!(to = %email, "verification email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MailConfig {
        MailConfig {
            api_key: "key".into(),
            sender_email: "noreply@wordrop.example".into(),
            base_url: "https://wordrop.example".into(),
            ..MailConfig::default()
        }
    }

    #[test]
    fn incomplete_config_rejected() {
        let missing_key = MailConfig {
            api_key: String::new(),
            ..config()
        };
        assert!(matches!(HttpMailSender::new(missing_key), Err(MailError::Config(_))));

        let missing_sender = MailConfig {
            sender_email: String::new(),
            ..config()
        };
        assert!(matches!(
            HttpMailSender::new(missing_sender),
            Err(MailError::Config(_))
        ));
    }

    #[test]
    fn message_carries_link_not_raw_code() {
        let sender = HttpMailSender::new(config()).unwrap();
        let email = Email::parse("reader@example.com").unwrap();
        let msg = sender.message(&email, "reader", "h.p.s");
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["to"][0]["email"], "reader@example.com");
        assert_eq!(json["sender"]["email"], "noreply@wordrop.example");
        let text = json["textContent"].as_str().unwrap();
        assert!(text.contains("https://wordrop.example/subscriptions/verify?token=h.p.s"));
        assert!(json["htmlContent"].as_str().unwrap().contains("token=h.p.s"));
        assert!(text.contains("expires in 15 minutes"));
    }

    #[test]
    fn debug_hides_api_key() {
        let sender = HttpMailSender::new(MailConfig {
            api_key: "super-secret-api-key".into(),
            ..config()
        })
        .unwrap();
        assert!(!format!("{sender:?}").contains("super-secret"));
    }
}
