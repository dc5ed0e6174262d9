//! Mail delivery configuration.

use serde::{Deserialize, Serialize};

/// Settings for [`HttpMailSender`](crate::HttpMailSender) and
/// [`SmtpMailSender`](crate::SmtpMailSender).
///
/// Passed in explicitly; nothing here is read from the environment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MailConfig {
    /// Transactional mail endpoint that accepts a JSON message.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Sent in the `api-key` header. Usually supplied on the command line.
    #[serde(default, skip_serializing)]
    pub api_key: String,

    #[serde(default)]
    pub sender_email: String,

    #[serde(default = "default_sender_name")]
    pub sender_name: String,

    /// Public origin of the HTTP API; verification links point here.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_subject")]
    pub subject: String,

    /// Per-request timeout for the mail API or SMTP session, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub smtp_host: String,

    /// 465 uses implicit TLS; any other port upgrades with STARTTLS.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub smtp_username: String,

    /// Usually supplied on the command line.
    #[serde(default, skip_serializing)]
    pub smtp_password: String,

    /// How long a verification link stays valid, as stated in the message.
    /// Set from the token codec at startup, never from the file.
    #[serde(skip, default = "default_link_ttl_secs")]
    pub link_ttl_secs: u64,
}

fn default_api_url() -> String {
    "https://api.brevo.com/v3/smtp/email".to_string()
}

fn default_sender_name() -> String {
    "Wordrop".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_subject() -> String {
    "Wordrop - Please verify your email address".to_string()
}

fn default_request_timeout_ms() -> u64 {
    8_000
}

fn default_smtp_port() -> u16 {
    587
}

fn default_link_ttl_secs() -> u64 {
    15 * 60
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: String::new(),
            sender_email: String::new(),
            sender_name: default_sender_name(),
            base_url: default_base_url(),
            subject: default_subject(),
            request_timeout_ms: default_request_timeout_ms(),
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            link_ttl_secs: default_link_ttl_secs(),
        }
    }
}
