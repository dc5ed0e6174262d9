//! Development sender that writes the verification link to the log.

use async_trait::async_trait;
use wordrop_types::Email;

use crate::sender::verification_link;
use crate::{MailError, NotificationSender};

#[derive(Clone, Debug)]
pub struct LogMailSender {
    base_url: String,
}

impl LogMailSender {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl NotificationSender for LogMailSender {
    async fn send_verification(
        &self,
        email: &Email,
        username: &str,
        token: &str,
    ) -> Result<(), MailError> {
        tracing::info!(
            to = %email,
            username,
            link = %verification_link(&self.base_url, token),
            "verification email (not sent, log sender)"
        );
        Ok(())
    }
}
