//! Nullable mailer: record verification mails without sending them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use wordrop_mailer::{MailError, NotificationSender};
use wordrop_types::Email;

/// One recorded delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMail {
    pub email: Email,
    pub username: String,
    pub token: String,
}

/// A sender that keeps every message in memory for assertions.
#[derive(Default)]
pub struct NullMailer {
    sent: Mutex<Vec<SentMail>>,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl NullMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every subsequent send as if the mail API answered 503.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Stall every send for `delay`.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    /// All messages "sent" so far.
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// The token from the most recent message.
    pub fn last_token(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|m| m.token.clone())
    }
}

#[async_trait]
impl NotificationSender for NullMailer {
    async fn send_verification(
        &self,
        email: &Email,
        username: &str,
        token: &str,
    ) -> Result<(), MailError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Rejected { status: 503 });
        }
        self.sent.lock().unwrap().push(SentMail {
            email: email.clone(),
            username: username.to_string(),
            token: token.to_string(),
        });
        Ok(())
    }
}
