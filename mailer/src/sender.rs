//! Notification sender trait.

use std::sync::Arc;

use async_trait::async_trait;
use wordrop_types::Email;

use crate::MailError;

/// Delivers a verification link to a subscriber.
///
/// The token is opaque to senders: they embed it in a link and nothing more.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_verification(
        &self,
        email: &Email,
        username: &str,
        token: &str,
    ) -> Result<(), MailError>;
}

#[async_trait]
impl<N: NotificationSender + ?Sized> NotificationSender for Arc<N> {
    async fn send_verification(
        &self,
        email: &Email,
        username: &str,
        token: &str,
    ) -> Result<(), MailError> {
        (**self).send_verification(email, username, token).await
    }
}

#[async_trait]
impl<N: NotificationSender + ?Sized> NotificationSender for Box<N> {
    async fn send_verification(
        &self,
        email: &Email,
        username: &str,
        token: &str,
    ) -> Result<(), MailError> {
        (**self).send_verification(email, username, token).await
    }
}

/// The link a subscriber clicks to confirm their address.
pub fn verification_link(base_url: &str, token: &str) -> String {
    format!(
        "{}/subscriptions/verify?token={}",
        base_url.trim_end_matches('/'),
        token
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_strips_trailing_slash() {
        assert_eq!(
            verification_link("https://wordrop.example/", "a.b.c"),
            "https://wordrop.example/subscriptions/verify?token=a.b.c"
        );
    }
}
