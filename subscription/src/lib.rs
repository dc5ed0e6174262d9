//! Subscription governor.
//!
//! Decides whether a subscriber may receive another verification email,
//! enforces the cooldown between sends, bans records that exhaust their
//! attempts, and confirms verification tokens.
//!
//! All collaborators are injected: a [`SubscriptionStore`](wordrop_store::SubscriptionStore),
//! a [`NotificationSender`](wordrop_mailer::NotificationSender), the token codec,
//! the code generator and a [`Clock`](wordrop_types::Clock).

pub mod error;
pub mod governor;

pub use error::{ErrorKind, InfraCause, SubscriptionError, VerificationFailure};
pub use governor::Governor;
