//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the governor (clock, record store, mail
//! delivery, entropy) sits behind a trait. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically, including injected failures and stalls
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod entropy;
pub mod mailer;
pub mod store;

pub use clock::NullClock;
pub use entropy::NullEntropy;
pub use mailer::{NullMailer, SentMail};
pub use store::NullStore;
