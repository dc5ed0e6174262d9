//! Abstract storage traits for Wordrop.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The governor depends only on the traits.

pub mod error;
pub mod subscription;

pub use error::StoreError;
pub use subscription::{codes_match, SubscriptionStore};
