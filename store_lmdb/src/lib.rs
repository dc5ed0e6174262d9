//! LMDB storage backend for Wordrop.
//!
//! Implements the storage traits from `wordrop-store` using the `heed` LMDB
//! bindings. Records live in one database keyed by subscriber id; a second
//! database indexes ids by email; a third holds the id sequence.

pub mod environment;
pub mod error;
pub mod subscription;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use subscription::LmdbSubscriptionStore;
