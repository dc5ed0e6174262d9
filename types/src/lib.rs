//! Fundamental types for the Wordrop subscription service.
//!
//! This crate defines the values shared across every other crate in the
//! workspace: timestamps, subscriber ids, email addresses, governor
//! parameters, and the subscription record with its state transitions.

pub mod email;
pub mod error;
pub mod id;
pub mod params;
pub mod record;
pub mod time;

pub use email::Email;
pub use error::TypesError;
pub use id::SubscriberId;
pub use params::GovernorParams;
pub use record::{Ineligible, NewSubscription, SubscriptionRecord};
pub use time::{Clock, SystemClock, Timestamp};
