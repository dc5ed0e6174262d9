//! Subscriber identity assigned by the record store.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, immutable subscriber identity.
///
/// Always 24 lowercase hex characters (96 bits), the same shape as a
/// document-store object id. Stores derive it from a monotonically
/// increasing sequence via [`SubscriberId::from_sequence`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriberId(String);

impl SubscriberId {
    pub const LEN: usize = 24;

    /// Build the id for the `seq`-th record created by a store.
    pub fn from_sequence(seq: u64) -> Self {
        Self(format!("{seq:024x}"))
    }

    /// Validate an id received from outside (e.g. inside a token).
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let valid = raw.len() == Self::LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !valid {
            return Err(TypesError::InvalidSubscriberId);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
