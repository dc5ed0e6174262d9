//! Email address type, the natural key of a subscription.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A syntactically plausible, normalised email address.
///
/// Normalisation trims surrounding whitespace and lowercases the whole
/// address, so `Alice@Example.com` and `alice@example.com` map to the same
/// subscription.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Upper bound from RFC 5321 (forward-path limit).
    pub const MAX_LEN: usize = 254;

    /// Parse and normalise a raw address.
    ///
    /// Accepts exactly one `@` with a non-empty local part and a domain that
    /// contains a dot which is neither its first nor last character.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let normalised = raw.trim().to_ascii_lowercase();
        if normalised.is_empty() || normalised.len() > Self::MAX_LEN {
            return Err(TypesError::InvalidEmail);
        }
        if normalised.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(TypesError::InvalidEmail);
        }

        let mut parts = normalised.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(TypesError::InvalidEmail);
        };
        if local.is_empty() || domain.is_empty() {
            return Err(TypesError::InvalidEmail);
        }
        match domain.find('.') {
            Some(_) if !domain.starts_with('.') && !domain.ends_with('.') => {}
            _ => return Err(TypesError::InvalidEmail),
        }

        Ok(Self(normalised))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}
