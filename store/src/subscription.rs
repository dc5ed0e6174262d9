//! Subscription record storage trait.

use std::sync::Arc;

use async_trait::async_trait;
use wordrop_types::{Email, NewSubscription, SubscriberId, SubscriptionRecord, Timestamp};

use crate::StoreError;

/// Durable storage for subscription records, keyed by email and by id.
///
/// Implementations must enforce one record per email and must reject an
/// update whose `version` no longer matches the stored record.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Look up the record for `email`. `StoreError::NotFound` when absent.
    async fn find_by_email(&self, email: &Email) -> Result<SubscriptionRecord, StoreError>;

    /// Look up a record by id whose current verification code equals `code`.
    ///
    /// An unknown id and a stale code both yield `StoreError::NotFound`.
    async fn find_by_id_and_code(
        &self,
        id: &SubscriberId,
        code: &str,
    ) -> Result<SubscriptionRecord, StoreError>;

    /// Insert a new record, assigning its id and bookkeeping timestamps.
    ///
    /// `StoreError::Duplicate` if a record for the email already exists.
    async fn create(
        &self,
        new: NewSubscription,
        now: Timestamp,
    ) -> Result<SubscriptionRecord, StoreError>;

    /// Persist `record`, bumping `updated_at` and `version`.
    ///
    /// `StoreError::Conflict` if the stored version differs from
    /// `record.version`. Returns the record as stored.
    async fn update(
        &self,
        record: &SubscriptionRecord,
        now: Timestamp,
    ) -> Result<SubscriptionRecord, StoreError>;

    /// Whether a record exists for `email`.
    async fn exists_by_email(&self, email: &Email) -> Result<bool, StoreError> {
        match self.find_by_email(email).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl<S: SubscriptionStore + ?Sized> SubscriptionStore for Arc<S> {
    async fn find_by_email(&self, email: &Email) -> Result<SubscriptionRecord, StoreError> {
        (**self).find_by_email(email).await
    }

    async fn find_by_id_and_code(
        &self,
        id: &SubscriberId,
        code: &str,
    ) -> Result<SubscriptionRecord, StoreError> {
        (**self).find_by_id_and_code(id, code).await
    }

    async fn create(
        &self,
        new: NewSubscription,
        now: Timestamp,
    ) -> Result<SubscriptionRecord, StoreError> {
        (**self).create(new, now).await
    }

    async fn update(
        &self,
        record: &SubscriptionRecord,
        now: Timestamp,
    ) -> Result<SubscriptionRecord, StoreError> {
        (**self).update(record, now).await
    }

    async fn exists_by_email(&self, email: &Email) -> Result<bool, StoreError> {
        (**self).exists_by_email(email).await
    }
}

/// Compare two verification codes without short-circuiting on the first
/// differing byte.
pub fn codes_match(stored: &str, presented: &str) -> bool {
    let (a, b) = (stored.as_bytes(), presented.as_bytes());
    if a.is_empty() || a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_exact_only() {
        assert!(codes_match("abc123", "abc123"));
        assert!(!codes_match("abc123", "abc124"));
        assert!(!codes_match("abc123", "abc12"));
    }

    #[test]
    fn empty_stored_code_never_matches() {
        assert!(!codes_match("", ""));
    }
}
