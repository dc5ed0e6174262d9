//! Nullable store: thread-safe in-memory subscription storage for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use wordrop_store::{codes_match, StoreError, SubscriptionStore};
use wordrop_types::{Email, NewSubscription, SubscriberId, SubscriptionRecord, Timestamp};

#[derive(Default)]
struct Tables {
    records: HashMap<String, SubscriptionRecord>,
    email_index: HashMap<String, String>,
    next_seq: u64,
}

/// An in-memory subscription store with the same uniqueness and versioning
/// rules as the durable one.
///
/// Failures and stalls can be injected to exercise the governor's error paths.
#[derive(Default)]
pub struct NullStore {
    tables: Mutex<Tables>,
    failing: AtomicBool,
    pending_conflicts: AtomicU32,
    delay: Mutex<Option<Duration>>,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a backend error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Reject the next `count` updates with `StoreError::Conflict`.
    pub fn inject_conflicts(&self, count: u32) {
        self.pending_conflicts.store(count, Ordering::SeqCst);
    }

    /// Stall every call for `delay` before doing any work.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Read a record without going through the async trait.
    pub fn get(&self, email: &Email) -> Option<SubscriptionRecord> {
        let tables = self.tables.lock().unwrap();
        tables
            .email_index
            .get(email.as_str())
            .and_then(|id| tables.records.get(id))
            .cloned()
    }

    /// Overwrite a record as-is, bypassing version checks.
    pub fn put(&self, record: SubscriptionRecord) {
        let mut tables = self.tables.lock().unwrap();
        tables
            .email_index
            .insert(record.email.as_str().to_string(), record.id.as_str().to_string());
        tables.records.insert(record.id.as_str().to_string(), record);
    }

    pub fn len(&self) -> usize {
        self.tables.lock().unwrap().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn enter(&self) -> Result<(), StoreError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("null store failure".into()));
        }
        Ok(())
    }

    fn take_conflict(&self) -> bool {
        self.pending_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl SubscriptionStore for NullStore {
    async fn find_by_email(&self, email: &Email) -> Result<SubscriptionRecord, StoreError> {
        self.enter().await?;
        self.get(email)
            .ok_or_else(|| StoreError::NotFound("subscription".into()))
    }

    async fn find_by_id_and_code(
        &self,
        id: &SubscriberId,
        code: &str,
    ) -> Result<SubscriptionRecord, StoreError> {
        self.enter().await?;
        let tables = self.tables.lock().unwrap();
        match tables.records.get(id.as_str()) {
            Some(record) if codes_match(&record.verification_code, code) => Ok(record.clone()),
            _ => Err(StoreError::NotFound("subscription".into())),
        }
    }

    async fn create(
        &self,
        new: NewSubscription,
        now: Timestamp,
    ) -> Result<SubscriptionRecord, StoreError> {
        self.enter().await?;
        let mut tables = self.tables.lock().unwrap();
        if tables.email_index.contains_key(new.email.as_str()) {
            return Err(StoreError::Duplicate(new.email.to_string()));
        }
        tables.next_seq += 1;
        let record = SubscriptionRecord::create(SubscriberId::from_sequence(tables.next_seq), new, now);
        tables
            .email_index
            .insert(record.email.as_str().to_string(), record.id.as_str().to_string());
        tables
            .records
            .insert(record.id.as_str().to_string(), record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        record: &SubscriptionRecord,
        now: Timestamp,
    ) -> Result<SubscriptionRecord, StoreError> {
        self.enter().await?;
        let mut tables = self.tables.lock().unwrap();
        let current = tables
            .records
            .get(record.id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound("subscription".into()))?;

        if self.take_conflict() || current.version != record.version {
            return Err(StoreError::Conflict {
                id: record.id.to_string(),
                expected: record.version,
                found: current.version,
            });
        }

        let stored = SubscriptionRecord {
            id: current.id,
            email: current.email,
            created_at: current.created_at,
            updated_at: now,
            version: current.version + 1,
            ..record.clone()
        };
        tables
            .records
            .insert(stored.id.as_str().to_string(), stored.clone());
        Ok(stored)
    }
}
