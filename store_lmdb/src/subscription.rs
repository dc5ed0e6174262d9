//! LMDB implementation of SubscriptionStore.
//!
//! `subscriptions` maps id → bincode record, `email_index` maps email → id,
//! `meta` holds the id sequence under `next_id`. Create and update run their
//! uniqueness and version checks inside the write transaction, so they hold
//! even with concurrent writers (LMDB serialises write transactions).
//!
//! LMDB calls block, so each operation runs on tokio's blocking pool.

use std::sync::Arc;

use async_trait::async_trait;
use heed::types::{Bytes, Str};
use heed::{Database, Env, RoTxn};

use wordrop_store::{codes_match, StoreError, SubscriptionStore};
use wordrop_types::{Email, NewSubscription, SubscriberId, SubscriptionRecord, Timestamp};

use crate::LmdbError;

const NEXT_ID_KEY: &str = "next_id";

#[derive(Clone)]
pub struct LmdbSubscriptionStore {
    pub(crate) env: Arc<Env>,
    pub(crate) subscriptions_db: Database<Str, Bytes>,
    pub(crate) email_index_db: Database<Str, Str>,
    pub(crate) meta_db: Database<Str, Bytes>,
}

impl LmdbSubscriptionStore {
    async fn blocking<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(LmdbSubscriptionStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(store))
            .await
            .map_err(|e| StoreError::from(LmdbError::Join(e.to_string())))?
    }

    fn read_record(&self, rtxn: &RoTxn, id: &str) -> Result<Option<SubscriptionRecord>, LmdbError> {
        match self.subscriptions_db.get(rtxn, id)? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    fn find_by_email_sync(&self, email: &Email) -> Result<SubscriptionRecord, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let id = self
            .email_index_db
            .get(&rtxn, email.as_str())?
            .ok_or_else(|| LmdbError::NotFound("subscription".into()))?;
        self.read_record(&rtxn, id)?
            .ok_or_else(|| LmdbError::Heed(format!("email index points at missing record {id}")))
    }

    fn find_by_id_and_code_sync(
        &self,
        id: &SubscriberId,
        code: &str,
    ) -> Result<SubscriptionRecord, LmdbError> {
        let rtxn = self.env.read_txn()?;
        match self.read_record(&rtxn, id.as_str())? {
            Some(record) if codes_match(&record.verification_code, code) => Ok(record),
            _ => Err(LmdbError::NotFound("subscription".into())),
        }
    }

    fn create_sync(&self, new: NewSubscription, now: Timestamp) -> Result<SubscriptionRecord, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        if self
            .email_index_db
            .get(&wtxn, new.email.as_str())
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(new.email.to_string()));
        }

        let seq = match self.meta_db.get(&wtxn, NEXT_ID_KEY).map_err(LmdbError::from)? {
            Some(bytes) => {
                let buf: [u8; 8] = bytes
                    .try_into()
                    .map_err(|_| LmdbError::Serialization("corrupt id sequence".into()))?;
                u64::from_be_bytes(buf)
            }
            None => 1,
        };

        let record = SubscriptionRecord::create(SubscriberId::from_sequence(seq), new, now);
        let encoded = bincode::serialize(&record).map_err(LmdbError::from)?;

        self.meta_db
            .put(&mut wtxn, NEXT_ID_KEY, &(seq + 1).to_be_bytes())
            .map_err(LmdbError::from)?;
        self.subscriptions_db
            .put(&mut wtxn, record.id.as_str(), &encoded)
            .map_err(LmdbError::from)?;
        self.email_index_db
            .put(&mut wtxn, record.email.as_str(), record.id.as_str())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(id = %record.id, "created subscription record");
        Ok(record)
    }

    fn update_sync(&self, record: SubscriptionRecord, now: Timestamp) -> Result<SubscriptionRecord, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let current = match self
            .subscriptions_db
            .get(&wtxn, record.id.as_str())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => bincode::deserialize::<SubscriptionRecord>(bytes).map_err(LmdbError::from)?,
            None => return Err(StoreError::NotFound("subscription".into())),
        };

        if current.version != record.version {
            return Err(StoreError::Conflict {
                id: record.id.to_string(),
                expected: record.version,
                found: current.version,
            });
        }

        // id, email and creation time are immutable.
        let stored = SubscriptionRecord {
            id: current.id,
            email: current.email,
            created_at: current.created_at,
            updated_at: now,
            version: current.version + 1,
            ..record
        };
        let encoded = bincode::serialize(&stored).map_err(LmdbError::from)?;
        self.subscriptions_db
            .put(&mut wtxn, stored.id.as_str(), &encoded)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        Ok(stored)
    }
}

#[async_trait]
impl SubscriptionStore for LmdbSubscriptionStore {
    async fn find_by_email(&self, email: &Email) -> Result<SubscriptionRecord, StoreError> {
        let email = email.clone();
        self.blocking(move |store| store.find_by_email_sync(&email).map_err(StoreError::from))
            .await
    }

    async fn find_by_id_and_code(
        &self,
        id: &SubscriberId,
        code: &str,
    ) -> Result<SubscriptionRecord, StoreError> {
        let (id, code) = (id.clone(), code.to_string());
        self.blocking(move |store| {
            store
                .find_by_id_and_code_sync(&id, &code)
                .map_err(StoreError::from)
        })
        .await
    }

    async fn create(
        &self,
        new: NewSubscription,
        now: Timestamp,
    ) -> Result<SubscriptionRecord, StoreError> {
        self.blocking(move |store| store.create_sync(new, now)).await
    }

    async fn update(
        &self,
        record: &SubscriptionRecord,
        now: Timestamp,
    ) -> Result<SubscriptionRecord, StoreError> {
        let record = record.clone();
        self.blocking(move |store| store.update_sync(record, now)).await
    }
}
