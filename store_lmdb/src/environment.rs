//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};

use crate::subscription::LmdbSubscriptionStore;
use crate::LmdbError;

/// Named databases opened inside the environment.
const SUBSCRIPTIONS_DB: &str = "subscriptions";
const EMAIL_INDEX_DB: &str = "email_index";
const META_DB: &str = "meta";

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    subscriptions_db: Database<Str, Bytes>,
    email_index_db: Database<Str, Str>,
    meta_db: Database<Str, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    ///
    /// The directory is created if missing. `map_size` is the maximum size of
    /// the memory map in bytes.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path).map_err(|e| LmdbError::Heed(e.to_string()))?;

        // SAFETY: the environment is opened once per path by this process and
        // never concurrently re-opened with different options.
        let env = unsafe {
            EnvOpenOptions::new()
                .max_dbs(max_dbs)
                .map_size(map_size)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let subscriptions_db = env.create_database(&mut wtxn, Some(SUBSCRIPTIONS_DB))?;
        let email_index_db = env.create_database(&mut wtxn, Some(EMAIL_INDEX_DB))?;
        let meta_db = env.create_database(&mut wtxn, Some(META_DB))?;
        wtxn.commit()?;

        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env: Arc::new(env),
            subscriptions_db,
            email_index_db,
            meta_db,
        })
    }

    /// A store handle sharing this environment. Cheap to clone.
    pub fn subscription_store(&self) -> LmdbSubscriptionStore {
        LmdbSubscriptionStore {
            env: Arc::clone(&self.env),
            subscriptions_db: self.subscriptions_db,
            email_index_db: self.email_index_db,
            meta_db: self.meta_db,
        }
    }
}
