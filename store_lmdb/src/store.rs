//! LMDB implementation of BadgeStore and MetaStore.
//!
//! Badges are keyed by their big-endian encoded id so that LMDB's key order
//! is id order. The latest allocated id is therefore the last key in the
//! database, which lets the registry resume its id sequence after a restart
//! without a separate counter record.

use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crest_store::badges::BadgeStore;
use crest_store::meta::MetaStore;
use crest_store::StoreError;
use crest_types::{Badge, BadgeId};

use crate::migration::Migrator;
use crate::LmdbError;

const BADGES_DB: &str = "badges";
const META_DB: &str = "meta";
const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Number of named LMDB databases inside the environment.
const MAX_DBS: u32 = 2;

pub struct LmdbStore {
    env: Arc<Env>,
    badges_db: Database<Bytes, Bytes>,
    meta_db: Database<Bytes, Bytes>,
}

impl LmdbStore {
    /// Open or create an LMDB environment at the given path and run any
    /// pending schema migrations.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)
            .map_err(|e| LmdbError::Heed(format!("failed to create {}: {}", path.display(), e)))?;

        // SAFETY: each store owns its own data directory; the same path is
        // never opened twice within one process.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let badges_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some(BADGES_DB))?;
        let meta_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some(META_DB))?;
        wtxn.commit()?;

        let store = Self {
            env: Arc::new(env),
            badges_db,
            meta_db,
        };
        Migrator::run(&store)?;
        Ok(store)
    }
}

fn badge_key(id: BadgeId) -> [u8; 8] {
    id.as_u64().to_be_bytes()
}

impl BadgeStore for LmdbStore {
    fn insert_badge(&self, badge: &Badge) -> Result<(), StoreError> {
        let key = badge_key(badge.id);
        let bytes = bincode::serialize(badge).map_err(LmdbError::from)?;

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .badges_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(badge.id.to_string()));
        }
        self.badges_db
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn update_badge(&self, badge: &Badge) -> Result<(), StoreError> {
        let key = badge_key(badge.id);
        let bytes = bincode::serialize(badge).map_err(LmdbError::from)?;

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .badges_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .is_none()
        {
            return Err(StoreError::NotFound(badge.id.to_string()));
        }
        self.badges_db
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn insert_clone(&self, origin: &Badge, clone: &Badge) -> Result<(), StoreError> {
        let origin_key = badge_key(origin.id);
        let clone_key = badge_key(clone.id);
        let origin_bytes = bincode::serialize(origin).map_err(LmdbError::from)?;
        let clone_bytes = bincode::serialize(clone).map_err(LmdbError::from)?;

        // One transaction covers the origin update and the clone insert.
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .badges_db
            .get(&wtxn, &origin_key)
            .map_err(LmdbError::from)?
            .is_none()
        {
            return Err(StoreError::NotFound(origin.id.to_string()));
        }
        if self
            .badges_db
            .get(&wtxn, &clone_key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(clone.id.to_string()));
        }
        self.badges_db
            .put(&mut wtxn, &origin_key, &origin_bytes)
            .map_err(LmdbError::from)?;
        self.badges_db
            .put(&mut wtxn, &clone_key, &clone_bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_badge(&self, id: BadgeId) -> Result<Badge, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .badges_db
            .get(&rtxn, &badge_key(id))
            .map_err(LmdbError::from)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let badge = bincode::deserialize(bytes).map_err(LmdbError::from)?;
        Ok(badge)
    }

    fn contains(&self, id: BadgeId) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .badges_db
            .get(&rtxn, &badge_key(id))
            .map_err(LmdbError::from)?
            .is_some();
        Ok(found)
    }

    fn latest_badge_id(&self) -> Result<BadgeId, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self.badges_db.last(&rtxn).map_err(LmdbError::from)? {
            Some((key, _)) => {
                let arr: [u8; 8] = key
                    .try_into()
                    .map_err(|_| LmdbError::Serialization("invalid badge key length".into()))?;
                Ok(BadgeId::new(u64::from_be_bytes(arr)))
            }
            None => Ok(BadgeId::ZERO),
        }
    }

    fn badge_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.badges_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }

    fn list_badges(&self, start: BadgeId, limit: usize) -> Result<Vec<Badge>, StoreError> {
        let start_key = badge_key(start);
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let range = (Bound::Included(&start_key[..]), Bound::Unbounded);
        let iter = self
            .badges_db
            .range(&rtxn, &range)
            .map_err(LmdbError::from)?;

        let mut badges = Vec::new();
        for result in iter.take(limit) {
            let (_, bytes) = result.map_err(LmdbError::from)?;
            badges.push(bincode::deserialize(bytes).map_err(LmdbError::from)?);
        }
        Ok(badges)
    }
}

impl MetaStore for LmdbStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, key.as_bytes(), value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, key.as_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("meta key {key}")))?;
        Ok(val.to_vec())
    }

    fn delete_meta(&self, key: &str) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .delete(&mut wtxn, key.as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_schema_version(&self) -> Result<u32, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, SCHEMA_VERSION_KEY)
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                    LmdbError::Serialization("schema_version is not 4 bytes".to_string())
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        let bytes = version.to_le_bytes();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, SCHEMA_VERSION_KEY, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
