//! Key-value metadata persistence.

use crate::StoreError;

/// Small key-value surface for node bookkeeping that lives beside the badge
/// table: schema version, install markers, anything that is not a badge.
pub trait MetaStore {
    /// Write `value` under `key`, replacing any previous value.
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Read the value under `key`. Fails with [`StoreError::NotFound`] when
    /// the key was never written.
    fn get_meta(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete_meta(&self, key: &str) -> Result<(), StoreError>;

    /// Schema version stamped into this database, or 0 when it has never
    /// been stamped.
    fn get_schema_version(&self) -> Result<u32, StoreError>;

    /// Stamp the database with `version`.
    fn set_schema_version(&self, version: u32) -> Result<(), StoreError>;
}
