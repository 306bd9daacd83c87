//! Error type shared by every store backend.

use thiserror::Error;

/// Failures surfaced by [`BadgeStore`](crate::BadgeStore) and
/// [`MetaStore`](crate::MetaStore) implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record under the requested key.
    #[error("no record for key {0}")]
    NotFound(String),

    /// A record already exists under the key being inserted.
    #[error("record already exists for key {0}")]
    Duplicate(String),

    /// The underlying storage engine failed.
    #[error("backend failure: {0}")]
    Backend(String),

    /// A value could not be encoded or decoded.
    #[error("bad encoding: {0}")]
    Serialization(String),

    /// On-disk data does not match what the schema promises.
    #[error("corrupt badge database: {0}")]
    Corruption(String),
}
