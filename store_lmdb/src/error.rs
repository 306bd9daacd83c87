//! LMDB-specific error type.

use thiserror::Error;

/// Errors raised inside the LMDB backend before they are widened to
/// [`StoreError`](crest_store::StoreError).
#[derive(Debug, Error)]
pub enum LmdbError {
    /// The heed environment or a transaction failed.
    #[error("lmdb failure: {0}")]
    Heed(String),

    /// No record under the requested key.
    #[error("no record for key {0}")]
    NotFound(String),

    /// Bincode rejected a value while encoding or decoding.
    #[error("bad encoding: {0}")]
    Serialization(String),
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<bincode::Error> for LmdbError {
    fn from(e: bincode::Error) -> Self {
        LmdbError::Serialization(e.to_string())
    }
}

impl From<LmdbError> for crest_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::NotFound(key) => crest_store::StoreError::NotFound(key),
            other => crest_store::StoreError::Backend(other.to_string()),
        }
    }
}
