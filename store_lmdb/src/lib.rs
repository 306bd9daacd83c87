//! LMDB storage backend for the Crest badge registry.
//!
//! Implements the storage traits from `crest-store` using the `heed` LMDB
//! bindings. All badge and meta records live in a single LMDB environment
//! with one database per record kind.

pub mod error;
pub mod migration;
pub mod store;

pub use error::LmdbError;
pub use store::LmdbStore;
