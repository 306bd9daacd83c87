//! In-memory storage backend for the Crest registry.
//!
//! Backs ephemeral deployments (`ephemeral = true` in the node config) and
//! tests. Nothing touches the filesystem; dropping the store drops the
//! registry's entire state.

pub mod store;

pub use store::MemoryStore;
