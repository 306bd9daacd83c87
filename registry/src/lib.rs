//! Badge registry core.
//!
//! Owns the badge state machine: minting originals, drawing clones against an
//! origin's quota, transferring ownership, and the read queries the RPC layer
//! serves. Storage is abstracted behind `crest-store` traits so the same
//! registry runs on LMDB or in memory.

pub mod error;
pub mod event;
pub mod registry;

pub use error::RegistryError;
pub use event::{EventBus, RegistryEvent};
pub use registry::BadgeRegistry;
