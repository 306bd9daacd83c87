//! Fundamental types for the Crest badge registry.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: badge identifiers, holder identities, and the badge record.

pub mod badge;
pub mod badge_id;
pub mod holder;

pub use badge::Badge;
pub use badge_id::BadgeId;
pub use holder::HolderAddress;
