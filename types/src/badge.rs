//! The badge record, the sole entity the registry manages.

use serde::{Deserialize, Serialize};

use crate::{BadgeId, HolderAddress};

/// A badge record.
///
/// Created only by the registry's mint and clone operations, never deleted.
/// `owner` changes via transfer; `clones_issued` only ever increases, and
/// only on the record clones are drawn from. Everything else is fixed at
/// creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    /// Unique identifier, assigned at creation.
    pub id: BadgeId,
    /// Current holder. Always non-empty.
    pub owner: HolderAddress,
    /// Pointer to off-registry descriptive content. Immutable; clones copy
    /// the origin's URI by value at clone time.
    pub metadata_uri: String,
    /// Maximum number of clones that may ever be spawned from this badge.
    pub clone_quota: u64,
    /// Number of clones spawned from this badge so far.
    pub clones_issued: u64,
    /// For a clone, the id of the badge it was cloned from; `None` for an
    /// original.
    pub origin_id: Option<BadgeId>,
}

impl Badge {
    /// Build an original (non-clone) badge.
    pub fn original(
        id: BadgeId,
        owner: HolderAddress,
        clone_quota: u64,
        metadata_uri: impl Into<String>,
    ) -> Self {
        Self {
            id,
            owner,
            metadata_uri: metadata_uri.into(),
            clone_quota,
            clones_issued: 0,
            origin_id: None,
        }
    }

    /// Build a clone of `origin`. Copies the origin's metadata URI and
    /// records the origin's id; the clone starts with zero issued clones and
    /// its own quota.
    pub fn cloned(id: BadgeId, origin: &Badge, owner: HolderAddress, clone_quota: u64) -> Self {
        Self {
            id,
            owner,
            metadata_uri: origin.metadata_uri.clone(),
            clone_quota,
            clones_issued: 0,
            origin_id: Some(origin.id),
        }
    }

    /// Whether this badge was produced by a clone operation.
    pub fn is_clone(&self) -> bool {
        self.origin_id.is_some()
    }

    /// Clone capacity still available on this badge.
    pub fn remaining_clones(&self) -> u64 {
        self.clone_quota.saturating_sub(self.clones_issued)
    }

    /// Whether another clone may be drawn from this badge.
    pub fn has_clone_capacity(&self) -> bool {
        self.clones_issued < self.clone_quota
    }
}
