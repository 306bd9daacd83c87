//! Badge storage trait.

use crate::StoreError;
use crest_types::{Badge, BadgeId};

/// Trait for badge storage operations.
///
/// A backend holds one table of badge records keyed by id. Backends must be
/// internally consistent under concurrent readers; the registry serializes
/// writers above this trait.
pub trait BadgeStore {
    /// Insert a brand-new badge. Fails with [`StoreError::Duplicate`] if a
    /// badge with the same id already exists.
    fn insert_badge(&self, badge: &Badge) -> Result<(), StoreError>;

    /// Overwrite an existing badge. Fails with [`StoreError::NotFound`] if
    /// no badge with that id exists.
    fn update_badge(&self, badge: &Badge) -> Result<(), StoreError>;

    /// Persist an updated origin record and its freshly created clone in one
    /// atomic step: after a crash either both records are visible or
    /// neither. Fails with [`StoreError::NotFound`] if the origin is absent
    /// and [`StoreError::Duplicate`] if the clone id is taken.
    fn insert_clone(&self, origin: &Badge, clone: &Badge) -> Result<(), StoreError>;

    /// Fetch a badge by id.
    fn get_badge(&self, id: BadgeId) -> Result<Badge, StoreError>;

    /// Whether a badge with this id exists.
    fn contains(&self, id: BadgeId) -> Result<bool, StoreError> {
        match self.get_badge(id) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// The highest id ever assigned, or [`BadgeId::ZERO`] when the store is
    /// empty. Ids are never deleted, so this doubles as the allocation
    /// high-water mark.
    fn latest_badge_id(&self) -> Result<BadgeId, StoreError>;

    /// Number of badges in the store.
    fn badge_count(&self) -> Result<u64, StoreError>;

    /// Up to `limit` badges in ascending id order, starting at `start`
    /// (inclusive).
    fn list_badges(&self, start: BadgeId, limit: usize) -> Result<Vec<Badge>, StoreError>;
}
