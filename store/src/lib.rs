//! Abstract storage traits for the Crest registry.
//!
//! Every storage backend (LMDB, in-memory) implements these traits. The rest
//! of the codebase depends only on the traits, so backends are swappable at
//! runtime.

pub mod badges;
pub mod error;
pub mod meta;

pub use badges::BadgeStore;
pub use error::StoreError;
pub use meta::MetaStore;

/// A boxed badge store, used where the backend is chosen at runtime (the
/// node picks LMDB or in-memory from its configuration).
pub type DynBadgeStore = Box<dyn BadgeStore + Send + Sync>;

impl<T: BadgeStore + ?Sized> BadgeStore for Box<T> {
    fn insert_badge(&self, badge: &crest_types::Badge) -> Result<(), StoreError> {
        (**self).insert_badge(badge)
    }

    fn update_badge(&self, badge: &crest_types::Badge) -> Result<(), StoreError> {
        (**self).update_badge(badge)
    }

    fn insert_clone(
        &self,
        origin: &crest_types::Badge,
        clone: &crest_types::Badge,
    ) -> Result<(), StoreError> {
        (**self).insert_clone(origin, clone)
    }

    fn get_badge(&self, id: crest_types::BadgeId) -> Result<crest_types::Badge, StoreError> {
        (**self).get_badge(id)
    }

    fn contains(&self, id: crest_types::BadgeId) -> Result<bool, StoreError> {
        (**self).contains(id)
    }

    fn latest_badge_id(&self) -> Result<crest_types::BadgeId, StoreError> {
        (**self).latest_badge_id()
    }

    fn badge_count(&self) -> Result<u64, StoreError> {
        (**self).badge_count()
    }

    fn list_badges(
        &self,
        start: crest_types::BadgeId,
        limit: usize,
    ) -> Result<Vec<crest_types::Badge>, StoreError> {
        (**self).list_badges(start, limit)
    }
}
