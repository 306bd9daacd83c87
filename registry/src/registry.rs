//! The badge state machine: mint, clone, transfer, and read queries.

use std::sync::Mutex;

use crest_store::badges::BadgeStore;
use crest_store::StoreError;
use crest_types::{Badge, BadgeId, HolderAddress};

use crate::error::RegistryError;
use crate::event::{EventBus, RegistryEvent};

/// The badge registry.
///
/// All mutations run under a single write lock so id allocation and quota
/// accounting stay serial; a failed operation leaves no partial state behind.
/// Events are emitted while the lock is still held, which makes the observed
/// event order the commit order. Reads go straight to the store and never
/// take the lock.
pub struct BadgeRegistry<S: BadgeStore> {
    store: S,
    write_lock: Mutex<()>,
    events: EventBus,
}

impl<S: BadgeStore> BadgeRegistry<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
            events: EventBus::new(),
        }
    }

    /// Register a listener for registry events.
    ///
    /// Listeners must be wired before the registry is shared; they run inline
    /// on the mutating thread.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&RegistryEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(listener);
    }

    // ── Mutations ───────────────────────────────────────────────────────

    /// Mint a new original badge and return its id.
    ///
    /// Ids start at 1 and increase by one per creation; they are never
    /// reused, even across restarts.
    pub fn mint(
        &self,
        owner: HolderAddress,
        clone_quota: u64,
        metadata_uri: impl Into<String>,
    ) -> Result<BadgeId, RegistryError> {
        if owner.is_empty() {
            return Err(RegistryError::InvalidOwner);
        }

        let _guard = self.write_lock.lock().unwrap();
        let id = self.store.latest_badge_id()?.next();
        let badge = Badge::original(id, owner, clone_quota, metadata_uri);
        self.store.insert_badge(&badge)?;

        tracing::debug!(badge_id = %id, owner = %badge.owner, "badge minted");
        self.events.emit(&RegistryEvent::BadgeMinted {
            badge_id: id,
            clone_quota,
            clones_issued: 0,
            metadata_uri: badge.metadata_uri.clone(),
            owner: badge.owner.clone(),
        });
        Ok(id)
    }

    /// Draw a clone from `origin_id` and return the clone's id.
    ///
    /// Consumes exactly one unit of the origin's quota no matter how many
    /// clones the new badge is itself allowed (`requested_clones` becomes the
    /// clone's own quota, uncapped). Only the origin's current owner may
    /// clone, and the clone is issued to that same owner.
    pub fn clone_badge(
        &self,
        requester: &HolderAddress,
        origin_id: BadgeId,
        requested_clones: u64,
    ) -> Result<BadgeId, RegistryError> {
        let _guard = self.write_lock.lock().unwrap();

        let mut origin = self.load_badge(origin_id)?;
        if origin.owner != *requester {
            return Err(RegistryError::Unauthorized {
                badge_id: origin_id,
            });
        }
        if !origin.has_clone_capacity() {
            return Err(RegistryError::QuotaExceeded {
                badge_id: origin_id,
                clone_quota: origin.clone_quota,
            });
        }

        origin.clones_issued += 1;
        let clone_id = self.store.latest_badge_id()?.next();
        let clone = Badge::cloned(clone_id, &origin, requester.clone(), requested_clones);
        self.store.insert_clone(&origin, &clone)?;

        tracing::debug!(
            badge_id = %clone_id,
            origin_id = %origin_id,
            clones_issued = origin.clones_issued,
            "badge cloned"
        );
        self.events.emit(&RegistryEvent::OriginalBadgeUpdated {
            origin_id,
            clones_issued: origin.clones_issued,
        });
        self.events.emit(&RegistryEvent::BadgeCloned {
            badge_id: clone_id,
            origin_id,
            metadata_uri: clone.metadata_uri.clone(),
            owner: clone.owner.clone(),
        });
        Ok(clone_id)
    }

    /// Transfer `badge_id` from its current owner to `to`.
    ///
    /// Emits no event; the change is observable via [`BadgeRegistry::owner_of`].
    /// Transferring a badge to its current owner is a permitted no-op.
    pub fn transfer(
        &self,
        from: &HolderAddress,
        to: HolderAddress,
        badge_id: BadgeId,
    ) -> Result<(), RegistryError> {
        let _guard = self.write_lock.lock().unwrap();

        let mut badge = self.load_badge(badge_id)?;
        if badge.owner != *from {
            return Err(RegistryError::Unauthorized { badge_id });
        }
        if to.is_empty() {
            return Err(RegistryError::InvalidOwner);
        }

        badge.owner = to;
        self.store.update_badge(&badge)?;
        tracing::debug!(badge_id = %badge_id, owner = %badge.owner, "badge transferred");
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// The highest badge id ever assigned; [`BadgeId::ZERO`] when nothing has
    /// been minted yet.
    pub fn latest_badge_id(&self) -> Result<BadgeId, RegistryError> {
        Ok(self.store.latest_badge_id()?)
    }

    /// The metadata URI recorded for `id`.
    pub fn token_uri(&self, id: BadgeId) -> Result<String, RegistryError> {
        Ok(self.load_badge(id)?.metadata_uri)
    }

    /// The current owner of `id`.
    pub fn owner_of(&self, id: BadgeId) -> Result<HolderAddress, RegistryError> {
        Ok(self.load_badge(id)?.owner)
    }

    /// The full badge record for `id`.
    pub fn get_badge(&self, id: BadgeId) -> Result<Badge, RegistryError> {
        self.load_badge(id)
    }

    /// Total number of badges (originals and clones).
    pub fn badge_count(&self) -> Result<u64, RegistryError> {
        Ok(self.store.badge_count()?)
    }

    /// Badges with id >= `start`, ascending, at most `limit` of them.
    pub fn list_badges(&self, start: BadgeId, limit: usize) -> Result<Vec<Badge>, RegistryError> {
        Ok(self.store.list_badges(start, limit)?)
    }

    fn load_badge(&self, id: BadgeId) -> Result<Badge, RegistryError> {
        match self.store.get_badge(id) {
            Ok(badge) => Ok(badge),
            Err(StoreError::NotFound(_)) => Err(RegistryError::NotFound(id)),
            Err(e) => Err(RegistryError::Storage(e)),
        }
    }
}
