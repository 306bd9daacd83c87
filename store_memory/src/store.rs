//! Thread-safe in-memory badge storage.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crest_store::badges::BadgeStore;
use crest_store::meta::MetaStore;
use crest_store::StoreError;
use crest_types::{Badge, BadgeId};

/// An in-memory badge + meta store.
/// Thread-safe for use with tokio's multi-threaded runtime.
///
/// Badges live in a `BTreeMap` keyed by raw id so that iteration order is id
/// order, which `latest_badge_id` and `list_badges` rely on.
pub struct MemoryStore {
    badges: Mutex<BTreeMap<u64, Badge>>,
    meta: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            badges: Mutex::new(BTreeMap::new()),
            meta: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BadgeStore for MemoryStore {
    fn insert_badge(&self, badge: &Badge) -> Result<(), StoreError> {
        let mut badges = self.badges.lock().unwrap();
        if badges.contains_key(&badge.id.as_u64()) {
            return Err(StoreError::Duplicate(badge.id.to_string()));
        }
        badges.insert(badge.id.as_u64(), badge.clone());
        Ok(())
    }

    fn update_badge(&self, badge: &Badge) -> Result<(), StoreError> {
        let mut badges = self.badges.lock().unwrap();
        if !badges.contains_key(&badge.id.as_u64()) {
            return Err(StoreError::NotFound(badge.id.to_string()));
        }
        badges.insert(badge.id.as_u64(), badge.clone());
        Ok(())
    }

    fn insert_clone(&self, origin: &Badge, clone: &Badge) -> Result<(), StoreError> {
        // One lock acquisition covers both writes, so readers never observe
        // the origin updated without its clone or vice versa.
        let mut badges = self.badges.lock().unwrap();
        if !badges.contains_key(&origin.id.as_u64()) {
            return Err(StoreError::NotFound(origin.id.to_string()));
        }
        if badges.contains_key(&clone.id.as_u64()) {
            return Err(StoreError::Duplicate(clone.id.to_string()));
        }
        badges.insert(origin.id.as_u64(), origin.clone());
        badges.insert(clone.id.as_u64(), clone.clone());
        Ok(())
    }

    fn get_badge(&self, id: BadgeId) -> Result<Badge, StoreError> {
        self.badges
            .lock()
            .unwrap()
            .get(&id.as_u64())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn contains(&self, id: BadgeId) -> Result<bool, StoreError> {
        Ok(self.badges.lock().unwrap().contains_key(&id.as_u64()))
    }

    fn latest_badge_id(&self) -> Result<BadgeId, StoreError> {
        Ok(self
            .badges
            .lock()
            .unwrap()
            .keys()
            .next_back()
            .map(|&id| BadgeId::new(id))
            .unwrap_or(BadgeId::ZERO))
    }

    fn badge_count(&self) -> Result<u64, StoreError> {
        Ok(self.badges.lock().unwrap().len() as u64)
    }

    fn list_badges(&self, start: BadgeId, limit: usize) -> Result<Vec<Badge>, StoreError> {
        Ok(self
            .badges
            .lock()
            .unwrap()
            .range(start.as_u64()..)
            .take(limit)
            .map(|(_, badge)| badge.clone())
            .collect())
    }
}

impl MetaStore for MemoryStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.meta
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.meta
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("meta key {key}")))
    }

    fn delete_meta(&self, key: &str) -> Result<(), StoreError> {
        self.meta.lock().unwrap().remove(key);
        Ok(())
    }

    fn get_schema_version(&self) -> Result<u32, StoreError> {
        match self.meta.lock().unwrap().get("schema_version") {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                    StoreError::Serialization("schema_version is not 4 bytes".to_string())
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.put_meta("schema_version", &version.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crest_types::HolderAddress;

    fn badge(id: u64) -> Badge {
        Badge::original(
            BadgeId::new(id),
            HolderAddress::new("holder_a"),
            100,
            "http://sticlalux.ro/bedge.json",
        )
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let store = MemoryStore::new();
        store.insert_badge(&badge(1)).unwrap();
        let read = store.get_badge(BadgeId::new(1)).unwrap();
        assert_eq!(read, badge(1));
    }

    #[test]
    fn insert_duplicate_id_fails() {
        let store = MemoryStore::new();
        store.insert_badge(&badge(1)).unwrap();
        let err = store.insert_badge(&badge(1)).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[test]
    fn update_missing_badge_fails() {
        let store = MemoryStore::new();
        let err = store.update_badge(&badge(9)).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn get_missing_badge_fails() {
        let store = MemoryStore::new();
        let err = store.get_badge(BadgeId::new(404)).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn latest_badge_id_is_zero_when_empty() {
        let store = MemoryStore::new();
        assert_eq!(store.latest_badge_id().unwrap(), BadgeId::ZERO);
    }

    #[test]
    fn latest_badge_id_tracks_max() {
        let store = MemoryStore::new();
        store.insert_badge(&badge(1)).unwrap();
        store.insert_badge(&badge(3)).unwrap();
        store.insert_badge(&badge(2)).unwrap();
        assert_eq!(store.latest_badge_id().unwrap(), BadgeId::new(3));
        assert_eq!(store.badge_count().unwrap(), 3);
    }

    #[test]
    fn insert_clone_writes_both_records() {
        let store = MemoryStore::new();
        let mut origin = badge(1);
        store.insert_badge(&origin).unwrap();

        origin.clones_issued = 1;
        let clone = Badge::cloned(BadgeId::new(2), &origin, HolderAddress::new("holder_a"), 50);
        store.insert_clone(&origin, &clone).unwrap();

        assert_eq!(store.get_badge(BadgeId::new(1)).unwrap().clones_issued, 1);
        let read_clone = store.get_badge(BadgeId::new(2)).unwrap();
        assert_eq!(read_clone.origin_id, Some(BadgeId::new(1)));
        assert_eq!(read_clone.metadata_uri, "http://sticlalux.ro/bedge.json");
    }

    #[test]
    fn insert_clone_requires_existing_origin() {
        let store = MemoryStore::new();
        let origin = badge(1);
        let clone = Badge::cloned(BadgeId::new(2), &origin, HolderAddress::new("holder_a"), 10);
        let err = store.insert_clone(&origin, &clone).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn insert_clone_rejects_taken_clone_id() {
        let store = MemoryStore::new();
        let origin = badge(1);
        store.insert_badge(&origin).unwrap();
        store.insert_badge(&badge(2)).unwrap();

        let clone = Badge::cloned(BadgeId::new(2), &origin, HolderAddress::new("holder_a"), 10);
        let err = store.insert_clone(&origin, &clone).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[test]
    fn list_badges_pages_in_id_order() {
        let store = MemoryStore::new();
        for id in 1..=5 {
            store.insert_badge(&badge(id)).unwrap();
        }
        let first = store.list_badges(BadgeId::new(1), 2).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].id, BadgeId::new(1));
        assert_eq!(first[1].id, BadgeId::new(2));

        let rest = store.list_badges(BadgeId::new(3), 10).unwrap();
        assert_eq!(rest.len(), 3);
        assert_eq!(rest[0].id, BadgeId::new(3));
        assert_eq!(rest[2].id, BadgeId::new(5));
    }

    #[test]
    fn schema_version_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get_schema_version().unwrap(), 0);
        store.set_schema_version(1).unwrap();
        assert_eq!(store.get_schema_version().unwrap(), 1);
    }

    #[test]
    fn meta_delete_removes_key() {
        let store = MemoryStore::new();
        store.put_meta("k", b"v").unwrap();
        assert_eq!(store.get_meta("k").unwrap(), b"v");
        store.delete_meta("k").unwrap();
        assert!(matches!(
            store.get_meta("k").unwrap_err(),
            StoreError::NotFound(_)
        ));
    }
}
