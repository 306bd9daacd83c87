//! Events emitted by registry mutations for subscribers.

use crest_types::{BadgeId, HolderAddress};

/// Registry-level events that observers can subscribe to via the [`EventBus`].
///
/// Emission order is part of the registry contract: a clone emits
/// [`RegistryEvent::OriginalBadgeUpdated`] for the origin strictly before
/// [`RegistryEvent::BadgeCloned`] for the new badge. Transfers emit nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A new original badge was minted.
    BadgeMinted {
        badge_id: BadgeId,
        clone_quota: u64,
        clones_issued: u64,
        metadata_uri: String,
        owner: HolderAddress,
    },
    /// An origin badge's issued-clone counter advanced.
    OriginalBadgeUpdated {
        origin_id: BadgeId,
        clones_issued: u64,
    },
    /// A clone was drawn from an origin badge.
    BadgeCloned {
        badge_id: BadgeId,
        origin_id: BadgeId,
        metadata_uri: String,
        owner: HolderAddress,
    },
}

/// A registered event callback.
type Listener = Box<dyn Fn(&RegistryEvent) + Send + Sync>;

/// Synchronous fan-out of registry events.
///
/// Listeners run inline on the emitting thread, in subscription order; keep
/// handlers fast to avoid stalling registry writes.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener. There is no unsubscribe; the bus lives as long as the
    /// registry it belongs to.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&RegistryEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Hand `event` to every listener, in subscription order.
    pub fn emit(&self, event: &RegistryEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn minted(id: u64) -> RegistryEvent {
        RegistryEvent::BadgeMinted {
            badge_id: BadgeId::new(id),
            clone_quota: 100,
            clones_issued: 0,
            metadata_uri: "http://sticlalux.ro/bedge.json".into(),
            owner: HolderAddress::new("holder_a"),
        }
    }

    fn cloned(id: u64, origin: u64) -> RegistryEvent {
        RegistryEvent::BadgeCloned {
            badge_id: BadgeId::new(id),
            origin_id: BadgeId::new(origin),
            metadata_uri: "http://sticlalux.ro/bedge.json".into(),
            owner: HolderAddress::new("holder_a"),
        }
    }

    #[test]
    fn every_listener_sees_every_event() {
        let seen: Arc<Mutex<Vec<(usize, RegistryEvent)>>> = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        for listener_id in 0..2 {
            let sink = Arc::clone(&seen);
            bus.subscribe(move |event: &RegistryEvent| {
                sink.lock().unwrap().push((listener_id, event.clone()));
            });
        }
        assert_eq!(bus.listener_count(), 2);

        bus.emit(&minted(1));
        bus.emit(&minted(2));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        for listener_id in 0..2 {
            for id in 1..=2 {
                assert!(seen.contains(&(listener_id, minted(id))));
            }
        }
    }

    #[test]
    fn listeners_run_in_subscription_order() {
        let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        let first = Arc::clone(&order);
        bus.subscribe(move |_: &RegistryEvent| first.lock().unwrap().push("first"));
        let second = Arc::clone(&order);
        bus.subscribe(move |_: &RegistryEvent| second.lock().unwrap().push("second"));

        bus.emit(&minted(1));
        assert_eq!(*order.lock().unwrap(), ["first", "second"]);
    }

    #[test]
    fn emitting_without_listeners_is_fine() {
        let bus = EventBus::default();
        assert_eq!(bus.listener_count(), 0);
        bus.emit(&minted(1));
    }

    #[test]
    fn listeners_can_filter_by_variant() {
        let clone_ids: Arc<Mutex<Vec<BadgeId>>> = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        let sink = Arc::clone(&clone_ids);
        bus.subscribe(move |event: &RegistryEvent| {
            if let RegistryEvent::BadgeCloned { badge_id, .. } = event {
                sink.lock().unwrap().push(*badge_id);
            }
        });

        bus.emit(&minted(1));
        bus.emit(&cloned(2, 1));

        assert_eq!(*clone_ids.lock().unwrap(), [BadgeId::new(2)]);
    }
}
