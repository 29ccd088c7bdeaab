//! Observable resources.
//!
//! The resource tree lives outside this crate. A resource takes part in
//! observation by implementing [`ObservableResource`] and embedding an
//! [`ObserverSet`]; the default methods keep the set consistent with the
//! relation lifecycle.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::ptr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::message::Exchange;
use crate::observe::relation::ObserveRelation;

/// A resource that clients can observe.
pub trait ObservableResource: Send + Sync {
    /// Path identity of the resource.
    fn path(&self) -> &str;

    /// Relations currently observing this resource.
    fn observers(&self) -> &ObserverSet;

    /// Process `exchange` again, asynchronously.
    ///
    /// Implementations hand the resulting response to
    /// [`ObserveRelation::record_notification`] of `exchange.relation()`.
    fn dispatch(&self, exchange: Arc<Exchange>);

    fn add_relation(&self, relation: &Arc<ObserveRelation>) {
        self.observers().add(relation);
    }

    fn remove_relation(&self, relation: &ObserveRelation) {
        self.observers().remove(relation);
    }

    fn observer_count(&self) -> usize {
        self.observers().len()
    }

    /// The resource state changed: notify every observer.
    fn changed(&self) {
        for relation in self.observers().snapshot() {
            relation.notify_observers();
        }
    }

    /// Cancel every relation observing this resource (e.g. on deletion).
    fn cancel_observers(&self) {
        for relation in self.observers().snapshot() {
            relation.cancel();
        }
    }
}

/// Weak lookups from a resource to the relations observing it, keyed by the
/// observing client's address.
#[derive(Debug, Default)]
pub struct ObserverSet {
    relations: Mutex<HashMap<SocketAddr, Weak<ObserveRelation>>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `relation`, replacing any entry for the same client.
    pub fn add(&self, relation: &Arc<ObserveRelation>) {
        self.lock()
            .insert(relation.key().endpoint, Arc::downgrade(relation));
    }

    /// Remove `relation` if it is the one registered for its client.
    pub fn remove(&self, relation: &ObserveRelation) -> bool {
        let mut relations = self.lock();
        let addr = relation.key().endpoint;
        let owned = relations
            .get(&addr)
            .is_some_and(|w| ptr::eq(w.as_ptr(), relation) || w.strong_count() == 0);
        if owned {
            relations.remove(&addr);
        }
        owned
    }

    pub fn contains(&self, relation: &ObserveRelation) -> bool {
        self.lock()
            .get(&relation.key().endpoint)
            .is_some_and(|w| ptr::eq(w.as_ptr(), relation))
    }

    /// Live relations, collected with the lock released afterwards.
    pub fn snapshot(&self) -> Vec<Arc<ObserveRelation>> {
        self.lock().values().filter_map(Weak::upgrade).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SocketAddr, Weak<ObserveRelation>>> {
        self.relations.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
