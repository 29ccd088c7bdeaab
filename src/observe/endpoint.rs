//! Observing endpoint: every relation held with one remote address.
//!
//! # Responsibilities
//! - Group relations by client address, one per resource path
//! - Keep the relation table and the resource in sync on link and remove
//! - Cancel every relation of the endpoint at once
//!
//! # Design Decisions
//! - Holds only weak lookups; the relation table owns the relations
//! - Removal is identity-checked so a stale relation never evicts its replacement

use std::collections::HashMap;
use std::net::SocketAddr;
use std::ptr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::observe::relation::ObserveRelation;
use crate::observe::resource::ObservableResource;
use crate::observe::table::RelationTable;

#[derive(Debug)]
pub struct ObservingEndpoint {
    addr: SocketAddr,
    /// Resource path -> relation.
    relations: Mutex<HashMap<String, Weak<ObserveRelation>>>,
    table: Weak<RelationTable>,
}

impl ObservingEndpoint {
    /// Create an endpoint that is not attached to any relation table.
    pub fn new(addr: SocketAddr) -> Self {
        Self::with_table(addr, Weak::new())
    }

    pub(crate) fn with_table(addr: SocketAddr, table: Weak<RelationTable>) -> Self {
        Self {
            addr,
            relations: Mutex::new(HashMap::new()),
            table,
        }
    }

    /// Stable address key of the remote client.
    pub fn identity(&self) -> SocketAddr {
        self.addr
    }

    /// Link `relation` into this endpoint, the relation table and its resource
    /// as one step, returning the live relation it replaced, if any.
    ///
    /// Runs under the endpoint lock so concurrent registrations and
    /// [`ObservingEndpoint::cancel_all`] are serialized.
    pub fn link_relation(&self, relation: &Arc<ObserveRelation>) -> Option<Arc<ObserveRelation>> {
        let mut relations = self.lock_relations();

        let replaced = relations
            .insert(relation.key().path.clone(), Arc::downgrade(relation))
            .and_then(|w| w.upgrade());
        let replaced_in_table = self
            .table
            .upgrade()
            .and_then(|table| table.insert(relation.clone()));
        relation.resource().add_relation(relation);

        drop(relations);

        replaced
            .or(replaced_in_table)
            .filter(|previous| !Arc::ptr_eq(previous, relation))
    }

    /// Unlink `relation`. Not finding it is not an error.
    pub fn remove_relation(&self, relation: &ObserveRelation) {
        {
            let mut relations = self.lock_relations();
            let path = &relation.key().path;
            let owned = relations
                .get(path)
                .is_some_and(|w| ptr::eq(w.as_ptr(), relation) || w.strong_count() == 0);
            if owned {
                relations.remove(path);
            }
        }

        if let Some(table) = self.table.upgrade() {
            table.remove(relation);
        }
    }

    /// The live relation observing `path`, if any.
    pub fn relation(&self, path: &str) -> Option<Arc<ObserveRelation>> {
        self.lock_relations().get(path).and_then(Weak::upgrade)
    }

    /// Snapshot of all live relations.
    pub fn relations(&self) -> Vec<Arc<ObserveRelation>> {
        self.lock_relations()
            .values()
            .filter_map(Weak::upgrade)
            .collect()
    }

    pub fn relation_count(&self) -> usize {
        self.lock_relations().len()
    }

    /// Cancel every relation held with this endpoint.
    ///
    /// The set is drained under the lock, then each relation is cancelled with
    /// the lock released, so every relation is processed exactly once.
    pub fn cancel_all(&self) {
        let drained: Vec<Arc<ObserveRelation>> = std::mem::take(&mut *self.lock_relations())
            .into_values()
            .filter_map(|w| w.upgrade())
            .collect();

        tracing::debug!(
            endpoint = %self.addr,
            count = drained.len(),
            "Cancelling all observe relations of endpoint"
        );

        for relation in drained {
            relation.cancel();
        }
    }

    fn lock_relations(&self) -> MutexGuard<'_, HashMap<String, Weak<ObserveRelation>>> {
        self.relations.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
