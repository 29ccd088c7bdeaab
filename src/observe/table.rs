//! Relation table: the single owner of every observe relation.
//!
//! # Responsibilities
//! - Own relations keyed by (endpoint address, resource path)
//! - Own the observing endpoint entries, created on demand
//! - Hold the freshness policy given to new relations (hot-swappable)
//! - Provide snapshots for the freshness sweeper

use std::net::SocketAddr;
use std::ptr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;

use crate::message::Exchange;
use crate::observability::metrics;
use crate::observe::endpoint::ObservingEndpoint;
use crate::observe::error::{ObserveError, ObserveResult};
use crate::observe::freshness::FreshnessPolicy;
use crate::observe::relation::{ObserveRelation, RelationKey};
use crate::observe::resource::ObservableResource;

#[derive(Debug)]
pub struct RelationTable {
    relations: DashMap<RelationKey, Arc<ObserveRelation>>,
    endpoints: DashMap<SocketAddr, Arc<ObservingEndpoint>>,
    policy: ArcSwap<FreshnessPolicy>,
}

impl RelationTable {
    pub fn new() -> Arc<Self> {
        Self::with_policy(FreshnessPolicy::default())
    }

    pub fn with_policy(policy: FreshnessPolicy) -> Arc<Self> {
        Arc::new(Self {
            relations: DashMap::new(),
            endpoints: DashMap::new(),
            policy: ArcSwap::from_pointee(policy),
        })
    }

    /// Freshness policy handed to relations created from now on.
    pub fn policy(&self) -> FreshnessPolicy {
        **self.policy.load()
    }

    pub fn set_policy(&self, policy: FreshnessPolicy) {
        self.policy.store(Arc::new(policy));
    }

    /// Find or create the endpoint entry for `addr`.
    pub fn endpoint(self: &Arc<Self>, addr: SocketAddr) -> Arc<ObservingEndpoint> {
        self.endpoints
            .entry(addr)
            .or_insert_with(|| Arc::new(ObservingEndpoint::with_table(addr, Arc::downgrade(self))))
            .clone()
    }

    pub fn find_endpoint(&self, addr: &SocketAddr) -> Option<Arc<ObservingEndpoint>> {
        self.endpoints.get(addr).map(|e| e.value().clone())
    }

    /// Establish a relation for an observe request on `resource`.
    ///
    /// The observing endpoint is the exchange's source address.
    pub fn observe(
        self: &Arc<Self>,
        resource: Arc<dyn ObservableResource>,
        exchange: Arc<Exchange>,
    ) -> ObserveResult<Arc<ObserveRelation>> {
        if !exchange.request().is_registration() {
            return Err(ObserveError::NotARegistration(exchange.request().path.clone()));
        }
        let endpoint = self.endpoint(exchange.source());
        ObserveRelation::builder()
            .endpoint(endpoint)
            .resource(resource)
            .exchange(exchange)
            .policy(self.policy())
            .build()
    }

    pub fn get(&self, key: &RelationKey) -> Option<Arc<ObserveRelation>> {
        self.relations.get(key).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Snapshot of established relations.
    pub fn established(&self) -> Vec<Arc<ObserveRelation>> {
        self.relations
            .iter()
            .map(|r| r.value().clone())
            .filter(|r| r.is_established())
            .collect()
    }

    /// Cancel every relation of the endpoint at `addr`. Returns how many there were.
    pub fn cancel_endpoint(&self, addr: &SocketAddr) -> usize {
        self.find_endpoint(addr).map_or(0, |endpoint| Self::cancel_relations_of(&endpoint))
    }

    /// Cancel every relation of every endpoint. Returns how many there were.
    pub fn cancel_all(&self) -> usize {
        let endpoints: Vec<Arc<ObservingEndpoint>> =
            self.endpoints.iter().map(|e| e.value().clone()).collect();
        endpoints.iter().map(|e| Self::cancel_relations_of(e)).sum()
    }

    fn cancel_relations_of(endpoint: &ObservingEndpoint) -> usize {
        let count = endpoint.relation_count();
        endpoint.cancel_all();
        count
    }

    /// Drop endpoint entries that hold no relations and are not referenced
    /// elsewhere. Returns the number removed.
    pub fn prune_endpoints(&self) -> usize {
        let before = self.endpoints.len();
        self.endpoints
            .retain(|_, endpoint| Arc::strong_count(endpoint) > 1 || endpoint.relation_count() > 0);
        before.saturating_sub(self.endpoints.len())
    }

    pub(crate) fn insert(&self, relation: Arc<ObserveRelation>) -> Option<Arc<ObserveRelation>> {
        let previous = self.relations.insert(relation.key().clone(), relation);
        metrics::record_active_relations(self.relations.len());
        previous
    }

    /// Remove `relation` if it is the one stored under its key.
    pub(crate) fn remove(&self, relation: &ObserveRelation) -> bool {
        let removed = self
            .relations
            .remove_if(relation.key(), |_, stored| ptr::eq(Arc::as_ptr(stored), relation))
            .is_some();
        if removed {
            metrics::record_active_relations(self.relations.len());
        }
        removed
    }
}
