//! Per-request protocol context.
//!
//! An exchange is created by the exchange layer when a request arrives and is
//! handed to the resource for dispatch. When the request registers an observe
//! relation, the relation keeps the exchange and replays it unchanged for every
//! notification. The exchange in turn holds a weak link back to that relation
//! so the completion of a dispatch can be routed to it.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock, Weak};

use uuid::Uuid;

use super::request::Request;
use crate::observe::relation::ObserveRelation;

#[derive(Debug)]
pub struct Exchange {
    id: Uuid,
    source: SocketAddr,
    request: Request,
    relation: OnceLock<Weak<ObserveRelation>>,
}

impl Exchange {
    pub fn new(source: SocketAddr, request: Request) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            request,
            relation: OnceLock::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Address of the client that sent the request.
    pub fn source(&self) -> SocketAddr {
        self.source
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The observe relation established by this exchange, if it is still alive.
    pub fn relation(&self) -> Option<Arc<ObserveRelation>> {
        self.relation.get().and_then(Weak::upgrade)
    }

    /// True once a relation has been bound, even if it has since been dropped.
    pub fn is_bound(&self) -> bool {
        self.relation.get().is_some()
    }

    /// Bind the relation. Returns false if the exchange was already bound.
    pub(crate) fn bind(&self, relation: &Arc<ObserveRelation>) -> bool {
        self.relation.set(Arc::downgrade(relation)).is_ok()
    }
}
