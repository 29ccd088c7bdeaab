//! Shared fixtures for observe integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use coap_observe::message::{Exchange, Request, Response};
use coap_observe::observe::{NotificationOutcome, ObservableResource, ObserverSet};
use tokio::sync::mpsc;

/// A resource whose dispatch runs on the tokio runtime and pushes whatever the
/// relation decides to send into a channel standing in for the transport.
pub struct SensorResource {
    path: String,
    observers: ObserverSet,
    value: AtomicU64,
    dispatches: AtomicUsize,
    transport: mpsc::UnboundedSender<Arc<Response>>,
}

impl SensorResource {
    pub fn new(path: &str) -> (Arc<Self>, mpsc::UnboundedReceiver<Arc<Response>>) {
        let (transport, rx) = mpsc::unbounded_channel();
        let resource = Arc::new(Self {
            path: path.to_string(),
            observers: ObserverSet::new(),
            value: AtomicU64::new(0),
            dispatches: AtomicUsize::new(0),
            transport,
        });
        (resource, rx)
    }

    /// Update the value and notify observers.
    pub fn set(&self, value: u64) {
        self.value.store(value, Ordering::SeqCst);
        self.changed();
    }

    pub fn dispatches(&self) -> usize {
        self.dispatches.load(Ordering::SeqCst)
    }
}

impl ObservableResource for SensorResource {
    fn path(&self) -> &str {
        &self.path
    }

    fn observers(&self) -> &ObserverSet {
        &self.observers
    }

    fn dispatch(&self, exchange: Arc<Exchange>) {
        self.dispatches.fetch_add(1, Ordering::SeqCst);
        let payload = self.value.load(Ordering::SeqCst).to_string();
        let transport = self.transport.clone();

        tokio::spawn(async move {
            tokio::task::yield_now().await;
            let Some(relation) = exchange.relation() else {
                return;
            };
            if let NotificationOutcome::Send(response) = relation.record_notification(Response::content(payload)) {
                let _ = transport.send(response);
            }
        });
    }
}

pub fn client(port: u16) -> SocketAddr {
    SocketAddr::from(([192, 168, 1, 10], port))
}

pub fn observe_exchange(source: SocketAddr, path: &str) -> Arc<Exchange> {
    Arc::new(Exchange::new(source, Request::observe(path, vec![0xAB, 0xCD])))
}
