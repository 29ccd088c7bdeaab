//! Observe relation: one client endpoint observing one resource.
//!
//! # Responsibilities
//! - Own the exchange that established the relation and replay it on change
//! - Track the current and the queued notification (two slots)
//! - Decide when a notification must be confirmable (freshness check)
//! - Unlink from endpoint and resource exactly once on cancellation
//!
//! # States
//! ```text
//! Pending ──mark_established()──▶ Established
//!    │                                 │
//!    └──────────cancel()───────────────┴──▶ Cancelled (terminal)
//! ```
//!
//! # Design Decisions
//! - All mutable fields live in one `Mutex<RelationState>`
//! - The lock is never held while calling into the resource or the endpoint
//! - A cancelled relation is never re-linked; a dispatch already running when
//!   the relation is cancelled still yields a response for the transport, but
//!   nothing is recorded

use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use uuid::Uuid;

use crate::message::{Exchange, MessageType, Response};
use crate::observability::metrics;
use crate::observe::endpoint::ObservingEndpoint;
use crate::observe::error::{ObserveError, ObserveResult};
use crate::observe::freshness::{Freshness, FreshnessCheck, FreshnessPolicy};
use crate::observe::orderer::{NotificationOrderer, ObserveSequence};
use crate::observe::resource::ObservableResource;

/// Identity of a relation: who observes what.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationKey {
    pub endpoint: SocketAddr,
    pub path: String,
}

impl RelationKey {
    pub fn new(endpoint: SocketAddr, path: impl Into<String>) -> Self {
        Self {
            endpoint,
            path: path.into(),
        }
    }
}

impl fmt::Display for RelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.endpoint, self.path)
    }
}

/// Lifecycle phase of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationPhase {
    /// Linked, first notification not yet confirmed.
    Pending,
    Established,
    /// Terminal.
    Cancelled,
}

/// What the transport should do with a recorded notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// Send this response now.
    Send(Arc<Response>),
    /// A confirmable notification is in flight; the response was queued and
    /// will be returned by [`ObserveRelation::on_acknowledged`].
    Deferred,
}

#[derive(Debug)]
struct RelationState {
    phase: RelationPhase,
    current: Option<Arc<Response>>,
    next: Option<Arc<Response>>,
    /// `current` is confirmable and not yet acknowledged.
    awaiting_ack: bool,
    /// The sweeper found the relation stale; force the next notification CON.
    control_due: bool,
    freshness: FreshnessCheck,
}

/// A relation between a client endpoint and a resource on this server.
pub struct ObserveRelation {
    key: RelationKey,
    endpoint: Arc<ObservingEndpoint>,
    resource: Arc<dyn ObservableResource>,
    exchange: Arc<Exchange>,
    orderer: Arc<dyn NotificationOrderer>,
    policy: FreshnessPolicy,
    state: Mutex<RelationState>,
}

impl ObserveRelation {
    pub fn builder() -> RelationBuilder {
        RelationBuilder::default()
    }

    pub fn key(&self) -> &RelationKey {
        &self.key
    }

    pub fn endpoint(&self) -> &Arc<ObservingEndpoint> {
        &self.endpoint
    }

    pub fn resource(&self) -> &Arc<dyn ObservableResource> {
        &self.resource
    }

    pub fn exchange(&self) -> &Arc<Exchange> {
        &self.exchange
    }

    /// Network identity of the observing client.
    pub fn source(&self) -> SocketAddr {
        self.endpoint.identity()
    }

    pub fn policy(&self) -> FreshnessPolicy {
        self.policy
    }

    pub fn phase(&self) -> RelationPhase {
        self.lock_state().phase
    }

    pub fn is_established(&self) -> bool {
        self.phase() == RelationPhase::Established
    }

    pub fn is_cancelled(&self) -> bool {
        self.phase() == RelationPhase::Cancelled
    }

    /// Confirm that the first notification reached the client.
    ///
    /// Returns false if the relation was cancelled in the meantime; a
    /// cancelled relation stays cancelled.
    pub fn mark_established(&self) -> bool {
        let mut state = self.lock_state();
        match state.phase {
            RelationPhase::Established => true,
            RelationPhase::Cancelled => false,
            RelationPhase::Pending => {
                state.phase = RelationPhase::Established;
                drop(state);
                metrics::record_relation_established();
                true
            }
        }
    }

    /// The most recently sent notification.
    pub fn current_notification(&self) -> Option<Arc<Response>> {
        self.lock_state().current.clone()
    }

    /// The notification queued behind an unacknowledged confirmable one.
    pub fn next_notification(&self) -> Option<Arc<Response>> {
        self.lock_state().next.clone()
    }

    /// Cancel this relation and unlink it from its resource and endpoint.
    ///
    /// Idempotent: only the first caller unlinks.
    pub fn cancel(&self) {
        {
            let mut state = self.lock_state();
            if state.phase == RelationPhase::Cancelled {
                return;
            }
            state.phase = RelationPhase::Cancelled;
            state.next = None;
            state.awaiting_ack = false;
            state.control_due = false;
        }

        tracing::debug!(
            endpoint = %self.key.endpoint,
            path = %self.key.path,
            "Cancel observe relation"
        );
        self.resource.remove_relation(self);
        self.endpoint.remove_relation(self);
        metrics::record_relation_cancelled();
    }

    /// Cancel every relation this server holds with this relation's endpoint.
    pub fn cancel_all(&self) {
        self.endpoint.cancel_all();
    }

    /// Make the resource process the original request again.
    ///
    /// Returns as soon as the dispatch has been handed off; the response comes
    /// back through [`ObserveRelation::record_notification`].
    pub fn notify_observers(&self) {
        if self.is_cancelled() {
            tracing::trace!(relation = %self.key, "Skipping notification for cancelled relation");
            return;
        }
        self.resource.dispatch(self.exchange.clone());
    }

    /// Record a response produced by a dispatch of this relation's exchange.
    pub fn record_notification(&self, response: Response) -> NotificationOutcome {
        self.record_notification_at(response, Instant::now())
    }

    pub fn record_notification_at(&self, mut response: Response, now: Instant) -> NotificationOutcome {
        if !response.code.is_success() {
            // Error responses end the observation and carry no observe number.
            response.observe = None;
            tracing::debug!(relation = %self.key, code = ?response.code, "Error notification ends relation");
            self.cancel();
            metrics::record_notification("error");
            return NotificationOutcome::Send(Arc::new(response));
        }

        let mut state = self.lock_state();
        if state.phase == RelationPhase::Cancelled {
            drop(state);
            tracing::debug!(relation = %self.key, "Notification completed after cancellation");
            return NotificationOutcome::Send(Arc::new(self.orderer.stamp(&self.key, response)));
        }

        let stale = state.phase == RelationPhase::Established
            && state.freshness.check(&self.policy, now);
        let control_due = std::mem::take(&mut state.control_due);
        if control_due && !stale {
            // A control notification restarts both budgets.
            state.freshness.reset(now);
        }
        // A queued confirmable notification stays confirmable when superseded.
        let supersedes_con = state.awaiting_ack
            && state.next.as_ref().is_some_and(|queued| queued.is_confirmable());
        let confirmable = response.is_confirmable() || control_due || stale || supersedes_con;
        response.message_type = if confirmable { MessageType::Con } else { MessageType::Non };

        let response = Arc::new(self.orderer.stamp(&self.key, response));

        if state.awaiting_ack {
            if state.next.replace(response).is_some() {
                tracing::trace!(relation = %self.key, "Queued notification superseded");
            }
            metrics::record_notification("deferred");
            return NotificationOutcome::Deferred;
        }

        state.awaiting_ack = confirmable;
        state.current = Some(response.clone());
        metrics::record_notification(if confirmable { "con" } else { "non" });
        NotificationOutcome::Send(response)
    }

    /// The client acknowledged notification `id`.
    ///
    /// Returns the queued notification, promoted to current, if one is waiting.
    /// Acknowledgments for anything but the current notification are ignored.
    pub fn on_acknowledged(&self, id: Uuid) -> Option<Arc<Response>> {
        let mut state = self.lock_state();
        if !Self::is_current(&state, id) {
            return None;
        }
        state.awaiting_ack = false;

        let next = state.next.take()?;
        state.awaiting_ack = next.is_confirmable();
        state.current = Some(next.clone());
        Some(next)
    }

    /// The client answered notification `id` with a reset.
    ///
    /// Returns true if the relation was cancelled.
    pub fn on_rejected(&self, id: Uuid) -> bool {
        let matches = {
            let state = self.lock_state();
            Self::is_current(&state, id) || state.next.as_ref().is_some_and(|n| n.id == id)
        };
        if matches {
            tracing::warn!(relation = %self.key, "Notification rejected by client");
            self.cancel();
        }
        matches
    }

    /// Transport gave up retransmitting notification `id`.
    ///
    /// Returns true if the relation was cancelled.
    pub fn on_timeout(&self, id: Uuid) -> bool {
        let matches = Self::is_current(&self.lock_state(), id);
        if matches {
            tracing::warn!(relation = %self.key, "Notification timed out");
            self.cancel();
        }
        matches
    }

    /// Run the freshness check.
    ///
    /// Returns true if the next notification must be confirmable.
    pub fn check(&self) -> bool {
        self.check_at(Instant::now())
    }

    pub fn check_at(&self, now: Instant) -> bool {
        self.lock_state().freshness.check(&self.policy, now)
    }

    /// Freshness without advancing the counter.
    pub fn freshness_at(&self, now: Instant) -> Freshness {
        self.lock_state().freshness.freshness(&self.policy, now)
    }

    /// Force the next recorded notification to be confirmable.
    ///
    /// Returns true if this call armed it; false if it was already armed or
    /// the relation is cancelled.
    pub fn request_control_notification(&self) -> bool {
        let mut state = self.lock_state();
        if state.phase == RelationPhase::Cancelled || state.control_due {
            return false;
        }
        state.control_due = true;
        true
    }

    pub fn check_counter(&self) -> u32 {
        self.lock_state().freshness.counter()
    }

    pub fn last_check_time(&self) -> Instant {
        self.lock_state().freshness.last_check()
    }

    fn is_current(state: &RelationState, id: Uuid) -> bool {
        state.current.as_ref().is_some_and(|c| c.id == id)
    }

    fn lock_state(&self) -> MutexGuard<'_, RelationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn link(self: &Arc<Self>) {
        if let Some(previous) = self.endpoint.link_relation(self) {
            tracing::debug!(relation = %self.key, "Replacing existing observe relation");
            previous.cancel();
        }

        // Cancelled through the exchange while linking: undo our own links only.
        if self.is_cancelled() {
            self.resource.remove_relation(self);
            self.endpoint.remove_relation(self);
        }
    }
}

impl fmt::Debug for ObserveRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserveRelation")
            .field("key", &self.key)
            .field("exchange", &self.exchange.id())
            .field("phase", &self.phase())
            .finish()
    }
}

/// Builder for [`ObserveRelation`].
///
/// Endpoint, resource and exchange are required. Nothing is linked until all
/// arguments have been validated.
#[derive(Default)]
pub struct RelationBuilder {
    endpoint: Option<Arc<ObservingEndpoint>>,
    resource: Option<Arc<dyn ObservableResource>>,
    exchange: Option<Arc<Exchange>>,
    orderer: Option<Arc<dyn NotificationOrderer>>,
    policy: FreshnessPolicy,
}

impl RelationBuilder {
    pub fn endpoint(mut self, endpoint: Arc<ObservingEndpoint>) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn resource(mut self, resource: Arc<dyn ObservableResource>) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn exchange(mut self, exchange: Arc<Exchange>) -> Self {
        self.exchange = Some(exchange);
        self
    }

    /// Defaults to a fresh [`ObserveSequence`].
    pub fn orderer(mut self, orderer: Arc<dyn NotificationOrderer>) -> Self {
        self.orderer = Some(orderer);
        self
    }

    pub fn policy(mut self, policy: FreshnessPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Validate, construct and link the relation.
    pub fn build(self) -> ObserveResult<Arc<ObserveRelation>> {
        let endpoint = self.endpoint.ok_or(ObserveError::MissingArgument("endpoint"))?;
        let resource = self.resource.ok_or(ObserveError::MissingArgument("resource"))?;
        let exchange = self.exchange.ok_or(ObserveError::MissingArgument("exchange"))?;
        if exchange.is_bound() {
            return Err(ObserveError::ExchangeInUse(exchange.id()));
        }

        let orderer = self
            .orderer
            .unwrap_or_else(|| Arc::new(ObserveSequence::new()));
        let key = RelationKey::new(endpoint.identity(), resource.path());

        let relation = Arc::new(ObserveRelation {
            key,
            endpoint,
            resource,
            exchange,
            orderer,
            policy: self.policy,
            state: Mutex::new(RelationState {
                phase: RelationPhase::Pending,
                current: None,
                next: None,
                awaiting_ack: false,
                control_due: false,
                freshness: FreshnessCheck::new(Instant::now()),
            }),
        });

        // Lost a race with another builder for the same exchange.
        if !relation.exchange.bind(&relation) {
            return Err(ObserveError::ExchangeInUse(relation.exchange.id()));
        }

        relation.link();
        Ok(relation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Request, ResponseCode};
    use crate::observe::resource::ObserverSet;
    use std::time::Duration;

    #[derive(Default)]
    struct CountingResource {
        observers: ObserverSet,
        dispatched: Mutex<Vec<Arc<Exchange>>>,
    }

    impl CountingResource {
        fn dispatch_count(&self) -> usize {
            self.dispatched.lock().unwrap().len()
        }
    }

    impl ObservableResource for CountingResource {
        fn path(&self) -> &str {
            "/temp"
        }

        fn observers(&self) -> &ObserverSet {
            &self.observers
        }

        fn dispatch(&self, exchange: Arc<Exchange>) {
            self.dispatched.lock().unwrap().push(exchange);
        }
    }

    fn addr() -> SocketAddr {
        "10.0.0.1:5683".parse().unwrap()
    }

    fn new_exchange() -> Arc<Exchange> {
        Arc::new(Exchange::new(addr(), Request::observe("/temp", vec![0x01])))
    }

    struct Fixture {
        endpoint: Arc<ObservingEndpoint>,
        resource: Arc<CountingResource>,
        exchange: Arc<Exchange>,
        relation: Arc<ObserveRelation>,
    }

    fn fixture() -> Fixture {
        let endpoint = Arc::new(ObservingEndpoint::new(addr()));
        let resource = Arc::new(CountingResource::default());
        let exchange = new_exchange();
        let relation = ObserveRelation::builder()
            .endpoint(endpoint.clone())
            .resource(resource.clone())
            .exchange(exchange.clone())
            .build()
            .unwrap();
        Fixture { endpoint, resource, exchange, relation }
    }

    fn sent(outcome: NotificationOutcome) -> Arc<Response> {
        match outcome {
            NotificationOutcome::Send(response) => response,
            NotificationOutcome::Deferred => panic!("expected Send, got Deferred"),
        }
    }

    #[test]
    fn test_build_requires_every_argument() {
        let endpoint = Arc::new(ObservingEndpoint::new(addr()));
        let resource = Arc::new(CountingResource::default());
        let exchange = new_exchange();

        let err = ObserveRelation::builder()
            .resource(resource.clone())
            .exchange(exchange.clone())
            .build()
            .unwrap_err();
        assert_eq!(err, ObserveError::MissingArgument("endpoint"));

        let err = ObserveRelation::builder()
            .endpoint(endpoint.clone())
            .exchange(exchange.clone())
            .build()
            .unwrap_err();
        assert_eq!(err, ObserveError::MissingArgument("resource"));

        let err = ObserveRelation::builder()
            .endpoint(endpoint.clone())
            .resource(resource.clone())
            .build()
            .unwrap_err();
        assert_eq!(err, ObserveError::MissingArgument("exchange"));

        // nothing linked or bound by the failed attempts
        assert_eq!(endpoint.relation_count(), 0);
        assert_eq!(resource.observer_count(), 0);
        assert!(!exchange.is_bound());
    }

    #[test]
    fn test_build_returns_supplied_instances() {
        let f = fixture();
        let relation = &f.relation;

        assert!(Arc::ptr_eq(relation.endpoint(), &f.endpoint));
        assert!(Arc::ptr_eq(relation.exchange(), &f.exchange));
        assert_eq!(
            Arc::as_ptr(relation.resource()) as *const (),
            Arc::as_ptr(&f.resource) as *const ()
        );
        assert_eq!(relation.source(), addr());
        assert_eq!(relation.key(), &RelationKey::new(addr(), "/temp"));

        assert_eq!(relation.phase(), RelationPhase::Pending);
        assert_eq!(relation.check_counter(), 1);
        assert!(relation.current_notification().is_none());
        assert!(relation.next_notification().is_none());

        // linked on both sides, and reachable from the exchange
        assert!(f.resource.observers().contains(relation));
        assert!(Arc::ptr_eq(&f.endpoint.relation("/temp").unwrap(), relation));
        assert!(Arc::ptr_eq(&f.exchange.relation().unwrap(), relation));
    }

    #[test]
    fn test_exchange_cannot_back_two_relations() {
        let f = fixture();
        let err = ObserveRelation::builder()
            .endpoint(f.endpoint.clone())
            .resource(f.resource.clone())
            .exchange(f.exchange.clone())
            .build()
            .unwrap_err();
        assert_eq!(err, ObserveError::ExchangeInUse(f.exchange.id()));
        assert!(!f.relation.is_cancelled());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let f = fixture();
        assert!(f.relation.mark_established());

        f.relation.cancel();
        assert!(!f.relation.is_established());
        assert!(f.relation.is_cancelled());
        assert_eq!(f.resource.observer_count(), 0);
        assert_eq!(f.endpoint.relation_count(), 0);

        f.relation.cancel();
        assert!(!f.relation.is_established());
        assert_eq!(f.resource.observer_count(), 0);
        assert_eq!(f.endpoint.relation_count(), 0);
    }

    #[test]
    fn test_cancelled_relation_cannot_be_established() {
        let f = fixture();
        f.relation.cancel();
        assert!(!f.relation.mark_established());
        assert_eq!(f.relation.phase(), RelationPhase::Cancelled);
    }

    #[test]
    fn test_notify_dispatches_stored_exchange_once() {
        let f = fixture();

        f.relation.notify_observers();
        assert_eq!(f.resource.dispatch_count(), 1);
        f.relation.notify_observers();
        assert_eq!(f.resource.dispatch_count(), 2);

        let dispatched = f.resource.dispatched.lock().unwrap();
        assert!(dispatched.iter().all(|e| Arc::ptr_eq(e, &f.exchange)));
    }

    #[test]
    fn test_notify_after_cancel_does_not_dispatch() {
        let f = fixture();
        f.relation.cancel();
        f.relation.notify_observers();
        assert_eq!(f.resource.dispatch_count(), 0);
    }

    #[test]
    fn test_first_notification_is_sent_as_is() {
        let f = fixture();
        let response = sent(f.relation.record_notification(Response::content("21.5")));

        assert_eq!(response.message_type, MessageType::Non);
        assert_eq!(response.observe, Some(1));
        assert_eq!(f.relation.current_notification(), Some(response));
        assert!(f.relation.next_notification().is_none());
    }

    #[test]
    fn test_confirmable_in_flight_defers_next() {
        let f = fixture();
        f.relation.mark_established();

        let con = sent(f.relation.record_notification(
            Response::content("1").with_type(MessageType::Con),
        ));
        assert!(con.is_confirmable());

        assert_eq!(f.relation.record_notification(Response::content("2")), NotificationOutcome::Deferred);
        assert_eq!(f.relation.record_notification(Response::content("3")), NotificationOutcome::Deferred);

        // only the newest queued notification survives
        let queued = f.relation.next_notification().unwrap();
        assert_eq!(queued.payload, b"3".to_vec());
        assert_eq!(f.relation.current_notification().unwrap().id, con.id);

        let promoted = f.relation.on_acknowledged(con.id).unwrap();
        assert_eq!(promoted.id, queued.id);
        assert_eq!(f.relation.current_notification().unwrap().id, queued.id);
        assert!(f.relation.next_notification().is_none());

        // nothing in flight any more
        let after = sent(f.relation.record_notification(Response::content("4")));
        assert_eq!(after.payload, b"4".to_vec());
    }

    #[test]
    fn test_superseded_control_notification_stays_confirmable() {
        let f = fixture();
        f.relation.mark_established();

        let con = sent(f.relation.record_notification(
            Response::content("1").with_type(MessageType::Con),
        ));
        assert!(f.relation.request_control_notification());

        assert_eq!(f.relation.record_notification(Response::content("2")), NotificationOutcome::Deferred);
        assert!(f.relation.next_notification().unwrap().is_confirmable());

        assert_eq!(f.relation.record_notification(Response::content("3")), NotificationOutcome::Deferred);
        let queued = f.relation.next_notification().unwrap();
        assert_eq!(queued.payload, b"3".to_vec());
        assert_eq!(queued.message_type, MessageType::Con);

        let promoted = f.relation.on_acknowledged(con.id).unwrap();
        assert_eq!(promoted.message_type, MessageType::Con);

        // the promoted notification is in flight, so the next one is queued
        assert_eq!(f.relation.record_notification(Response::content("4")), NotificationOutcome::Deferred);
        assert!(f.relation.on_acknowledged(promoted.id).is_some());
    }

    #[test]
    fn test_queued_non_notification_is_not_upgraded() {
        let f = fixture();
        f.relation.mark_established();

        let con = sent(f.relation.record_notification(
            Response::content("1").with_type(MessageType::Con),
        ));
        f.relation.record_notification(Response::content("2"));
        f.relation.record_notification(Response::content("3"));

        let promoted = f.relation.on_acknowledged(con.id).unwrap();
        assert_eq!(promoted.message_type, MessageType::Non);
    }

    #[test]
    fn test_stale_acknowledgment_is_ignored() {
        let f = fixture();
        let con = sent(f.relation.record_notification(
            Response::content("1").with_type(MessageType::Con),
        ));
        f.relation.record_notification(Response::content("2"));

        assert!(f.relation.on_acknowledged(Uuid::new_v4()).is_none());
        assert!(f.relation.next_notification().is_some());
        assert_eq!(f.relation.current_notification().unwrap().id, con.id);
    }

    #[test]
    fn test_reset_cancels_relation() {
        let f = fixture();
        let response = sent(f.relation.record_notification(Response::content("1")));

        assert!(!f.relation.on_rejected(Uuid::new_v4()));
        assert!(!f.relation.is_cancelled());

        assert!(f.relation.on_rejected(response.id));
        assert!(f.relation.is_cancelled());
        assert_eq!(f.resource.observer_count(), 0);
    }

    #[test]
    fn test_timeout_cancels_relation() {
        let f = fixture();
        let con = sent(f.relation.record_notification(
            Response::content("1").with_type(MessageType::Con),
        ));
        assert!(f.relation.on_timeout(con.id));
        assert!(f.relation.is_cancelled());
        assert_eq!(f.endpoint.relation_count(), 0);
    }

    #[test]
    fn test_error_response_ends_relation() {
        let f = fixture();
        f.relation.mark_established();

        let response = sent(f.relation.record_notification(
            Response::new(ResponseCode::NotFound, Vec::<u8>::new()),
        ));
        assert_eq!(response.observe, None);
        assert!(f.relation.is_cancelled());
        assert_eq!(f.resource.observer_count(), 0);
    }

    #[test]
    fn test_notification_after_cancel_is_not_recorded() {
        let f = fixture();
        f.relation.mark_established();
        f.relation.cancel();

        let response = sent(f.relation.record_notification(Response::content("late")));
        assert_eq!(response.payload, b"late".to_vec());
        assert!(f.relation.current_notification().is_none());
        assert!(f.relation.is_cancelled());
        assert!(!f.resource.observers().contains(&f.relation));
        assert!(f.endpoint.relation("/temp").is_none());
    }

    #[test]
    fn test_check_triggers_on_hundredth_call_after_reset() {
        let f = fixture();
        let start = f.relation.last_check_time();

        // reset by the time budget
        let t0 = start + DEFAULT_INTERVAL;
        assert!(f.relation.check_at(t0));
        assert_eq!(f.relation.check_counter(), 0);

        for call in 1..100 {
            assert!(!f.relation.check_at(t0), "call {} should be fresh", call);
            assert_eq!(f.relation.check_counter(), call);
        }

        let t100 = t0 + Duration::from_secs(1);
        assert!(f.relation.check_at(t100));
        assert_eq!(f.relation.check_counter(), 0);
        assert_eq!(f.relation.last_check_time(), t100);
    }

    #[test]
    fn test_check_after_idle_interval_resets() {
        let f = fixture();
        let start = f.relation.last_check_time();
        f.relation.check_at(start);
        f.relation.check_at(start);
        assert_eq!(f.relation.check_counter(), 3);

        let later = start + DEFAULT_INTERVAL + Duration::from_secs(1);
        assert_eq!(f.relation.freshness_at(later), Freshness::Stale);
        assert!(f.relation.check_at(later));
        assert_eq!(f.relation.check_counter(), 0);
        assert_eq!(f.relation.last_check_time(), later);
    }

    #[test]
    fn test_stale_relation_sends_confirmable() {
        let f = fixture();
        f.relation.mark_established();
        let start = f.relation.last_check_time();

        let fresh = sent(f.relation.record_notification_at(Response::content("a"), start));
        assert_eq!(fresh.message_type, MessageType::Non);

        let stale = sent(f.relation.record_notification_at(
            Response::content("b"),
            start + DEFAULT_INTERVAL,
        ));
        assert_eq!(stale.message_type, MessageType::Con);
        assert_eq!(f.relation.check_counter(), 0);
    }

    #[test]
    fn test_control_request_forces_confirmable_once() {
        let f = fixture();
        f.relation.mark_established();
        assert!(f.relation.request_control_notification());
        assert!(!f.relation.request_control_notification());

        let con = sent(f.relation.record_notification(Response::content("a")));
        assert!(con.is_confirmable());
        assert_eq!(f.relation.check_counter(), 0);
        f.relation.on_acknowledged(con.id);

        let non = sent(f.relation.record_notification(Response::content("b")));
        assert!(!non.is_confirmable());
    }

    #[test]
    fn test_reregistration_replaces_previous_relation() {
        let f = fixture();
        f.relation.mark_established();

        let replacement = ObserveRelation::builder()
            .endpoint(f.endpoint.clone())
            .resource(f.resource.clone())
            .exchange(new_exchange())
            .build()
            .unwrap();

        assert!(f.relation.is_cancelled());
        assert!(!replacement.is_cancelled());
        assert!(f.resource.observers().contains(&replacement));
        assert!(Arc::ptr_eq(&f.endpoint.relation("/temp").unwrap(), &replacement));
        assert_eq!(f.resource.observer_count(), 1);
    }

    #[test]
    fn test_cancel_all_through_relation() {
        let f = fixture();
        f.relation.cancel_all();
        assert!(f.relation.is_cancelled());
        assert_eq!(f.endpoint.relation_count(), 0);
    }

    const DEFAULT_INTERVAL: Duration = crate::observe::freshness::DEFAULT_CHECK_INTERVAL;
}
