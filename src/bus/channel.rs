//! Publish/subscribe hub shared by every orchestration component.
//!
//! Two channels share one subscription table:
//! - typed events, keyed by the payload's `TypeId`,
//! - string-keyed signals carrying a `serde_json::Value`.
//!
//! Publishing copies the handler list under the lock and invokes the copy
//! with the lock released, so handlers may publish, subscribe or
//! unsubscribe (themselves included) without deadlocking. A handler that
//! returns `Err` or panics is logged and skipped; the rest still run.
use std::{
    any::{type_name, Any, TypeId},
    collections::HashMap,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use bevy::prelude::*;
use serde_json::Value;

use crate::core::errors::OrchestrationError;

use super::history::{PublishHistory, PublishRecord, DEFAULT_HISTORY_CAPACITY};

/// Return type of every bus handler.
pub type HandlerResult = anyhow::Result<()>;

/// Anything that can travel over the typed channel.
pub trait BusEvent: Any + Send + Sync + fmt::Debug {}

impl<T: Any + Send + Sync + fmt::Debug> BusEvent for T {}

/// Short, human-readable event name (`InteractionStarted` rather than the
/// full module path).
pub fn event_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Opaque token returned by `subscribe`; pass it back to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(u64);

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ChannelKey {
    Typed(TypeId),
    Signal(String),
}

type TypedHandler = Arc<dyn Fn(&dyn Any) -> HandlerResult + Send + Sync>;
type SignalHandler = Arc<dyn Fn(&Value) -> HandlerResult + Send + Sync>;

#[derive(Clone)]
enum Handler {
    Typed(TypedHandler),
    Signal(SignalHandler),
}

struct Subscriber {
    handle: SubscriptionHandle,
    handler: Handler,
}

struct BusState {
    table: HashMap<ChannelKey, Vec<Subscriber>>,
    owners: HashMap<SubscriptionHandle, ChannelKey>,
    next_handle: u64,
    history: PublishHistory,
    failures: u64,
}

impl BusState {
    fn new(history_capacity: usize) -> Self {
        Self {
            table: HashMap::new(),
            owners: HashMap::new(),
            next_handle: 1,
            history: PublishHistory::new(history_capacity),
            failures: 0,
        }
    }
}

/// Outcome of a single publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Process-wide event hub. Cloning yields another handle to the same hub.
#[derive(Resource, Clone)]
pub struct EventBus {
    state: Arc<Mutex<BusState>>,
}

impl EventBus {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(BusState::new(history_capacity))),
        }
    }

    /// Subscribes to a typed event. Handlers run in subscription order.
    pub fn subscribe<T, F>(&self, handler: F) -> SubscriptionHandle
    where
        T: BusEvent,
        F: Fn(&T) -> HandlerResult + Send + Sync + 'static,
    {
        let erased: TypedHandler = Arc::new(move |payload: &dyn Any| {
            match payload.downcast_ref::<T>() {
                Some(event) => handler(event),
                None => Ok(()),
            }
        });
        self.insert(ChannelKey::Typed(TypeId::of::<T>()), Handler::Typed(erased))
    }

    /// Subscribes to an ad hoc string-keyed signal.
    pub fn subscribe_signal<F>(&self, key: impl Into<String>, handler: F) -> SubscriptionHandle
    where
        F: Fn(&Value) -> HandlerResult + Send + Sync + 'static,
    {
        self.insert(ChannelKey::Signal(key.into()), Handler::Signal(Arc::new(handler)))
    }

    /// Removes a subscription. Returns `false` for unknown or stale handles.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut state = self.lock();
        let Some(key) = state.owners.remove(&handle) else {
            debug!(target: "bus", "unsubscribe of unknown handle {handle}");
            return false;
        };

        if let Some(subscribers) = state.table.get_mut(&key) {
            subscribers.retain(|subscriber| subscriber.handle != handle);
            if subscribers.is_empty() {
                state.table.remove(&key);
            }
        }
        true
    }

    /// Delivers `event` to every current subscriber of `T`.
    pub fn publish<T: BusEvent>(&self, event: &T) -> PublishReport {
        let name = event_name::<T>();
        let snapshot = self.snapshot(&ChannelKey::Typed(TypeId::of::<T>()), name, || {
            format!("{event:?}")
        });

        deliver(name, snapshot, |handler| match handler {
            Handler::Typed(handler) => handler(event as &dyn Any),
            Handler::Signal(_) => Ok(()),
        })
        .tap_failures(self)
    }

    /// Delivers `payload` to every current subscriber of the signal `key`.
    pub fn publish_signal(&self, key: &str, payload: Value) -> PublishReport {
        let snapshot = self.snapshot(&ChannelKey::Signal(key.to_string()), key, || {
            payload.to_string()
        });

        deliver(key, snapshot, |handler| match handler {
            Handler::Signal(handler) => handler(&payload),
            Handler::Typed(_) => Ok(()),
        })
        .tap_failures(self)
    }

    pub fn subscriber_count<T: BusEvent>(&self) -> usize {
        self.count(&ChannelKey::Typed(TypeId::of::<T>()))
    }

    pub fn signal_subscriber_count(&self, key: &str) -> usize {
        self.count(&ChannelKey::Signal(key.to_string()))
    }

    /// Copy of the retained publish history, oldest first.
    pub fn history(&self) -> Vec<PublishRecord> {
        self.lock().history.records().cloned().collect()
    }

    /// Total handler failures caught since startup.
    pub fn failure_count(&self) -> u64 {
        self.lock().failures
    }

    /// Drops every subscription and the history. Called on shutdown.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.table.clear();
        state.owners.clear();
        state.history.clear();
    }

    fn insert(&self, key: ChannelKey, handler: Handler) -> SubscriptionHandle {
        let mut state = self.lock();
        let handle = SubscriptionHandle(state.next_handle);
        state.next_handle += 1;
        state.owners.insert(handle, key.clone());
        state
            .table
            .entry(key)
            .or_default()
            .push(Subscriber { handle, handler });
        handle
    }

    fn snapshot(
        &self,
        key: &ChannelKey,
        channel: &str,
        summary: impl FnOnce() -> String,
    ) -> Vec<(SubscriptionHandle, Handler)> {
        let mut state = self.lock();
        let snapshot: Vec<_> = state
            .table
            .get(key)
            .map(|subscribers| {
                subscribers
                    .iter()
                    .map(|subscriber| (subscriber.handle, subscriber.handler.clone()))
                    .collect()
            })
            .unwrap_or_default();
        state.history.record(channel, summary(), snapshot.len());
        snapshot
    }

    fn count(&self, key: &ChannelKey) -> usize {
        self.lock().table.get(key).map(Vec::len).unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("EventBus")
            .field("channels", &state.table.len())
            .field("subscriptions", &state.owners.len())
            .field("history", &state.history.len())
            .field("failures", &state.failures)
            .finish()
    }
}

impl PublishReport {
    fn tap_failures(self, bus: &EventBus) -> Self {
        if self.failed > 0 {
            bus.lock().failures += self.failed as u64;
        }
        self
    }
}

fn deliver(
    channel: &str,
    snapshot: Vec<(SubscriptionHandle, Handler)>,
    invoke: impl Fn(&Handler) -> HandlerResult,
) -> PublishReport {
    let mut report = PublishReport::default();
    for (handle, handler) in snapshot {
        match guarded(|| invoke(&handler)) {
            Ok(()) => report.delivered += 1,
            Err(message) => {
                report.failed += 1;
                let error = OrchestrationError::SubscriberFailure {
                    event: channel.to_string(),
                    handle,
                    message,
                };
                warn!(target: "bus", "{error}");
            }
        }
    }
    report
}

fn guarded(call: impl FnOnce() -> HandlerResult) -> Result<(), String> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(format!("{err:#}")),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::anyhow;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Ping(u32);

    #[derive(Debug, Clone)]
    struct Pong;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (log.clone(), log)
    }

    #[test]
    fn delivers_in_subscription_order() {
        let bus = EventBus::default();
        let (log, sink) = recorder();

        for label in ["first", "second", "third"] {
            let sink = sink.clone();
            bus.subscribe::<Ping, _>(move |ping| {
                sink.lock().unwrap().push(format!("{label}:{}", ping.0));
                Ok(())
            });
        }

        let report = bus.publish(&Ping(7));
        assert_eq!(report.delivered, 3);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:7", "second:7", "third:7"]
        );
    }

    #[test]
    fn typed_channels_are_isolated() {
        let bus = EventBus::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        bus.subscribe::<Ping, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.publish(&Pong);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        bus.publish(&Ping(1));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_subscribers_do_not_block_others() {
        let bus = EventBus::default();
        let hits = Arc::new(AtomicUsize::new(0));

        bus.subscribe::<Ping, _>(|_| Err(anyhow!("boom")));
        bus.subscribe::<Ping, _>(|_| panic!("handler exploded"));
        let counter = hits.clone();
        bus.subscribe::<Ping, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let report = bus.publish(&Ping(1));
        assert_eq!(report, PublishReport { delivered: 1, failed: 2 });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.failure_count(), 2);
    }

    #[test]
    fn handler_can_unsubscribe_itself_mid_dispatch() {
        let bus = EventBus::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let handle_slot: Arc<Mutex<Option<SubscriptionHandle>>> = Arc::new(Mutex::new(None));

        let inner_bus = bus.clone();
        let slot = handle_slot.clone();
        let counter = hits.clone();
        let handle = bus.subscribe::<Ping, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(handle) = slot.lock().unwrap().take() {
                inner_bus.unsubscribe(handle);
            }
            Ok(())
        });
        *handle_slot.lock().unwrap() = Some(handle);

        let later = Arc::new(AtomicUsize::new(0));
        let later_counter = later.clone();
        bus.subscribe::<Ping, _>(move |_| {
            later_counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.publish(&Ping(1));
        bus.publish(&Ping(2));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(later.load(Ordering::SeqCst), 2);
        assert_eq!(bus.subscriber_count::<Ping>(), 1);
    }

    #[test]
    fn handler_may_publish_reentrantly() {
        let bus = EventBus::default();
        let pongs = Arc::new(AtomicUsize::new(0));

        let inner_bus = bus.clone();
        bus.subscribe::<Ping, _>(move |_| {
            inner_bus.publish(&Pong);
            Ok(())
        });
        let counter = pongs.clone();
        bus.subscribe::<Pong, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.publish(&Ping(0));
        assert_eq!(pongs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_rejects_stale_handles() {
        let bus = EventBus::default();
        let handle = bus.subscribe::<Ping, _>(|_| Ok(()));

        assert!(bus.unsubscribe(handle));
        assert!(!bus.unsubscribe(handle));
        assert_eq!(bus.subscriber_count::<Ping>(), 0);
    }

    #[test]
    fn handles_are_unique_across_channels() {
        let bus = EventBus::default();
        let a = bus.subscribe::<Ping, _>(|_| Ok(()));
        let b = bus.subscribe::<Pong, _>(|_| Ok(()));
        let c = bus.subscribe_signal("hud.flash", |_| Ok(()));

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn signals_share_isolation_semantics() {
        let bus = EventBus::default();
        let (log, sink) = recorder();

        bus.subscribe_signal("hud.flash", |_| Err(anyhow!("no hud")));
        bus.subscribe_signal("hud.flash", move |payload| {
            sink.lock().unwrap().push(payload["stat"].to_string());
            Ok(())
        });
        bus.subscribe_signal("other", |_| panic!("wrong channel"));

        let report = bus.publish_signal("hud.flash", json!({ "stat": "money" }));
        assert_eq!(report, PublishReport { delivered: 1, failed: 1 });
        assert_eq!(*log.lock().unwrap(), vec!["\"money\""]);
        assert_eq!(bus.signal_subscriber_count("hud.flash"), 2);
    }

    #[test]
    fn history_is_bounded_and_named() {
        let bus = EventBus::new(2);
        bus.publish(&Ping(1));
        bus.publish(&Pong);
        bus.publish_signal("save", Value::Null);

        let history = bus.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].channel, "Pong");
        assert_eq!(history[1].channel, "save");
    }

    #[test]
    fn clear_drops_everything() {
        let bus = EventBus::default();
        bus.subscribe::<Ping, _>(|_| Ok(()));
        bus.publish(&Ping(1));

        bus.clear();
        assert_eq!(bus.subscriber_count::<Ping>(), 0);
        assert!(bus.history().is_empty());
        assert_eq!(bus.publish(&Ping(2)).delivered, 0);
    }

    #[test]
    fn event_names_are_short() {
        assert_eq!(event_name::<Ping>(), "Ping");
        assert_eq!(event_name::<Vec<u8>>(), "Vec");
    }
}
