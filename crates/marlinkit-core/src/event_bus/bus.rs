//! Event emitter implementation.
//!
//! Listeners are invoked synchronously on the emitting thread, in the order
//! they were registered. Async consumers can additionally take a broadcast
//! receiver which sees every emitted event.

use parking_lot::RwLock;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::events::{Event, EventFilter};

/// Handle returned by [`EventEmitter::on`], used to remove the listener again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Listener({})", &self.0.to_string()[..8])
    }
}

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Registration<E: Event> {
    id: ListenerId,
    filter: EventFilter<E::Kind>,
    listener: Listener<E>,
}

/// Configuration for an event emitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitterConfig {
    /// Channel capacity for the broadcast tap.
    pub channel_capacity: usize,
    /// Maximum number of events kept in history; 0 disables history.
    pub max_history_size: usize,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            max_history_size: 0,
        }
    }
}

/// Publish/subscribe hub for one event type
pub struct EventEmitter<E: Event> {
    /// Broadcast channel sender
    sender: broadcast::Sender<E>,
    /// Registered listeners, in registration order
    listeners: RwLock<Vec<Registration<E>>>,
    /// Most recent events (bounded by `max_history_size`)
    history: RwLock<VecDeque<E>>,
    config: EmitterConfig,
}

impl<E: Event> EventEmitter<E> {
    /// Create a new emitter with default configuration
    pub fn new() -> Self {
        Self::with_config(EmitterConfig::default())
    }

    /// Create a new emitter with custom configuration
    pub fn with_config(config: EmitterConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            sender,
            listeners: RwLock::new(Vec::new()),
            history: RwLock::new(VecDeque::new()),
            config,
        }
    }

    /// Register a listener for a single event kind
    pub fn on<F>(&self, kind: E::Kind, listener: F) -> ListenerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscribe(EventFilter::only(kind), listener)
    }

    /// Register a listener for every event matching `filter`
    ///
    /// Registering the same closure twice yields two independent listeners.
    pub fn subscribe<F>(&self, filter: EventFilter<E::Kind>, listener: F) -> ListenerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = ListenerId::new();
        self.listeners.write().push(Registration {
            id,
            filter,
            listener: Arc::new(listener),
        });
        tracing::debug!("{} added", id);
        id
    }

    /// Remove a listener
    ///
    /// Returns true if the listener was found and removed.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|registration| registration.id != id);
        let removed = listeners.len() != before;
        if removed {
            tracing::debug!("{} removed", id);
        }
        removed
    }

    /// Deliver an event to every matching listener, then to the broadcast tap
    ///
    /// A listener that panics is logged and skipped; the remaining listeners
    /// still receive the event. Returns the number of listeners that handled
    /// the event without panicking.
    pub fn emit(&self, event: E) -> usize {
        let kind = event.kind();

        if self.config.max_history_size > 0 {
            self.add_to_history(&event);
        }

        // Snapshot so listeners may call `on`/`off` without deadlocking.
        let targets: Vec<(ListenerId, Listener<E>)> = self
            .listeners
            .read()
            .iter()
            .filter(|registration| registration.filter.matches(&kind))
            .map(|registration| (registration.id, registration.listener.clone()))
            .collect();

        let mut delivered = 0;
        for (id, listener) in targets {
            match panic::catch_unwind(AssertUnwindSafe(|| listener(&event))) {
                Ok(()) => delivered += 1,
                Err(payload) => {
                    tracing::error!(
                        "{} panicked while handling '{}' event: {}",
                        id,
                        kind,
                        panic_message(payload.as_ref())
                    );
                }
            }
        }

        // No receivers is not an error; the tap is optional.
        let _ = self.sender.send(event);
        delivered
    }

    /// Get a receiver for async consumption of every emitted event
    pub fn receiver(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Recent events, oldest first (empty when history is disabled)
    pub fn history(&self) -> Vec<E> {
        self.history.read().iter().cloned().collect()
    }

    fn add_to_history(&self, event: &E) {
        let mut history = self.history.write();
        history.push_back(event.clone());
        while history.len() > self.config.max_history_size {
            history.pop_front();
        }
    }
}

impl<E: Event> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> std::fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listener_count())
            .field("config", &self.config)
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Ping(u32),
        Pong,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestKind {
        Ping,
        Pong,
    }

    impl std::fmt::Display for TestKind {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                TestKind::Ping => write!(f, "ping"),
                TestKind::Pong => write!(f, "pong"),
            }
        }
    }

    impl Event for TestEvent {
        type Kind = TestKind;

        fn kind(&self) -> TestKind {
            match self {
                TestEvent::Ping(_) => TestKind::Ping,
                TestEvent::Pong => TestKind::Pong,
            }
        }
    }

    #[test]
    fn test_emitter_creation() {
        let emitter: EventEmitter<TestEvent> = EventEmitter::new();
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn test_on_and_off() {
        let emitter: EventEmitter<TestEvent> = EventEmitter::new();

        let id = emitter.on(TestKind::Ping, |_| {});
        assert_eq!(emitter.listener_count(), 1);

        assert!(emitter.off(id));
        assert_eq!(emitter.listener_count(), 0);

        // Double removal should return false
        assert!(!emitter.off(id));
    }

    #[test]
    fn test_delivery_by_kind() {
        let emitter: EventEmitter<TestEvent> = EventEmitter::new();
        let pings = Arc::new(AtomicUsize::new(0));
        let pongs = Arc::new(AtomicUsize::new(0));

        let p = pings.clone();
        emitter.on(TestKind::Ping, move |_| {
            p.fetch_add(1, Ordering::SeqCst);
        });
        let p = pongs.clone();
        emitter.on(TestKind::Pong, move |_| {
            p.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(emitter.emit(TestEvent::Ping(1)), 1);
        emitter.emit(TestEvent::Ping(2));
        emitter.emit(TestEvent::Pong);

        assert_eq!(pings.load(Ordering::SeqCst), 2);
        assert_eq!(pongs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_registration_order_and_duplicates() {
        let emitter: EventEmitter<TestEvent> = EventEmitter::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let c = calls.clone();
            emitter.on(TestKind::Ping, move |_| c.lock().push(tag));
        }
        let c = calls.clone();
        let duplicate = move |_: &TestEvent| c.lock().push("dup");
        let dup_a = emitter.on(TestKind::Ping, duplicate.clone());
        emitter.on(TestKind::Ping, duplicate);

        emitter.emit(TestEvent::Ping(0));
        assert_eq!(*calls.lock(), vec!["first", "second", "dup", "dup"]);

        emitter.off(dup_a);
        calls.lock().clear();
        emitter.emit(TestEvent::Ping(0));
        assert_eq!(*calls.lock(), vec!["first", "second", "dup"]);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let emitter: EventEmitter<TestEvent> = EventEmitter::new();
        let counter = Arc::new(AtomicUsize::new(0));

        emitter.on(TestKind::Ping, |_| panic!("listener failure"));
        let c = counter.clone();
        emitter.on(TestKind::Ping, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(emitter.emit(TestEvent::Ping(1)), 1);
        assert_eq!(emitter.emit(TestEvent::Ping(2)), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_listener_may_unsubscribe_during_dispatch() {
        let emitter: Arc<EventEmitter<TestEvent>> = Arc::new(EventEmitter::new());
        let slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));

        let weak = Arc::downgrade(&emitter);
        let s = slot.clone();
        let id = emitter.on(TestKind::Ping, move |_| {
            if let (Some(emitter), Some(id)) = (weak.upgrade(), *s.lock()) {
                emitter.off(id);
            }
        });
        *slot.lock() = Some(id);

        emitter.emit(TestEvent::Ping(1));
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn test_subscribe_all() {
        let emitter: EventEmitter<TestEvent> = EventEmitter::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        emitter.subscribe(EventFilter::All, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        emitter.emit(TestEvent::Ping(1));
        emitter.emit(TestEvent::Pong);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(emitter.listener_count(), 1);
    }

    #[test]
    fn test_history_disabled_by_default() {
        let emitter: EventEmitter<TestEvent> = EventEmitter::new();
        emitter.emit(TestEvent::Pong);
        assert!(emitter.history().is_empty());
    }

    #[test]
    fn test_history_max_size() {
        let emitter: EventEmitter<TestEvent> = EventEmitter::with_config(EmitterConfig {
            max_history_size: 3,
            ..Default::default()
        });

        for i in 0..5 {
            emitter.emit(TestEvent::Ping(i));
        }

        assert_eq!(
            emitter.history(),
            vec![TestEvent::Ping(2), TestEvent::Ping(3), TestEvent::Ping(4)]
        );
    }

    #[tokio::test]
    async fn test_async_receiver() {
        let emitter: EventEmitter<TestEvent> = EventEmitter::new();
        let mut receiver = emitter.receiver();

        emitter.emit(TestEvent::Ping(7));
        emitter.emit(TestEvent::Pong);

        assert_eq!(receiver.recv().await.ok(), Some(TestEvent::Ping(7)));
        assert_eq!(receiver.recv().await.ok(), Some(TestEvent::Pong));
    }
}
