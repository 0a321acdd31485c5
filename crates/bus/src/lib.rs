//! Publish/subscribe notifier for decoupled telemetry delivery.
//!
//! Services publish [`Event`]s and subscribe to them without depending on
//! each other. Two delivery modes are supported:
//!
//! - [`EventBus::publish`] immediately invokes all matching listeners —
//!   use for events that must be observed before the publisher continues.
//! - [`EventBus::publish_async`] only enqueues; the event is delivered on
//!   the next [`EventBus::process_queue`] call, in FIFO enqueue order.
//!   The queue is the one cross-thread surface: its mutex is held only
//!   long enough to push or swap, so producers are never blocked by slow
//!   subscribers.
//!
//! Subscription lists are read at dispatch time, not enqueue time: a
//! listener registered between `publish_async` and `process_queue` receives
//! the queued events. Listener panics are not isolated — a panicking
//! listener aborts delivery to the remaining listeners in that dispatch.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use renderflow_types::{Event, EventKind};

/// Callback invoked with each delivered event.
pub type Listener = Box<dyn Fn(&Event) + Send + Sync>;

/// Event bus with synchronous fan-out and a deferred delivery queue.
#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<EventKind, Vec<Listener>>,
    global_listeners: Vec<Listener>,
    queue: Mutex<VecDeque<Event>>,
}

impl EventBus {
    /// Creates an empty bus with no listeners and an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a listener to one event kind.
    pub fn subscribe(&mut self, kind: EventKind, listener: impl Fn(&Event) + Send + Sync + 'static) {
        self.listeners.entry(kind).or_default().push(Box::new(listener));
    }

    /// Subscribes a listener to every event, regardless of kind.
    ///
    /// Global listeners run after the kind-specific listeners for each
    /// delivered event. Useful for logging and telemetry capture.
    pub fn subscribe_all(&mut self, listener: impl Fn(&Event) + Send + Sync + 'static) {
        self.global_listeners.push(Box::new(listener));
    }

    /// Publishes an event synchronously, invoking all matching listeners
    /// before returning.
    pub fn publish(&self, event: &Event) {
        self.dispatch(event);
    }

    /// Enqueues an event for deferred delivery by [`Self::process_queue`].
    pub fn publish_async(&self, event: Event) {
        let mut queue = self.queue.lock().expect("event queue poisoned");
        queue.push_back(event);
    }

    /// Drains the deferred queue, dispatching each event in FIFO enqueue
    /// order. Returns the number of events delivered.
    ///
    /// The queue is swapped out under the lock and dispatched afterwards, so
    /// listeners may themselves call [`Self::publish_async`]; events they
    /// enqueue are delivered on the *next* call.
    pub fn process_queue(&self) -> usize {
        let drained = {
            let mut queue = self.queue.lock().expect("event queue poisoned");
            std::mem::take(&mut *queue)
        };
        let count = drained.len();
        for event in &drained {
            self.dispatch(event);
        }
        count
    }

    /// Removes all listeners. Queued events are kept.
    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
        self.global_listeners.clear();
    }

    /// Number of listeners subscribed to the given kind.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    /// Number of listeners subscribed to all events.
    pub fn global_listener_count(&self) -> usize {
        self.global_listeners.len()
    }

    fn dispatch(&self, event: &Event) {
        if let Some(listeners) = self.listeners.get(&event.kind) {
            for listener in listeners {
                listener(event);
            }
        }
        for listener in &self.global_listeners {
            listener(event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let queued = self.queue.lock().map(|queue| queue.len()).unwrap_or(0);
        formatter
            .debug_struct("EventBus")
            .field("kinds", &self.listeners.len())
            .field("global_listeners", &self.global_listeners.len())
            .field("queued", &queued)
            .finish()
    }
}
