//! Publish/subscribe event bus
//!
//! The bus is an explicit object shared through `Arc`; there is no global
//! instance. Listeners are plain closures keyed by event name and are invoked
//! synchronously, in registration order, on the publishing task.

pub mod callbacks;
pub mod event;

pub use callbacks::ProcessCallbacks;
pub use event::*;

use dashmap::DashMap;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub type Listener = Arc<dyn Fn(&EngineEvent) + Send + Sync>;

/// Handle returned by `subscribe`, used to remove a single listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Registration {
    id: SubscriptionId,
    once: bool,
    listener: Listener,
}

/// Event bus safe for concurrent publish and subscribe
pub struct EventBus {
    /// Registrations per event name, in registration order
    listeners: DashMap<String, Vec<Registration>>,
    next_id: AtomicU64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register `listener` for every `event_name` publish
    pub fn subscribe<F>(&self, event_name: &str, listener: F) -> SubscriptionId
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        self.register(event_name, Arc::new(listener), false)
    }

    /// Register `listener` for the next `event_name` publish only
    pub fn subscribe_once<F>(&self, event_name: &str, listener: F) -> SubscriptionId
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        self.register(event_name, Arc::new(listener), true)
    }

    fn register(&self, event_name: &str, listener: Listener, once: bool) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .entry(event_name.to_string())
            .or_default()
            .push(Registration { id, once, listener });
        id
    }

    /// Remove one listener, or every listener of `event_name` when `id` is `None`.
    ///
    /// Returns the number of listeners removed.
    pub fn unsubscribe(&self, event_name: &str, id: Option<SubscriptionId>) -> usize {
        match id {
            None => self
                .listeners
                .remove(event_name)
                .map(|(_, registrations)| registrations.len())
                .unwrap_or(0),
            Some(id) => {
                let Some(mut registrations) = self.listeners.get_mut(event_name) else {
                    return 0;
                };
                let before = registrations.len();
                registrations.retain(|r| r.id != id);
                before - registrations.len()
            }
        }
    }

    /// Deliver `event` to the listeners of its name.
    ///
    /// A panicking listener is logged and reported as a `listener_panicked`
    /// event; the remaining listeners still run and the publisher never sees
    /// the panic.
    pub fn publish(&self, event: EngineEvent) {
        let name = event.name().to_string();

        // Snapshot under the shard lock so once-listeners are removed before any
        // listener runs, then release it so listeners may use the bus.
        let due: Vec<Listener> = match self.listeners.get_mut(&name) {
            Some(mut registrations) => {
                let due = registrations.iter().map(|r| r.listener.clone()).collect();
                registrations.retain(|r| !r.once);
                due
            }
            None => return,
        };

        for listener in due {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| listener(&event))) {
                let message = panic_message(panic.as_ref());
                tracing::warn!(event = %name, %message, "Event listener panicked");
                if name != LISTENER_PANICKED {
                    self.publish(EngineEvent::ListenerPanicked {
                        source_event: name.clone(),
                        message,
                    });
                }
            }
        }
    }

    pub fn listener_count(&self, event_name: &str) -> usize {
        self.listeners
            .get(event_name)
            .map(|registrations| registrations.len())
            .unwrap_or(0)
    }

    /// Remove every listener
    pub fn clear(&self) {
        self.listeners.clear();
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
