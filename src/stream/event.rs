// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event - Publish/Subscribe Channel
//!
//! An `Event<T>` is the leaf notification primitive every stream is built on.
//! Listeners register a callback and receive a handle; firing the event
//! delivers the value to every registered callback before `fire` returns.
//!
//! # Characteristics
//!
//! - **Synchronous**: `fire` runs all callbacks on the calling thread
//! - **Ordered**: callbacks run in subscription order
//! - **Re-entrant**: callbacks may fire, listen or close during delivery;
//!   delivery iterates a snapshot and holds no lock while calling out
//!
//! # Ownership
//!
//! ```text
//! Event ──owns──▶ callback ──weak──▶ subscriber
//!   ▲                                   │
//!   └──────────── EventListener ◀──owns─┘
//! ```
//!
//! The event owns the callbacks. The subscriber owns an [`EventListener`]
//! which only holds a weak reference back to the event, so dropping either
//! side never leaks the other. Dropping the listener unregisters the callback.
//!
//! # Examples
//!
//! ```rust,ignore
//! let event = Event::new();
//! let listener = event.listen(|value: &i32| println!("fired {}", value));
//! event.fire(&1);
//! listener.close();
//! event.fire(&2); // nobody listening
//! ```

use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct EventInner<T> {
    listeners: Mutex<Vec<(u64, Callback<T>)>>,
    next_id: AtomicU64,
}

impl<T> EventInner<T> {
    fn remove(&self, id: u64) {
        self.listeners.lock().retain(|(listener_id, _)| *listener_id != id);
    }
}

/// Synchronous, ordered publish/subscribe channel
///
/// Cloning an `Event` creates a new handle to the **same** channel.
pub struct Event<T> {
    inner: Arc<EventInner<T>>,
}

impl<T> Clone for Event<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Event<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("type", &std::any::type_name::<T>())
            .field("listeners", &self.inner.listeners.lock().len())
            .finish()
    }
}

impl<T> Default for Event<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Event<T> {
    /// Create an event with no listeners
    pub fn new() -> Self {
        Self {
            inner: Arc::new(EventInner {
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Number of currently registered listeners
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }
}

impl<T: 'static> Event<T> {
    /// Register a callback
    ///
    /// The callback stays registered until the returned [`EventListener`] is
    /// closed or dropped.
    pub fn listen<F>(&self, callback: F) -> EventListener
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, Arc::new(callback)));

        let event: Weak<EventInner<T>> = Arc::downgrade(&self.inner);
        EventListener {
            close: Some(Box::new(move || {
                if let Some(event) = event.upgrade() {
                    event.remove(id);
                }
            })),
        }
    }

    /// Deliver `value` to every registered listener, in subscription order
    pub fn fire(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in snapshot {
            callback(value);
        }
    }
}

/// Registration handle returned by [`Event::listen`]
///
/// Closing or dropping the handle unregisters the callback.
pub struct EventListener {
    close: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl EventListener {
    /// Unregister the callback; closing twice is a no-op
    pub fn close(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(close) = self.close.take() {
            close();
        }
    }
}

impl Debug for EventListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListener")
            .field("attached", &self.close.is_some())
            .finish()
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        self.detach();
    }
}
