// Copyright (c) 2025 - Cowboy AI, Inc.
//! Leaf Streams - Settable and Constant Values
//!
//! A [`ValueStream<T>`] is the settable leaf of every stream graph. Setting a
//! value that differs from the current one stores it and fires the value
//! stream; setting an equal value does nothing.
//!
//! ```text
//! set:    1   1   2   2   2   3
//! fires:  ●       ●           ●
//! ```
//!
//! A [`ConstantStream<T>`] holds a fixed value and never fires. It lets a plain
//! value stand in wherever a stream is expected.
//!
//! # Examples
//!
//! ```rust,ignore
//! let stream = ValueStream::new(Some(1));
//! stream.set_value(Some(1)); // no fire
//! stream.set_value(Some(2)); // fires Some(2)
//! ```

use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;

use super::event::Event;
use super::Stream;

type SendGate<T> = Box<dyn Fn(&Option<T>) -> bool + Send + Sync>;

/// Settable stream that fires when its value changes
pub struct ValueStream<T> {
    value: Mutex<Option<T>>,
    value_stream: Event<Option<T>>,
    gate: Option<SendGate<T>>,
}

impl<T: Debug> Debug for ValueStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueStream")
            .field("value", &*self.value.lock())
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> ValueStream<T> {
    /// Create a stream holding `value`
    pub fn new(value: Option<T>) -> Arc<Self> {
        Arc::new(Self {
            value: Mutex::new(value),
            value_stream: Event::new(),
            gate: None,
        })
    }

    /// Create a stream whose outgoing fires pass through `gate`
    ///
    /// The value is always stored; it is only delivered to listeners when the
    /// gate returns `true`.
    pub fn with_gate<G>(value: Option<T>, gate: G) -> Arc<Self>
    where
        G: Fn(&Option<T>) -> bool + Send + Sync + 'static,
    {
        Arc::new(Self {
            value: Mutex::new(value),
            value_stream: Event::new(),
            gate: Some(Box::new(gate)),
        })
    }

    /// Store `value` and fire, without comparing against the current value
    pub fn send_value(&self, value: Option<T>) {
        *self.value.lock() = value.clone();
        let open = self.gate.as_ref().map_or(true, |gate| gate(&value));
        if open {
            self.value_stream.fire(&value);
        }
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> ValueStream<T> {
    /// Store and fire `value` if it differs from the current value
    pub fn set_value(&self, value: Option<T>) {
        let changed = *self.value.lock() != value;
        if changed {
            self.send_value(value);
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Stream<T> for ValueStream<T> {
    fn value(&self) -> Option<T> {
        self.value.lock().clone()
    }

    fn value_stream(&self) -> &Event<Option<T>> {
        &self.value_stream
    }
}

/// Stream with a fixed value that never fires
pub struct ConstantStream<T> {
    value: Option<T>,
    value_stream: Event<Option<T>>,
}

impl<T: Debug> Debug for ConstantStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstantStream")
            .field("value", &self.value)
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> ConstantStream<T> {
    /// Create a constant stream
    pub fn new(value: Option<T>) -> Arc<Self> {
        Arc::new(Self {
            value,
            value_stream: Event::new(),
        })
    }
}

impl<T: Clone + Send + Sync + 'static> Stream<T> for ConstantStream<T> {
    fn value(&self) -> Option<T> {
        self.value.clone()
    }

    fn value_stream(&self) -> &Event<Option<T>> {
        &self.value_stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record<T: Clone + Send + Sync + 'static>(
        stream: &dyn Stream<T>,
    ) -> (Arc<Mutex<Vec<Option<T>>>>, crate::stream::EventListener) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener = stream
            .value_stream()
            .listen(move |value: &Option<T>| sink.lock().push(value.clone()));
        (seen, listener)
    }

    #[test]
    fn test_set_value_fires_on_change() {
        let stream = ValueStream::new(Some(0));
        let (seen, _listener) = record(stream.as_ref());

        stream.set_value(Some(1));
        stream.set_value(Some(1));
        stream.set_value(None);
        stream.set_value(None);
        stream.set_value(Some(2));

        assert_eq!(*seen.lock(), vec![Some(1), None, Some(2)]);
        assert_eq!(stream.value(), Some(2));
    }

    #[test]
    fn test_send_value_always_fires() {
        let stream = ValueStream::new(Some("a"));
        let (seen, _listener) = record(stream.as_ref());

        stream.send_value(Some("a"));
        stream.send_value(Some("a"));

        assert_eq!(*seen.lock(), vec![Some("a"), Some("a")]);
    }

    #[test]
    fn test_gate_suppresses_delivery_but_stores() {
        let stream = ValueStream::with_gate(None, |value: &Option<i32>| {
            value.map_or(false, |v| v % 2 == 0)
        });
        let (seen, _listener) = record(stream.as_ref());

        stream.set_value(Some(1));
        assert_eq!(stream.value(), Some(1));
        stream.set_value(Some(2));
        stream.set_value(Some(3));

        assert_eq!(*seen.lock(), vec![Some(2)]);
        assert_eq!(stream.value(), Some(3));
    }

    #[test]
    fn test_constant_stream() {
        let stream = ConstantStream::new(Some(42));
        assert_eq!(stream.value(), Some(42));
        assert_eq!(stream.value_stream().listener_count(), 0);
    }

    #[test]
    fn test_listener_can_read_value_during_fire() {
        let stream = ValueStream::new(Some(0));
        let observed = Arc::new(Mutex::new(None));

        let weak = Arc::downgrade(&stream);
        let sink = observed.clone();
        let _listener = stream.value_stream().listen(move |_| {
            if let Some(stream) = weak.upgrade() {
                *sink.lock() = stream.value();
            }
        });

        stream.set_value(Some(5));
        assert_eq!(*observed.lock(), Some(5));
    }
}
