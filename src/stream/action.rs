// Copyright (c) 2025 - Cowboy AI, Inc.
//! Terminal stream consumers
//!
//! Side-effecting sinks at the end of a stream graph. Each holds its listener
//! registration; dropping or closing the sink detaches it from the upstream.

use parking_lot::Mutex;
use std::fmt::Debug;

use super::event::EventListener;
use super::StreamRef;

/// Calls a function with each upstream value
pub struct ValueStreamAction<T> {
    stream: StreamRef<T>,
    listener: Mutex<Option<EventListener>>,
}

impl<T: Clone + Send + Sync + 'static> ValueStreamAction<T> {
    /// Invoke `action` every time `stream` fires
    pub fn new<F>(stream: StreamRef<T>, action: F) -> Self
    where
        F: Fn(&Option<T>) + Send + Sync + 'static,
    {
        let listener = stream.value_stream().listen(action);
        Self {
            stream,
            listener: Mutex::new(Some(listener)),
        }
    }

    /// The observed stream
    pub fn stream(&self) -> &StreamRef<T> {
        &self.stream
    }

    /// Stop invoking the action
    pub fn close(&self) {
        self.listener.lock().take();
    }
}

/// Writes each upstream value to stdout as `value=<debug>`
pub struct PrintStream<T> {
    action: ValueStreamAction<T>,
}

impl<T: Clone + Debug + Send + Sync + 'static> PrintStream<T> {
    /// Print every value `stream` fires
    pub fn new(stream: StreamRef<T>) -> Self {
        Self {
            action: ValueStreamAction::new(stream, |value: &Option<T>| {
                println!("value={:?}", value);
            }),
        }
    }

    /// Stop printing
    pub fn close(&self) {
        self.action.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{Stream, ValueStream};
    use std::sync::Arc;

    #[test]
    fn test_action_invoked_until_closed() {
        let source = ValueStream::new(Some(0));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let action =
            ValueStreamAction::new(source.clone() as StreamRef<i32>, move |value: &Option<i32>| {
                sink.lock().push(*value)
            });

        source.set_value(Some(1));
        action.close();
        source.set_value(Some(2));

        assert_eq!(*seen.lock(), vec![Some(1)]);
        assert_eq!(action.stream().value(), Some(2));
    }

    #[test]
    fn test_print_stream_detaches_on_close() {
        let source = ValueStream::new(Some("x"));
        let printer = PrintStream::new(source.clone() as StreamRef<&'static str>);
        source.set_value(Some("y"));
        assert_eq!(source.value_stream().listener_count(), 1);

        printer.close();
        assert_eq!(source.value_stream().listener_count(), 0);
        drop(printer);
    }
}
