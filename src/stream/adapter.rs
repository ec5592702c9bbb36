// Copyright (c) 2025 - Cowboy AI, Inc.
//! Bridge from push-based streams to `futures::Stream`
//!
//! [`StreamValues`] subscribes to a stream's value event and queues every
//! fired value, so async code can consume a stream graph with
//! `StreamExt::next`:
//!
//! ```rust,ignore
//! use futures::StreamExt;
//!
//! let mut values = StreamValues::new(&debounced);
//! while let Some(value) = values.next().await {
//!     println!("settled on {:?}", value);
//! }
//! ```
//!
//! The adapter holds a reference on the stream for its whole lifetime, which
//! keeps timed operators scheduling.

use futures::channel::mpsc::{self, UnboundedReceiver};
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::trace;

use super::event::EventListener;
use super::{StreamRef, StreamRefGuard};

/// Every value fired by a stream, as an async stream
pub struct StreamValues<T> {
    receiver: UnboundedReceiver<Option<T>>,
    listener: Option<EventListener>,
    _guard: StreamRefGuard<T>,
}

impl<T: Clone + Send + Sync + 'static> StreamValues<T> {
    /// Start queuing values fired by `stream`
    pub fn new(stream: &StreamRef<T>) -> Self {
        let (sender, receiver) = mpsc::unbounded();
        let listener = stream.value_stream().listen(move |value: &Option<T>| {
            if sender.unbounded_send(value.clone()).is_err() {
                trace!("Stream value dropped, consumer gone");
            }
        });

        Self {
            receiver,
            listener: Some(listener),
            _guard: StreamRefGuard::new(stream.clone()),
        }
    }

    /// Stop queuing; already queued values are still yielded
    pub fn close(&mut self) {
        self.listener.take();
    }
}

impl<T> futures::Stream for StreamValues<T> {
    type Item = Option<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().receiver).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{Stream, ValueStream};
    use futures::StreamExt;

    #[tokio::test]
    async fn test_values_arrive_in_order() {
        let source = ValueStream::new(Some(0));
        let stream: StreamRef<i32> = source.clone();
        let mut values = StreamValues::new(&stream);

        source.set_value(Some(1));
        source.set_value(None);
        source.set_value(Some(2));

        assert_eq!(values.next().await, Some(Some(1)));
        assert_eq!(values.next().await, Some(None));
        assert_eq!(values.next().await, Some(Some(2)));
    }

    #[tokio::test]
    async fn test_close_ends_stream_after_drain() {
        let source = ValueStream::new(Some(0));
        let stream: StreamRef<i32> = source.clone();
        let mut values = StreamValues::new(&stream);

        source.set_value(Some(1));
        values.close();
        source.set_value(Some(2));

        assert_eq!(source.value_stream().listener_count(), 0);
        assert_eq!(values.next().await, Some(Some(1)));
        assert_eq!(values.next().await, None);
    }

    #[test]
    fn test_pending_until_fired() {
        let source = ValueStream::new(Some(0));
        let stream: StreamRef<i32> = source.clone();
        let mut values = tokio_test::task::spawn(StreamValues::new(&stream));

        tokio_test::assert_pending!(values.poll_next());
        source.set_value(Some(3));
        assert!(values.is_woken());
        tokio_test::assert_ready_eq!(values.poll_next(), Some(Some(3)));
    }
}
