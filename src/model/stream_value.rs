// Copyright (c) 2025 - Cowboy AI, Inc.
//! StreamValueModel - a stream mirrored into a PropertyModel

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use super::PropertyModel;
use crate::stream::{structural_eq, EqualityFn, Event, EventListener, Observable, StreamRef};

struct Attachment<T> {
    stream: StreamRef<T>,
    listener: EventListener,
}

/// Observable property that always holds its upstream stream's value
///
/// The model takes a reference on the stream while attached, so timed
/// operators upstream keep running until the model is closed or dropped.
pub struct StreamValueModel<T> {
    model: Arc<PropertyModel<T>>,
    attachment: Mutex<Option<Attachment<T>>>,
}

impl<T: Clone + PartialEq + Send + Sync + 'static> StreamValueModel<T> {
    /// Mirror `stream`, comparing values structurally
    pub fn new(stream: StreamRef<T>) -> Self {
        Self::with_cmp(stream, structural_eq())
    }
}

impl<T: Clone + Send + Sync + 'static> StreamValueModel<T> {
    /// Mirror `stream` using `cmp` to suppress unchanged values
    pub fn with_cmp(stream: StreamRef<T>, cmp: EqualityFn<T>) -> Self {
        let model = Arc::new(PropertyModel::with_cmp(None, cmp));
        stream.add_ref();

        let weak = Arc::downgrade(&model);
        let listener = stream.value_stream().listen(move |value: &Option<T>| {
            if let Some(model) = weak.upgrade() {
                model.set_value(value.clone());
            }
        });
        model.set_value(stream.value());

        Self {
            model,
            attachment: Mutex::new(Some(Attachment {
                stream,
                listener,
            })),
        }
    }

    /// Current value
    pub fn value(&self) -> Option<T> {
        self.model.value()
    }

    /// The underlying property model
    pub fn property_model(&self) -> &Arc<PropertyModel<T>> {
        &self.model
    }

    /// Whether the model still follows its stream
    pub fn is_attached(&self) -> bool {
        self.attachment.lock().is_some()
    }

    /// Stop following the stream and release the reference on it
    pub fn close(&self) {
        let attachment = self.attachment.lock().take();
        if let Some(attachment) = attachment {
            let Attachment { stream, listener } = attachment;
            drop(listener);
            stream.remove_ref();
            self.model.close();
            debug!("Stream value model closed");
        }
    }
}

impl<T> Drop for StreamValueModel<T> {
    fn drop(&mut self) {
        if let Some(attachment) = self.attachment.get_mut().take() {
            let Attachment { stream, listener } = attachment;
            drop(listener);
            stream.remove_ref();
        }
    }
}

impl<T: Send + Sync> Observable for StreamValueModel<T> {
    fn property_changed_event(&self) -> &Event<String> {
        self.model.property_changed_event()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Scheduler;
    use crate::stream::{DebounceStream, MapStream, Stream, ValueStream};
    use std::time::Duration;

    #[test]
    fn test_mirrors_upstream() {
        let source = ValueStream::new(Some(1));
        let model = StreamValueModel::new(source.clone() as StreamRef<i32>);
        assert_eq!(model.value(), Some(1));

        let seen = Arc::new(Mutex::new(0));
        let sink = seen.clone();
        let _listener = model
            .property_changed_event()
            .listen(move |_: &String| *sink.lock() += 1);

        source.set_value(Some(2));
        assert_eq!(model.value(), source.value());
        source.set_value(None);
        assert_eq!(model.value(), None);
        assert_eq!(*seen.lock(), 2);
    }

    #[test]
    fn test_close_detaches() {
        let source = ValueStream::new(Some(1));
        let mapped =
            MapStream::new(source.clone() as StreamRef<i32>, |v: &Option<i32>| v.map(|v| v * 2));
        let model = StreamValueModel::new(mapped as StreamRef<i32>);

        model.close();
        assert!(!model.is_attached());
        source.set_value(Some(5));
        assert_eq!(model.value(), Some(2));

        model.close();
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_releases_timed_upstream() {
        let scheduler = Scheduler::current().unwrap();
        let source = ValueStream::new(Some(1));
        let debounced = DebounceStream::new(
            source.clone() as StreamRef<i32>,
            Duration::from_millis(50),
            &scheduler,
        );

        let model = StreamValueModel::new(debounced.clone() as StreamRef<i32>);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(model.value(), Some(1));

        source.set_value(Some(2));
        assert!(debounced.is_pending());
        drop(model);
        assert!(!debounced.is_pending());
    }
}
