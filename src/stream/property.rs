// Copyright (c) 2025 - Cowboy AI, Inc.
//! PropertyChangedEventStream - a named property of an Observable as a stream
//!
//! The observed object is itself supplied as a stream, so the stream follows
//! the object when it is replaced:
//!
//! ```text
//! source stream ──(object changed)──▶ detach old listener
//!                                     attach to new object's property_changed_event
//!                                     re-read property, fire if different
//!
//! object ──(property_changed "name")──▶ re-read property, fire if different
//! ```
//!
//! A plain object can be observed through [`PropertyChangedEventStream::for_object`],
//! which wraps it in a [`ConstantStream`].

use parking_lot::Mutex;
use std::sync::{Arc, Weak};

use super::event::{Event, EventListener};
use super::observable::Observable;
use super::value::ConstantStream;
use super::{structural_eq, EqualityFn, Stream, StreamRef};

type PropertyGetter<O, T> = Arc<dyn Fn(&O) -> Option<T> + Send + Sync>;

struct PropertyState<O, T> {
    source_object: Option<Arc<O>>,
    value: Option<T>,
    property_listener: Option<EventListener>,
}

/// Stream of one named property of an [`Observable`] object
pub struct PropertyChangedEventStream<O, T> {
    source_stream: StreamRef<Arc<O>>,
    property_name: String,
    getter: PropertyGetter<O, T>,
    cmp: EqualityFn<Option<T>>,
    state: Mutex<PropertyState<O, T>>,
    value_stream: Event<Option<T>>,
    weak_self: Weak<Self>,
    _source_listener: EventListener,
}

impl<O, T> PropertyChangedEventStream<O, T>
where
    O: Observable + 'static,
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Observe `property_name` on whatever object `source_stream` currently holds
    ///
    /// `getter` reads the property from the object.
    pub fn new<G>(
        source_stream: StreamRef<Arc<O>>,
        property_name: impl Into<String>,
        getter: G,
    ) -> Arc<Self>
    where
        G: Fn(&O) -> Option<T> + Send + Sync + 'static,
    {
        Self::with_cmp(source_stream, property_name, getter, structural_eq())
    }

    /// Observe `property_name` on a fixed object
    pub fn for_object<G>(
        source_object: Arc<O>,
        property_name: impl Into<String>,
        getter: G,
    ) -> Arc<Self>
    where
        G: Fn(&O) -> Option<T> + Send + Sync + 'static,
    {
        Self::new(ConstantStream::new(Some(source_object)), property_name, getter)
    }
}

impl<O, T> PropertyChangedEventStream<O, T>
where
    O: Observable + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Observe a property using `cmp` to decide whether a re-read value changed
    pub fn with_cmp<G>(
        source_stream: StreamRef<Arc<O>>,
        property_name: impl Into<String>,
        getter: G,
        cmp: EqualityFn<Option<T>>,
    ) -> Arc<Self>
    where
        G: Fn(&O) -> Option<T> + Send + Sync + 'static,
    {
        let stream = Arc::new_cyclic(|weak: &Weak<Self>| {
            let source_weak = weak.clone();
            let listener = source_stream.value_stream().listen(move |object: &Option<Arc<O>>| {
                if let Some(stream) = source_weak.upgrade() {
                    stream.source_object_changed(object.clone());
                }
            });

            Self {
                source_stream,
                property_name: property_name.into(),
                getter: Arc::new(getter),
                cmp,
                state: Mutex::new(PropertyState {
                    source_object: None,
                    value: None,
                    property_listener: None,
                }),
                value_stream: Event::new(),
                weak_self: weak.clone(),
                _source_listener: listener,
            }
        });

        stream.source_object_changed(stream.source_stream.value());
        stream
    }

    /// Name of the observed property
    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    fn source_object_changed(&self, source_object: Option<Arc<O>>) {
        let property_listener = source_object.as_ref().map(|object| {
            let weak = self.weak_self.clone();
            object.property_changed_event().listen(move |key: &String| {
                if let Some(stream) = weak.upgrade() {
                    stream.property_changed(key);
                }
            })
        });

        let previous = {
            let mut state = self.state.lock();
            state.source_object = source_object;
            std::mem::replace(&mut state.property_listener, property_listener)
        };
        drop(previous);

        self.refresh();
    }

    fn property_changed(&self, key: &str) {
        if key == self.property_name {
            self.refresh();
        }
    }

    fn refresh(&self) {
        let source_object = self.state.lock().source_object.clone();
        let new_value = source_object.and_then(|object| (self.getter)(&object));

        {
            let mut state = self.state.lock();
            if (self.cmp)(&new_value, &state.value) {
                return;
            }
            state.value = new_value.clone();
        }
        self.value_stream.fire(&new_value);
    }
}

impl<O, T> Stream<T> for PropertyChangedEventStream<O, T>
where
    O: Observable + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn value(&self) -> Option<T> {
        self.state.lock().value.clone()
    }

    fn value_stream(&self) -> &Event<Option<T>> {
        &self.value_stream
    }
}
