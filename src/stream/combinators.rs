// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stream Combinators
//!
//! This module provides synchronous operators that derive a new stream from
//! one or more upstream streams. All of them recompute on the firing thread
//! before the upstream `fire` returns.
//!
//! # Available Combinators
//!
//! - [`MapStream`] - Transform values with a pure function, de-duplicating output
//! - [`CombineLatestStream`] - Combine the latest value of N streams; fires on
//!   every input fire
//! - [`OptionalStream`] - Pass values matching a predicate, `None` otherwise
//!
//! # Examples
//!
//! ## Mapping
//!
//! ```rust,ignore
//! let celsius = ValueStream::new(Some(20.0));
//! let fahrenheit = MapStream::new(celsius.clone() as StreamRef<f64>, |c| {
//!     c.map(|c| c * 9.0 / 5.0 + 32.0)
//! });
//! assert_eq!(fahrenheit.value(), Some(68.0));
//! ```
//!
//! ## Combining
//!
//! ```rust,ignore
//! let a = ValueStream::new(Some(1));
//! let b = ValueStream::new(Some(0));
//! let both = CombineLatestStream::new(vec![a.clone() as StreamRef<i32>, b.clone() as StreamRef<i32>]);
//!
//! a.set_value(Some(2)); // fires [Some(2), Some(0)]
//! b.set_value(Some(3)); // fires [Some(2), Some(3)]
//! ```

use parking_lot::Mutex;
use std::sync::{Arc, Weak};

use super::event::{Event, EventListener};
use super::{structural_eq, EqualityFn, Stream, StreamRef};

type MapFn<T, OT> = Arc<dyn Fn(&Option<T>) -> Option<OT> + Send + Sync>;
type CombineFn<T, OT> = Arc<dyn Fn(&[Option<T>]) -> Option<OT> + Send + Sync>;

/// Stream applying a function to each upstream value
///
/// Fires only when the mapped value differs from the last mapped value.
pub struct MapStream<T, OT> {
    upstream: StreamRef<T>,
    value_fn: MapFn<T, OT>,
    cmp: EqualityFn<Option<OT>>,
    value: Mutex<Option<OT>>,
    value_stream: Event<Option<OT>>,
    _listener: EventListener,
}

impl<T, OT> MapStream<T, OT>
where
    T: Clone + Send + Sync + 'static,
    OT: Clone + PartialEq + Send + Sync + 'static,
{
    /// Map `upstream` through `value_fn`
    pub fn new<F>(upstream: StreamRef<T>, value_fn: F) -> Arc<Self>
    where
        F: Fn(&Option<T>) -> Option<OT> + Send + Sync + 'static,
    {
        Self::with_cmp(upstream, value_fn, structural_eq())
    }
}

impl<T, OT> MapStream<T, OT>
where
    T: Clone + Send + Sync + 'static,
    OT: Clone + Send + Sync + 'static,
{
    /// Map `upstream` through `value_fn`, using `cmp` to suppress unchanged output
    pub fn with_cmp<F>(
        upstream: StreamRef<T>,
        value_fn: F,
        cmp: EqualityFn<Option<OT>>,
    ) -> Arc<Self>
    where
        F: Fn(&Option<T>) -> Option<OT> + Send + Sync + 'static,
    {
        let value_fn: MapFn<T, OT> = Arc::new(value_fn);

        Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let listener = upstream.value_stream().listen(move |value: &Option<T>| {
                if let Some(stream) = weak.upgrade() {
                    stream.update_value(value);
                }
            });

            let initial = value_fn(&upstream.value());
            Self {
                upstream,
                value_fn,
                cmp,
                value: Mutex::new(initial),
                value_stream: Event::new(),
                _listener: listener,
            }
        })
    }

    fn update_value(&self, value: &Option<T>) {
        let new_value = (self.value_fn)(value);
        {
            let mut current = self.value.lock();
            if (self.cmp)(&*current, &new_value) {
                return;
            }
            *current = new_value.clone();
        }
        self.value_stream.fire(&new_value);
    }
}

impl<T, OT> Stream<OT> for MapStream<T, OT>
where
    T: Clone + Send + Sync + 'static,
    OT: Clone + Send + Sync + 'static,
{
    fn value(&self) -> Option<OT> {
        self.value.lock().clone()
    }

    fn value_stream(&self) -> &Event<Option<OT>> {
        &self.value_stream
    }

    fn add_ref(&self) {
        self.upstream.add_ref();
    }

    fn remove_ref(&self) {
        self.upstream.remove_ref();
    }
}

struct CombineState<T, OT> {
    values: Vec<Option<T>>,
    value: Option<OT>,
}

/// Stream combining the latest value of each upstream
///
/// Keeps one slot per upstream, in input order. Any upstream fire overwrites
/// its slot and fires the recombined value, even when the result is unchanged.
pub struct CombineLatestStream<T, OT> {
    upstreams: Vec<StreamRef<T>>,
    value_fn: CombineFn<T, OT>,
    state: Mutex<CombineState<T, OT>>,
    value_stream: Event<Option<OT>>,
    _listeners: Vec<EventListener>,
}

impl<T> CombineLatestStream<T, Vec<Option<T>>>
where
    T: Clone + Send + Sync + 'static,
{
    /// Combine `upstreams` into the vector of their latest values
    pub fn new(upstreams: Vec<StreamRef<T>>) -> Arc<Self> {
        Self::with_fn(upstreams, |values| Some(values.to_vec()))
    }
}

impl<T, OT> CombineLatestStream<T, OT>
where
    T: Clone + Send + Sync + 'static,
    OT: Clone + Send + Sync + 'static,
{
    /// Combine `upstreams` with an N-ary function over their latest values
    pub fn with_fn<F>(upstreams: Vec<StreamRef<T>>, value_fn: F) -> Arc<Self>
    where
        F: Fn(&[Option<T>]) -> Option<OT> + Send + Sync + 'static,
    {
        let value_fn: CombineFn<T, OT> = Arc::new(value_fn);

        Arc::new_cyclic(|weak: &Weak<Self>| {
            let listeners = upstreams
                .iter()
                .enumerate()
                .map(|(index, upstream)| {
                    let weak = weak.clone();
                    upstream.value_stream().listen(move |value: &Option<T>| {
                        if let Some(stream) = weak.upgrade() {
                            stream.handle_stream_value(index, value);
                        }
                    })
                })
                .collect();

            let values: Vec<Option<T>> =
                upstreams.iter().map(|upstream| upstream.value()).collect();
            let value = value_fn(&values);

            Self {
                upstreams,
                value_fn,
                state: Mutex::new(CombineState { values, value }),
                value_stream: Event::new(),
                _listeners: listeners,
            }
        })
    }

    fn handle_stream_value(&self, index: usize, value: &Option<T>) {
        let values = {
            let mut state = self.state.lock();
            state.values[index] = value.clone();
            state.values.clone()
        };

        let combined = (self.value_fn)(&values);
        self.state.lock().value = combined.clone();
        self.value_stream.fire(&combined);
    }
}

impl<T, OT> Stream<OT> for CombineLatestStream<T, OT>
where
    T: Clone + Send + Sync + 'static,
    OT: Clone + Send + Sync + 'static,
{
    fn value(&self) -> Option<OT> {
        self.state.lock().value.clone()
    }

    fn value_stream(&self) -> &Event<Option<OT>> {
        &self.value_stream
    }

    fn add_ref(&self) {
        for upstream in &self.upstreams {
            upstream.add_ref();
        }
    }

    fn remove_ref(&self) {
        for upstream in &self.upstreams {
            upstream.remove_ref();
        }
    }
}

/// Stream passing upstream values that satisfy a predicate, `None` otherwise
///
/// Its own `value()` is always `None`; consumers observe it through the value
/// stream only.
pub struct OptionalStream<T> {
    upstream: StreamRef<T>,
    value_stream: Event<Option<T>>,
    _listener: EventListener,
}

impl<T: Clone + Send + Sync + 'static> OptionalStream<T> {
    /// Filter `upstream` through `pred`
    pub fn new<P>(upstream: StreamRef<T>, pred: P) -> Arc<Self>
    where
        P: Fn(&Option<T>) -> bool + Send + Sync + 'static,
    {
        let value_stream = Event::new();
        let outgoing = value_stream.clone();
        let listener = upstream.value_stream().listen(move |value: &Option<T>| {
            if pred(value) {
                outgoing.fire(value);
            } else {
                outgoing.fire(&None);
            }
        });

        Arc::new(Self {
            upstream,
            value_stream,
            _listener: listener,
        })
    }
}

impl<T: Clone + Send + Sync + 'static> Stream<T> for OptionalStream<T> {
    fn value(&self) -> Option<T> {
        None
    }

    fn value_stream(&self) -> &Event<Option<T>> {
        &self.value_stream
    }

    fn add_ref(&self) {
        self.upstream.add_ref();
    }

    fn remove_ref(&self) {
        self.upstream.remove_ref();
    }
}
