// Copyright (c) 2025 - Cowboy AI, Inc.
//! Reactive Value Streams
//!
//! This module provides push-based value streams for binding observable state
//! to computed, derived and time-shaped values.
//!
//! # Core Concepts
//!
//! ## Stream<T>
//!
//! Base trait for a value that changes over time. A stream always exposes its
//! most recent value and an [`Event`] that fires with each new value.
//!
//! ```text
//! Time:  ────────────────────────────→
//! value:  0 0 0 1 1 1 1 3 3 3 3 3 3 3
//! fires:        ●       ●
//! ```
//!
//! ## Operators
//!
//! Operators subscribe to one or more upstream streams and re-fire derived
//! values:
//!
//! - **Synchronous**: [`MapStream`], [`CombineLatestStream`], [`OptionalStream`],
//!   [`PropertyChangedEventStream`], [`ConstantStream`]
//! - **Timed**: [`DebounceStream`], [`SampleStream`] (need a [`Scheduler`](crate::scheduler::Scheduler))
//! - **Phased**: [`ValueChangeStream`] with its [`ValueChangeStreamReactor`]
//!
//! # Graph Ownership
//!
//! ```text
//!  ValueStream ──event──▶ callback ──weak──▶ MapStream ──event──▶ callback ──weak──▶ Model
//!       ▲                                        │                                     │
//!       └──────────────── strong ────────────────┘◀─────────────── strong ─────────────┘
//! ```
//!
//! Downstream nodes hold their upstreams strongly; upstream events only hold
//! callbacks that reach downstream nodes through weak references. Dropping the
//! last handle to a downstream node therefore tears it down, and its listener
//! handle unregisters the callback.
//!
//! # Reference Counting
//!
//! Streams wrapping a disposable resource (a scheduled task) count explicit
//! references taken with [`Stream::add_ref`]. When the count returns to zero
//! the resource is released deterministically. Derived operators forward
//! references to their upstreams.
//!
//! # Example
//!
//! ```rust,ignore
//! use cim_reactive::stream::*;
//!
//! let width = ValueStream::new(Some(3));
//! let height = ValueStream::new(Some(4));
//!
//! let area = CombineLatestStream::with_fn(
//!     vec![width.clone() as StreamRef<i32>, height.clone() as StreamRef<i32>],
//!     |values| Some(values.iter().flatten().product::<i32>()),
//! );
//! let label = MapStream::new(area.clone() as StreamRef<i32>, |area| {
//!     area.map(|a| format!("{} sq", a))
//! });
//!
//! width.set_value(Some(5));
//! assert_eq!(label.value(), Some("20 sq".to_string()));
//! ```

pub mod action;
pub mod adapter;
pub mod combinators;
pub mod event;
pub mod observable;
pub mod property;
pub mod refcount;
pub mod task;
pub mod timed;
pub mod value;
pub mod value_change;

pub use action::{PrintStream, ValueStreamAction};
pub use adapter::StreamValues;
pub use combinators::{CombineLatestStream, MapStream, OptionalStream};
pub use event::{Event, EventListener};
pub use observable::Observable;
pub use property::PropertyChangedEventStream;
pub use refcount::RefCount;
pub use task::StreamTask;
pub use timed::{DebounceStream, SampleStream};
pub use value::{ConstantStream, ValueStream};
pub use value_change::{
    ValueChange, ValueChangeQueue, ValueChangeStream, ValueChangeStreamReactor, ValueChangeType,
};

use std::ops::Deref;
use std::sync::Arc;

/// Shared handle to any stream
pub type StreamRef<T> = Arc<dyn Stream<T>>;

/// Caller-supplied equality comparator
pub type EqualityFn<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// A value that changes over time and announces each change
///
/// # Contract
///
/// - `value()` returns the most recently produced value, or `None` if nothing
///   has been produced yet
/// - `value_stream()` fires with the new value every time it changes
/// - `add_ref()`/`remove_ref()` mark interest from a long-lived consumer; the
///   default implementation ignores them
pub trait Stream<T>: Send + Sync {
    /// Current value of the stream
    fn value(&self) -> Option<T>;

    /// Channel that fires with each new value
    fn value_stream(&self) -> &Event<Option<T>>;

    /// Take a reference on the stream's resources
    fn add_ref(&self) {}

    /// Release a reference taken with [`add_ref`](Stream::add_ref)
    fn remove_ref(&self) {}
}

/// Scoped reference on a stream
///
/// Calls [`Stream::add_ref`] on creation and [`Stream::remove_ref`] on drop.
pub struct StreamRefGuard<T> {
    stream: StreamRef<T>,
}

impl<T> StreamRefGuard<T> {
    /// Take a reference on `stream` for the lifetime of the guard
    pub fn new(stream: StreamRef<T>) -> Self {
        stream.add_ref();
        Self { stream }
    }

    /// The referenced stream
    pub fn stream(&self) -> &StreamRef<T> {
        &self.stream
    }
}

impl<T> Deref for StreamRefGuard<T> {
    type Target = dyn Stream<T>;

    fn deref(&self) -> &Self::Target {
        self.stream.as_ref()
    }
}

impl<T> Drop for StreamRefGuard<T> {
    fn drop(&mut self) {
        self.stream.remove_ref();
    }
}

/// Structural equality as an [`EqualityFn`]
pub fn structural_eq<T: PartialEq>() -> EqualityFn<T> {
    Arc::new(|a: &T, b: &T| a == b)
}
