// Copyright (c) 2025 - Cowboy AI, Inc.
//! Reactive value streams for the Composable Information Machine
//!
//! This crate provides a push-based value-propagation layer used to bind
//! observable state to computed, derived and time-shaped values.
//!
//! # Layers
//!
//! ```text
//! reactor    ValueChangeStreamReactor (ordered begin/change/end)
//!    ▲
//! models     PropertyModel, StreamValueModel, FuncStreamValueModel
//!    ▲
//! operators  Map, CombineLatest, Optional, PropertyChanged,
//!            Debounce, Sample, ValueChange
//!    ▲
//! leaves     ValueStream, ConstantStream
//!    ▲
//! runtime    Event, Observable, Scheduler
//! ```
//!
//! Setting a leaf synchronously fires its listeners depth-first through the
//! operator graph. Timed operators and function models schedule work on a
//! [`Scheduler`], a handle to a tokio runtime.

pub mod config;
pub mod errors;
pub mod model;
pub mod scheduler;
pub mod stream;

// Re-export commonly used types
pub use config::{RuntimeFlavor, SchedulerConfig};
pub use errors::{StreamError, StreamResult};
pub use model::{FuncStreamValueModel, PropertyModel, StreamValueModel, ValueFn};
pub use scheduler::{Scheduler, SchedulerRuntime};
pub use stream::{
    CombineLatestStream, ConstantStream, DebounceStream, Event, EventListener, MapStream,
    Observable, OptionalStream, PropertyChangedEventStream, SampleStream, Stream, StreamRef,
    StreamRefGuard, StreamValues, ValueChange, ValueChangeQueue, ValueChangeStream,
    ValueChangeStreamReactor, ValueChangeType, ValueStream,
};
