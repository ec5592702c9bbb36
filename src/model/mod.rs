// Copyright (c) 2025 - Cowboy AI, Inc.
//! Models - Streams as Observable Properties
//!
//! Models are the terminal consumers of a stream graph. Each exposes a single
//! `"value"` property through the [`Observable`] capability so that UI
//! bindings or other observers can follow it.
//!
//! ```text
//!  Stream<T> ──fire──▶ StreamValueModel ──▶ PropertyModel.value ──▶ "value" changed
//!
//!  Stream<fn> ──fire──▶ FuncStreamValueModel ──executor──▶ fn() ──▶ PropertyModel.value
//! ```
//!
//! - [`PropertyModel`]: a settable observable cell with a configurable
//!   comparator and an optional `on_value_changed` callback
//! - [`StreamValueModel`]: mirrors a stream's value 1:1
//! - [`FuncStreamValueModel`]: evaluates each function delivered by a stream
//!   on the blocking pool; only the latest function's result lands

pub mod func_stream;
pub mod stream_value;

pub use func_stream::{FuncStreamValueModel, ValueFn};
pub use stream_value::StreamValueModel;

use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;

use crate::stream::{structural_eq, EqualityFn, Event, Observable};

/// Name of the property every model announces
pub const VALUE_PROPERTY: &str = "value";

type ValueCallback<T> = Arc<dyn Fn(&Option<T>) + Send + Sync>;

/// Observable value cell
///
/// Setting a value notifies `"value"` and then calls `on_value_changed` when
/// the value differs from the current one. A transition between `None` and a
/// value is always a change; two values are compared with the model's
/// comparator.
pub struct PropertyModel<T> {
    value: Mutex<Option<T>>,
    cmp: EqualityFn<T>,
    on_value_changed: Mutex<Option<ValueCallback<T>>>,
    property_changed_event: Event<String>,
}

impl<T: Debug> Debug for PropertyModel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyModel")
            .field("value", &*self.value.lock())
            .finish()
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> PropertyModel<T> {
    /// Create a model holding `value`, compared structurally
    pub fn new(value: Option<T>) -> Self {
        Self::with_cmp(value, structural_eq())
    }
}

impl<T: Clone + Send + Sync + 'static> PropertyModel<T> {
    /// Create a model holding `value` with a custom comparator
    pub fn with_cmp(value: Option<T>, cmp: EqualityFn<T>) -> Self {
        Self {
            value: Mutex::new(value),
            cmp,
            on_value_changed: Mutex::new(None),
            property_changed_event: Event::new(),
        }
    }

    /// Current value
    pub fn value(&self) -> Option<T> {
        self.value.lock().clone()
    }

    /// Store `value` if it differs from the current value
    pub fn set_value(&self, value: Option<T>) {
        {
            let mut current = self.value.lock();
            let changed = match (current.as_ref(), value.as_ref()) {
                (None, None) => false,
                (Some(a), Some(b)) => !(self.cmp)(b, a),
                _ => true,
            };
            if !changed {
                return;
            }
            *current = value.clone();
        }

        self.notify_property_changed(VALUE_PROPERTY);
        let callback = self.on_value_changed.lock().clone();
        if let Some(callback) = callback {
            callback(&value);
        }
    }

    /// Install the callback invoked after each change
    pub fn set_on_value_changed<F>(&self, callback: F)
    where
        F: Fn(&Option<T>) + Send + Sync + 'static,
    {
        *self.on_value_changed.lock() = Some(Arc::new(callback));
    }

    /// Remove the `on_value_changed` callback
    pub fn close(&self) {
        self.on_value_changed.lock().take();
    }
}

impl<T: Send + Sync> Observable for PropertyModel<T> {
    fn property_changed_event(&self) -> &Event<String> {
        &self.property_changed_event
    }
}
