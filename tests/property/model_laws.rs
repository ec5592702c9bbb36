// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Models
//!
//! Models are terminal consumers; they must never lag behind the stream they
//! mirror and must announce exactly the changes they store.

use cim_reactive::{
    MapStream, Observable, PropertyModel, Stream, StreamRef, StreamValueModel, ValueStream,
};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Property Test Strategies
// ============================================================================

fn model_value() -> impl Strategy<Value = Option<u8>> {
    prop::option::of(0u8..4)
}

fn model_values() -> impl Strategy<Value = Vec<Option<u8>>> {
    prop::collection::vec(model_value(), 0..40)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: A stream value model never lags its upstream
    ///
    /// Immediately after any upstream fire the model holds the upstream value.
    #[test]
    fn prop_stream_value_model_mirrors_upstream(
        initial in model_value(),
        values in model_values(),
    ) {
        let source = ValueStream::new(initial);
        let halved =
            MapStream::new(source.clone() as StreamRef<u8>, |v: &Option<u8>| v.map(|v| v / 2));
        let model = StreamValueModel::new(halved.clone() as StreamRef<u8>);
        prop_assert_eq!(model.value(), halved.value());

        for value in &values {
            source.set_value(*value);
            prop_assert_eq!(model.value(), halved.value());
        }
    }

    /// Property: A property model announces exactly the values it stores
    ///
    /// Each announcement is followed by the callback with the same value, and
    /// the number of announcements equals the number of transitions.
    #[test]
    fn prop_property_model_announces_transitions(
        initial in model_value(),
        values in model_values(),
    ) {
        let model = Arc::new(PropertyModel::new(initial));
        let announced = Arc::new(Mutex::new(Vec::new()));
        let callbacks = Arc::new(Mutex::new(Vec::new()));

        let weak = Arc::downgrade(&model);
        let sink = announced.clone();
        let _listener = model.property_changed_event().listen(move |_: &String| {
            if let Some(model) = weak.upgrade() {
                sink.lock().push(model.value());
            }
        });
        let sink = callbacks.clone();
        model.set_on_value_changed(move |value: &Option<u8>| sink.lock().push(*value));

        let mut current = initial;
        let mut transitions = Vec::new();
        for value in &values {
            if *value != current {
                transitions.push(*value);
                current = *value;
            }
            model.set_value(*value);
        }

        prop_assert_eq!(announced.lock().clone(), transitions.clone());
        prop_assert_eq!(callbacks.lock().clone(), transitions);
        prop_assert_eq!(model.value(), current);
    }
}
