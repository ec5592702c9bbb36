// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Synchronous Stream Operators
//!
//! Leaf and operator streams propagate synchronously, so for any sequence of
//! leaf updates the fired values and the cached values are fully determined.

use cim_reactive::{
    CombineLatestStream, EventListener, MapStream, Stream, StreamRef, ValueChangeStream,
    ValueChangeType, ValueStream,
};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Helpers
// ============================================================================

/// Collect every value a stream fires
fn record<T: Clone + Send + Sync + 'static>(
    stream: &dyn Stream<T>,
) -> (Arc<Mutex<Vec<Option<T>>>>, EventListener) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let listener = stream
        .value_stream()
        .listen(move |value: &Option<T>| sink.lock().push(value.clone()));
    (seen, listener)
}

/// Values that differ from their predecessor, starting from `initial`
fn changes<T: Clone + PartialEq>(initial: Option<T>, values: &[Option<T>]) -> Vec<Option<T>> {
    let mut current = initial;
    let mut result = Vec::new();
    for value in values {
        if *value != current {
            result.push(value.clone());
            current = value.clone();
        }
    }
    result
}

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Small domain so that repeated values are common
fn leaf_value() -> impl Strategy<Value = Option<i32>> {
    prop::option::weighted(0.9, 0i32..5)
}

fn value_sequence() -> impl Strategy<Value = Vec<Option<i32>>> {
    prop::collection::vec(leaf_value(), 0..40)
}

/// An update to one of two leaves
fn indexed_update() -> impl Strategy<Value = (usize, Option<i32>)> {
    (0usize..2, leaf_value())
}

/// Phased input for a value change stream
#[derive(Debug, Clone)]
enum Gesture {
    Begin,
    Set(Option<i32>),
    End,
}

fn gesture() -> impl Strategy<Value = Gesture> {
    prop_oneof![
        1 => Just(Gesture::Begin),
        4 => leaf_value().prop_map(Gesture::Set),
        1 => Just(Gesture::End),
    ]
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: A leaf fires exactly its distinct consecutive values
    #[test]
    fn prop_value_stream_fires_changes(initial in leaf_value(), values in value_sequence()) {
        let source = ValueStream::new(initial);
        let (seen, _listener) = record(source.as_ref());

        for value in &values {
            source.set_value(*value);
        }

        prop_assert_eq!(seen.lock().clone(), changes(initial, &values));
        let last = values.last().copied().unwrap_or(initial);
        prop_assert_eq!(source.value(), last);
    }

    /// Property: A mapped stream mirrors the mapped upstream value
    ///
    /// After every update the cached value equals `f(upstream.value())`, and
    /// the fired values are the distinct consecutive mapped values.
    #[test]
    fn prop_map_tracks_upstream(initial in leaf_value(), values in value_sequence()) {
        let parity = |value: &Option<i32>| value.map(|v| v % 2 == 0);
        let source = ValueStream::new(initial);
        let mapped = MapStream::new(source.clone() as StreamRef<i32>, parity);
        let (seen, _listener) = record(mapped.as_ref());

        for value in &values {
            source.set_value(*value);
            prop_assert_eq!(mapped.value(), parity(&source.value()));
        }

        let distinct_inputs = changes(initial, &values);
        let mapped_inputs: Vec<Option<bool>> = distinct_inputs.iter().map(parity).collect();
        prop_assert_eq!(seen.lock().clone(), changes(parity(&initial), &mapped_inputs));
    }

    /// Property: Combine-latest holds the latest value of each input
    ///
    /// It fires once per input fire, even when the combination is unchanged.
    #[test]
    fn prop_combine_latest_holds_latest(updates in prop::collection::vec(indexed_update(), 0..40)) {
        let leaves: [Arc<ValueStream<i32>>; 2] = [ValueStream::new(None), ValueStream::new(None)];
        let combined = CombineLatestStream::new(vec![
            leaves[0].clone() as StreamRef<i32>,
            leaves[1].clone() as StreamRef<i32>,
        ]);
        let (seen, _listener) = record(combined.as_ref());

        let mut expected = vec![None, None];
        let mut expected_fires = 0;
        for (index, value) in &updates {
            if expected[*index] != *value {
                expected_fires += 1;
            }
            expected[*index] = *value;
            leaves[*index].set_value(*value);
        }

        prop_assert_eq!(seen.lock().len(), expected_fires);
        prop_assert_eq!(combined.value(), Some(expected));
    }

    /// Property: Value changes are only delivered inside a gesture
    ///
    /// Every delivered BEGIN/CHANGE/END carries the upstream value at the time
    /// of the transition, and nothing is delivered while inactive.
    #[test]
    fn prop_value_changes_only_inside_gesture(gestures in prop::collection::vec(gesture(), 0..40)) {
        let source = ValueStream::new(Some(0));
        let stream = ValueChangeStream::new(source.clone() as StreamRef<i32>);
        let (seen, _listener) = record(stream.as_ref());

        let mut active = false;
        let mut expected = Vec::new();
        for gesture in &gestures {
            match gesture {
                Gesture::Begin => {
                    active = true;
                    expected.push((ValueChangeType::Begin, source.value()));
                    stream.begin();
                }
                Gesture::Set(value) => {
                    if active && *value != source.value() {
                        expected.push((ValueChangeType::Change, *value));
                    }
                    source.set_value(*value);
                }
                Gesture::End => {
                    if active {
                        expected.push((ValueChangeType::End, source.value()));
                    }
                    active = false;
                    stream.end();
                }
            }
        }

        let delivered: Vec<(ValueChangeType, Option<i32>)> = seen
            .lock()
            .iter()
            .flatten()
            .map(|change| (change.state, change.value))
            .collect();
        prop_assert_eq!(delivered, expected);
        prop_assert_eq!(stream.is_active(), active);
    }
}
