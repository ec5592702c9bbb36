// Copyright (c) 2025 - Cowboy AI, Inc.
//! Model and Reactor Integration Tests
//!
//! User Story: As an editor binding, I need settled values evaluated off the
//! scheduler and interactive gestures consumed in order.
//!
//! Event Sequence:
//! 1. Slider moves inside a gesture (BEGIN, CHANGE..., END)
//! 2. Debounced slider value settles
//! 3. Expensive function of the settled value is evaluated on the blocking pool
//! 4. Reactor consumer observes the gesture in order

use cim_reactive::{
    DebounceStream, FuncStreamValueModel, MapStream, Observable, Scheduler, SchedulerConfig,
    SchedulerRuntime, Stream, StreamError, StreamRef, StreamResult, ValueChange, ValueChangeQueue,
    ValueChangeStream, ValueChangeStreamReactor, ValueChangeType, ValueFn, ValueStream,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

const PERIOD: Duration = Duration::from_millis(100);

fn cube_fn(value: &Option<i32>) -> Option<ValueFn<i64>> {
    value.map(|v| {
        let f: ValueFn<i64> = Arc::new(move || Some(i64::from(v).pow(3)));
        f
    })
}

fn never_equal(
) -> Arc<dyn Fn(&Option<ValueFn<i64>>, &Option<ValueFn<i64>>) -> bool + Send + Sync> {
    Arc::new(|_, _| false)
}

/// Consume one gesture and report every change seen
async fn collect_gesture(
    queue: Arc<ValueChangeQueue<i32>>,
    report: oneshot::Sender<Vec<ValueChange<i32>>>,
) -> StreamResult<()> {
    queue.begin().await?;
    let mut changes = Vec::new();
    loop {
        let change = queue.next_value_change().await?;
        let done = change.is_end();
        changes.push(change);
        if done {
            break;
        }
    }
    report
        .send(changes)
        .map_err(|_| StreamError::Closed("gesture report".to_string()))
}

#[tokio::test]
async fn test_reactor_consumes_gesture_in_order() {
    let scheduler = Scheduler::current().unwrap();
    let slider = ValueStream::new(Some(0));
    let gestures = ValueChangeStream::new(slider.clone() as StreamRef<i32>);
    let reactor = ValueChangeStreamReactor::new(gestures.clone(), &scheduler);

    let (tx, rx) = oneshot::channel();
    reactor.run(move |queue| collect_gesture(queue, tx));
    assert!(reactor.is_running());

    slider.set_value(Some(1));
    gestures.begin();
    slider.set_value(Some(2));
    slider.set_value(Some(3));
    gestures.end();

    let changes = rx.await.unwrap();
    assert_eq!(
        changes,
        vec![
            ValueChange::new(ValueChangeType::Change, Some(2)),
            ValueChange::new(ValueChangeType::Change, Some(3)),
            ValueChange::new(ValueChangeType::End, Some(3)),
        ]
    );

    tokio::task::yield_now().await;
    assert!(!reactor.is_running());
    reactor.close();
}

#[tokio::test]
async fn test_closing_reactor_cancels_consumer() {
    let scheduler = Scheduler::current().unwrap();
    let slider = ValueStream::new(Some(0));
    let gestures = ValueChangeStream::new(slider.clone() as StreamRef<i32>);
    let reactor = ValueChangeStreamReactor::new(gestures.clone(), &scheduler);

    let (tx, rx) = oneshot::channel();
    reactor.run(move |queue| collect_gesture(queue, tx));
    tokio::task::yield_now().await;

    reactor.close();
    assert!(rx.await.is_err());
    assert_eq!(gestures.value_stream().listener_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_settled_value_evaluated_off_scheduler() {
    let scheduler = Scheduler::current().unwrap();
    let slider = ValueStream::new(Some(2));
    let settled = DebounceStream::new(slider.clone() as StreamRef<i32>, PERIOD, &scheduler);
    let cube = MapStream::with_cmp(settled.clone() as StreamRef<i32>, cube_fn, never_equal());
    let model = FuncStreamValueModel::new(cube as StreamRef<ValueFn<i64>>, &scheduler);

    let notifications = Arc::new(Mutex::new(0));
    let sink = notifications.clone();
    let _listener = model
        .property_changed_event()
        .listen(move |_: &String| *sink.lock() += 1);

    model.run_until_complete().await.unwrap();
    assert_eq!(model.value(), Some(8));
    assert_eq!(model.evaluate_immediate(), Some(8));

    slider.set_value(Some(3));
    slider.set_value(Some(4));
    tokio::time::sleep(PERIOD * 2).await;
    model.run_until_complete().await.unwrap();

    assert_eq!(model.value(), Some(64));
    assert_eq!(*notifications.lock(), 2);

    model.close();
    assert!(!settled.is_pending());
}

#[test]
fn test_owned_runtime_drives_models() {
    let config = SchedulerConfig::default().with_max_blocking_threads(1);
    let runtime = SchedulerRuntime::new(config).unwrap();
    let scheduler = runtime.scheduler();

    let source = ValueStream::new(Some(Arc::new(|| Some(41 + 1)) as ValueFn<i32>));
    let model = FuncStreamValueModel::new(source.clone() as StreamRef<ValueFn<i32>>, &scheduler);
    runtime.block_on(model.run_until_complete()).unwrap();

    assert_eq!(model.value(), Some(42));
    model.close();
}
