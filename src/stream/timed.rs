// Copyright (c) 2025 - Cowboy AI, Inc.
//! Timed Operators - Debounce and Sample
//!
//! Both operators interpose the scheduler between an upstream fire and the
//! downstream fire. They differ in what triggers the downstream fire:
//!
//! ## Debounce (event-triggered)
//!
//! The first upstream change after a quiet period schedules one delayed fire.
//! Further changes only update the stashed value. When the delay elapses the
//! most recent stashed value is fired. A change stashed while that fire is
//! being delivered schedules one more period.
//!
//! ```text
//! upstream:  ●●●  ●           ●
//! delay:     |──P──|          |──P──|
//! fires:           ●                ●
//! ```
//!
//! ## Sample (clock-triggered)
//!
//! A loop wakes every period and fires the pending value if anything changed
//! since the previous wake.
//!
//! ```text
//! upstream:   ●  ●        ●
//! ticks:    |──P──|──P──|──P──|
//! fires:          ●           ●
//! ```
//!
//! # Teardown
//!
//! The scheduled task never holds the operator itself, only its outgoing event
//! and value holder. Dropping the operator, calling `close()`, or releasing the
//! last reference taken with `add_ref` cancels the task; nothing fires after
//! teardown. Cancelling the sample loop is terminal.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::debug;

use super::event::{Event, EventListener};
use super::refcount::RefCount;
use super::task::StreamTask;
use super::{Stream, StreamRef};
use crate::scheduler::Scheduler;

#[derive(Debug)]
struct DebounceValue<T> {
    value: Option<T>,
    sequence: u64,
    scheduled: bool,
    closed: bool,
}

/// Stream firing the latest upstream value once per quiet period
pub struct DebounceStream<T> {
    upstream: StreamRef<T>,
    period: Duration,
    scheduler: Scheduler,
    holder: Arc<Mutex<DebounceValue<T>>>,
    value_stream: Event<Option<T>>,
    task: StreamTask,
    refs: RefCount,
    listener: Mutex<Option<EventListener>>,
}

impl<T: Clone + Send + Sync + 'static> DebounceStream<T> {
    /// Debounce `upstream` with a fixed `period`
    pub fn new(upstream: StreamRef<T>, period: Duration, scheduler: &Scheduler) -> Arc<Self> {
        let stream = Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let listener = upstream.value_stream().listen(move |value: &Option<T>| {
                if let Some(stream) = weak.upgrade() {
                    stream.value_changed(value);
                }
            });

            let holder = DebounceValue {
                value: None,
                sequence: 0,
                scheduled: false,
                closed: false,
            };

            Self {
                upstream,
                period,
                scheduler: scheduler.clone(),
                holder: Arc::new(Mutex::new(holder)),
                value_stream: Event::new(),
                task: StreamTask::new(scheduler.clone()),
                refs: RefCount::new(),
                listener: Mutex::new(Some(listener)),
            }
        });

        stream.value_changed(&stream.upstream.value());
        stream
    }

    fn value_changed(&self, value: &Option<T>) {
        let mut holder = self.holder.lock();
        if holder.closed {
            return;
        }

        holder.value = value.clone();
        holder.sequence += 1;
        if holder.scheduled {
            return;
        }
        holder.scheduled = true;

        // A finished delay task may still occupy the slot until its future
        // returns; it has already released `scheduled`, so drop it.
        self.task.clear();

        let scheduler = self.scheduler.clone();
        let period = self.period;
        let shared = Arc::clone(&self.holder);
        let value_stream = self.value_stream.clone();
        self.task.create_task(async move {
            loop {
                scheduler.sleep(period).await;
                let (value, sequence) = {
                    let holder = shared.lock();
                    if holder.closed {
                        return;
                    }
                    (holder.value.clone(), holder.sequence)
                };

                value_stream.fire(&value);

                // Changes stashed during the fire start another quiet period.
                let mut holder = shared.lock();
                if holder.closed || holder.sequence == sequence {
                    holder.scheduled = false;
                    return;
                }
            }
        });
    }

    /// Whether a delayed fire is pending
    pub fn is_pending(&self) -> bool {
        self.holder.lock().scheduled
    }

    /// Cancel any pending fire and stop listening to the upstream
    pub fn close(&self) {
        {
            let mut holder = self.holder.lock();
            if holder.closed {
                return;
            }
            holder.closed = true;
            holder.scheduled = false;
        }
        self.task.clear();
        self.listener.lock().take();
        debug!(period_ms = self.period.as_millis() as u64, "Debounce stream closed");
    }
}

impl<T: Clone + Send + Sync + 'static> Stream<T> for DebounceStream<T> {
    fn value(&self) -> Option<T> {
        self.holder.lock().value.clone()
    }

    fn value_stream(&self) -> &Event<Option<T>> {
        &self.value_stream
    }

    fn add_ref(&self) {
        self.refs.increment();
        self.upstream.add_ref();
    }

    fn remove_ref(&self) {
        self.upstream.remove_ref();
        if self.refs.decrement() {
            self.close();
        }
    }
}

#[derive(Debug)]
struct SampleValue<T> {
    value: Option<T>,
    pending_value: Option<T>,
    is_dirty: bool,
}

/// Stream firing the latest upstream value on a fixed cadence, when changed
pub struct SampleStream<T> {
    upstream: StreamRef<T>,
    period: Duration,
    sample: Arc<Mutex<SampleValue<T>>>,
    value_stream: Event<Option<T>>,
    task: StreamTask,
    refs: RefCount,
    listener: Mutex<Option<EventListener>>,
}

impl<T: Clone + Send + Sync + 'static> SampleStream<T> {
    /// Sample `upstream` every `period`
    pub fn new(upstream: StreamRef<T>, period: Duration, scheduler: &Scheduler) -> Arc<Self> {
        let stream = Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let listener = upstream.value_stream().listen(move |value: &Option<T>| {
                if let Some(stream) = weak.upgrade() {
                    stream.value_changed(value);
                }
            });

            let sample = SampleValue {
                value: upstream.value(),
                pending_value: None,
                is_dirty: false,
            };

            Self {
                upstream,
                period,
                sample: Arc::new(Mutex::new(sample)),
                value_stream: Event::new(),
                task: StreamTask::new(scheduler.clone()),
                refs: RefCount::new(),
                listener: Mutex::new(Some(listener)),
            }
        });

        let loop_scheduler = scheduler.clone();
        let sample = Arc::clone(&stream.sample);
        let value_stream = stream.value_stream.clone();
        stream.task.create_task(async move {
            loop {
                loop_scheduler.sleep(period).await;
                let fired = {
                    let mut sample = sample.lock();
                    if sample.is_dirty {
                        sample.value = sample.pending_value.take();
                        sample.is_dirty = false;
                        Some(sample.value.clone())
                    } else {
                        None
                    }
                };
                if let Some(value) = fired {
                    value_stream.fire(&value);
                }
            }
        });

        stream
    }

    fn value_changed(&self, value: &Option<T>) {
        let mut sample = self.sample.lock();
        sample.pending_value = value.clone();
        sample.is_dirty = true;
    }

    /// Whether the sampling loop is still running
    pub fn is_running(&self) -> bool {
        self.task.is_active()
    }

    /// Stop the sampling loop permanently and stop listening to the upstream
    pub fn close(&self) {
        self.task.clear();
        if self.listener.lock().take().is_some() {
            debug!(period_ms = self.period.as_millis() as u64, "Sample stream closed");
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Stream<T> for SampleStream<T> {
    fn value(&self) -> Option<T> {
        self.sample.lock().value.clone()
    }

    fn value_stream(&self) -> &Event<Option<T>> {
        &self.value_stream
    }

    fn add_ref(&self) {
        self.refs.increment();
        self.upstream.add_ref();
    }

    fn remove_ref(&self) {
        self.upstream.remove_ref();
        if self.refs.decrement() {
            self.close();
        }
    }
}
