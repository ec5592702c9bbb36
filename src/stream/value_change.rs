// Copyright (c) 2025 - Cowboy AI, Inc.
//! Value Changes - begin/change/end transitions
//!
//! A [`ValueChangeStream`] turns an ordinary stream into a phased stream of
//! [`ValueChange`] events. Output only flows between an explicit `begin()` and
//! the following `end()`, which makes it suitable for interactive edits (a
//! drag, a slider) where the consumer wants to know where a gesture starts and
//! stops.
//!
//! # State Machine
//!
//! ```text
//!              begin() ─▶ BEGIN(v)
//!   INACTIVE ──────────────────────▶ ACTIVE ◀─┐
//!      ▲                               │      │ upstream change ─▶ CHANGE(v)
//!      │          end() ─▶ END(v)      │      │
//!      └───────────────────────────────┘──────┘
//! ```
//!
//! While inactive, nothing is delivered; the attempt is dropped silently.
//!
//! # Reactor
//!
//! A [`ValueChangeStreamReactor`] buffers every delivered change in an
//! unbounded FIFO queue and lets a consumer coroutine await them in order
//! through a [`ValueChangeQueue`]:
//!
//! ```rust,ignore
//! let reactor = ValueChangeStreamReactor::new(changes.clone(), &scheduler);
//! reactor.run(|queue| async move {
//!     queue.begin().await?;
//!     loop {
//!         let change = queue.next_value_change().await?;
//!         if change.is_end() {
//!             break;
//!         }
//!     }
//!     Ok(())
//! });
//! ```

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::event::{Event, EventListener};
use super::value::ValueStream;
use super::{Stream, StreamRef};
use crate::errors::{StreamError, StreamResult};
use crate::scheduler::Scheduler;

/// Phase of a value change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueChangeType {
    /// A gesture started
    Begin,
    /// The value changed during a gesture
    Change,
    /// The gesture finished
    End,
}

/// A value tagged with the phase it was produced in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueChange<T> {
    /// Phase
    pub state: ValueChangeType,
    /// Upstream value at the time of the transition
    pub value: Option<T>,
}

impl<T> ValueChange<T> {
    /// Create a value change
    pub fn new(state: ValueChangeType, value: Option<T>) -> Self {
        Self { state, value }
    }

    /// Whether this is a BEGIN transition
    pub fn is_begin(&self) -> bool {
        self.state == ValueChangeType::Begin
    }

    /// Whether this is an END transition
    pub fn is_end(&self) -> bool {
        self.state == ValueChangeType::End
    }
}

/// Stream of begin/change/end transitions of an upstream stream
pub struct ValueChangeStream<T> {
    upstream: StreamRef<T>,
    changes: Arc<ValueStream<ValueChange<T>>>,
    active: Arc<AtomicBool>,
    _listener: EventListener,
}

impl<T: Clone + Send + Sync + 'static> ValueChangeStream<T> {
    /// Track transitions of `upstream`
    pub fn new(upstream: StreamRef<T>) -> Arc<Self> {
        let active = Arc::new(AtomicBool::new(false));
        let gate = Arc::clone(&active);
        let changes = ValueStream::with_gate(None, move |_: &Option<ValueChange<T>>| {
            gate.load(Ordering::Acquire)
        });

        Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let listener = upstream.value_stream().listen(move |_: &Option<T>| {
                if let Some(stream) = weak.upgrade() {
                    stream.value_changed();
                }
            });

            Self {
                upstream,
                changes,
                active,
                _listener: listener,
            }
        })
    }

    /// Start delivering: emits BEGIN with the current upstream value
    pub fn begin(&self) {
        self.active.store(true, Ordering::Release);
        self.send(ValueChangeType::Begin);
    }

    /// Emit END with the current upstream value, then stop delivering
    pub fn end(&self) {
        self.send(ValueChangeType::End);
        self.active.store(false, Ordering::Release);
    }

    /// Whether transitions are currently delivered
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn value_changed(&self) {
        self.send(ValueChangeType::Change);
    }

    fn send(&self, state: ValueChangeType) {
        self.changes
            .send_value(Some(ValueChange::new(state, self.upstream.value())));
    }
}

impl<T: Clone + Send + Sync + 'static> Stream<ValueChange<T>> for ValueChangeStream<T> {
    fn value(&self) -> Option<ValueChange<T>> {
        self.changes.value()
    }

    fn value_stream(&self) -> &Event<Option<ValueChange<T>>> {
        self.changes.value_stream()
    }

    fn add_ref(&self) {
        self.upstream.add_ref();
    }

    fn remove_ref(&self) {
        self.upstream.remove_ref();
    }
}

/// FIFO of buffered changes handed to a reactor's consumer
///
/// Holding the queue does not keep the reactor alive. Once the reactor is
/// closed or dropped the queue drains and then reports
/// [`StreamError::Closed`].
pub struct ValueChangeQueue<T> {
    receiver: tokio::sync::Mutex<UnboundedReceiver<ValueChange<T>>>,
}

impl<T> ValueChangeQueue<T> {
    /// Discard queued changes until a BEGIN is dequeued
    pub async fn begin(&self) -> StreamResult<()> {
        loop {
            if self.next_value_change().await?.is_begin() {
                return Ok(());
            }
        }
    }

    /// Dequeue the next change, waiting until one is available
    pub async fn next_value_change(&self) -> StreamResult<ValueChange<T>> {
        self.receiver
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| StreamError::Closed("value change reactor".to_string()))
    }
}

/// Ordered consumer of a [`ValueChangeStream`]
///
/// The consumer task started by [`run`](Self::run) only sees the reactor's
/// [`ValueChangeQueue`]. Closing or dropping the reactor cancels it.
pub struct ValueChangeStreamReactor<T> {
    stream: Arc<ValueChangeStream<T>>,
    scheduler: Scheduler,
    queue: Arc<ValueChangeQueue<T>>,
    listener: Mutex<Option<EventListener>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Clone + Send + Sync + 'static> ValueChangeStreamReactor<T> {
    /// Start buffering every change delivered by `stream`
    pub fn new(stream: Arc<ValueChangeStream<T>>, scheduler: &Scheduler) -> Arc<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let listener = stream
            .value_stream()
            .listen(move |change: &Option<ValueChange<T>>| {
                if let Some(change) = change {
                    if sender.send(change.clone()).is_err() {
                        warn!("Value change dropped, reactor queue closed");
                    }
                }
            });

        Arc::new(Self {
            stream,
            scheduler: scheduler.clone(),
            queue: Arc::new(ValueChangeQueue {
                receiver: tokio::sync::Mutex::new(receiver),
            }),
            listener: Mutex::new(Some(listener)),
            task: Mutex::new(None),
        })
    }

    /// The observed stream
    pub fn stream(&self) -> &Arc<ValueChangeStream<T>> {
        &self.stream
    }

    /// Spawn the consumer coroutine produced by `f`
    ///
    /// # Panics
    ///
    /// Panics if the reactor is already running.
    pub fn run<F, Fut>(&self, f: F)
    where
        F: FnOnce(Arc<ValueChangeQueue<T>>) -> Fut,
        Fut: Future<Output = StreamResult<()>> + Send + 'static,
    {
        let future = f(Arc::clone(&self.queue));

        let mut task = self.task.lock();
        assert!(task.is_none(), "value change reactor already running");
        *task = Some(self.scheduler.create_task(async move {
            match future.await {
                Ok(()) => debug!("Value change reactor finished"),
                Err(StreamError::Closed(reason)) => debug!(%reason, "Value change reactor closed"),
                Err(e) => warn!(error = %e, "Value change reactor failed"),
            }
        }));
    }

    /// Discard queued changes until a BEGIN is dequeued
    pub async fn begin(&self) -> StreamResult<()> {
        self.queue.begin().await
    }

    /// Dequeue the next change, waiting until one is available
    ///
    /// Returns [`StreamError::Closed`] once the reactor is closed and the
    /// queue is drained.
    pub async fn next_value_change(&self) -> StreamResult<ValueChange<T>> {
        self.queue.next_value_change().await
    }

    /// Whether the consumer coroutine is still running
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .map_or(false, |task| !task.is_finished())
    }

    /// Stop buffering and cancel the consumer coroutine
    pub fn close(&self) {
        self.listener.lock().take();
        if let Some(task) = self.task.lock().take() {
            task.abort();
            debug!("Value change reactor cancelled");
        }
    }
}

impl<T> Drop for ValueChangeStreamReactor<T> {
    fn drop(&mut self) {
        self.listener.get_mut().take();
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}
