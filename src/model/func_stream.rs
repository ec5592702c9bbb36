// Copyright (c) 2025 - Cowboy AI, Inc.
//! FuncStreamValueModel - asynchronous evaluation of a stream of functions
//!
//! The upstream stream delivers zero-argument functions that may be expensive
//! or blocking. Each delivered function is evaluated on the scheduler's
//! blocking pool and its result lands in the model's `value`.
//!
//! ```text
//!  stream fires fn ──call_soon_threadsafe──▶ handle_value_func
//!                                               │ abort previous evaluation
//!                                               │ generation += 1
//!                                               ▼
//!                                        evaluation task ──run_in_executor──▶ fn()
//!                                               │
//!                                               ▼
//!                         generation still current? ──yes──▶ model.set_value(result)
//! ```
//!
//! A function arriving while an evaluation is in flight supersedes it: the
//! old task is cancelled and, should its worker call still finish, the
//! generation check keeps its result from landing.

use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, trace, warn};

use super::PropertyModel;
use crate::errors::{StreamError, StreamResult};
use crate::scheduler::Scheduler;
use crate::stream::{structural_eq, EqualityFn, Event, EventListener, Observable, StreamRef};

/// A zero-argument function producing a model value
pub type ValueFn<T> = Arc<dyn Fn() -> Option<T> + Send + Sync>;

struct FuncState<T> {
    stream: Option<StreamRef<ValueFn<T>>>,
    listener: Option<EventListener>,
    task: Option<AbortHandle>,
    task_to_complete: Option<JoinHandle<StreamResult<()>>>,
    generation: u64,
    closed: bool,
}

struct FuncInner<T> {
    model: Arc<PropertyModel<T>>,
    scheduler: Scheduler,
    state: Mutex<FuncState<T>>,
    // Shared by every running worker call; close takes it exclusively.
    task_lock: Arc<RwLock<()>>,
    // Serializes the generation check with the value assignment.
    landing: Mutex<()>,
}

impl<T: Clone + Send + Sync + 'static> FuncInner<T> {
    fn handle_value_func(self: &Arc<Self>, value_func: Option<ValueFn<T>>) {
        let (previous, generation) = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.generation += 1;
            (state.task.take(), state.generation)
        };

        if let Some(previous) = previous {
            previous.abort();
            trace!(generation, "Superseded in-flight evaluation");
        }

        let Some(value_func) = value_func else {
            return;
        };

        let inner = Arc::downgrade(self);
        let scheduler = self.scheduler.clone();
        let task_lock = Arc::clone(&self.task_lock);
        let handle = self.scheduler.create_task(async move {
            let result = scheduler
                .run_in_executor(move || {
                    let _guard = task_lock.read();
                    value_func()
                })
                .await;

            match result {
                Ok(value) => {
                    Self::land(&inner, generation, value);
                    Ok(())
                }
                Err(e) if e.is_cancelled() => Ok(()),
                Err(e) => {
                    let error = StreamError::from(e);
                    warn!(generation, error = %error, "Value function evaluation failed");
                    Err(error)
                }
            }
        });

        let mut state = self.state.lock();
        if state.closed || state.generation != generation {
            handle.abort();
            return;
        }
        state.task = Some(handle.abort_handle());
        state.task_to_complete = Some(handle);
        trace!(generation, "Evaluation scheduled");
    }

    fn land(inner: &Weak<Self>, generation: u64, value: Option<T>) {
        let Some(inner) = inner.upgrade() else {
            return;
        };

        let _landing = inner.landing.lock();
        {
            let mut state = inner.state.lock();
            if state.closed || state.generation != generation {
                trace!(generation, "Discarded stale evaluation result");
                return;
            }
            state.task = None;
        }
        inner.model.set_value(value);
    }
}

/// Observable property holding the result of the latest delivered function
pub struct FuncStreamValueModel<T> {
    inner: Arc<FuncInner<T>>,
}

impl<T: Clone + PartialEq + Send + Sync + 'static> FuncStreamValueModel<T> {
    /// Evaluate every function `stream` delivers, comparing results structurally
    pub fn new(stream: StreamRef<ValueFn<T>>, scheduler: &Scheduler) -> Self {
        Self::with_cmp(stream, scheduler, structural_eq())
    }
}

impl<T: Clone + Send + Sync + 'static> FuncStreamValueModel<T> {
    /// Evaluate every function `stream` delivers, using `cmp` on results
    pub fn with_cmp(
        stream: StreamRef<ValueFn<T>>,
        scheduler: &Scheduler,
        cmp: EqualityFn<T>,
    ) -> Self {
        stream.add_ref();

        let inner = Arc::new(FuncInner {
            model: Arc::new(PropertyModel::with_cmp(None, cmp)),
            scheduler: scheduler.clone(),
            state: Mutex::new(FuncState {
                stream: Some(stream.clone()),
                listener: None,
                task: None,
                task_to_complete: None,
                generation: 0,
                closed: false,
            }),
            task_lock: Arc::new(RwLock::new(())),
            landing: Mutex::new(()),
        });

        let weak = Arc::downgrade(&inner);
        let listener = stream
            .value_stream()
            .listen(move |value_func: &Option<ValueFn<T>>| {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let value_func = value_func.clone();
                let weak = Arc::downgrade(&inner);
                inner.scheduler.call_soon_threadsafe(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.handle_value_func(value_func);
                    }
                });
            });
        inner.state.lock().listener = Some(listener);

        inner.handle_value_func(stream.value());
        Self { inner }
    }

    /// Current value
    pub fn value(&self) -> Option<T> {
        self.inner.model.value()
    }

    /// The underlying property model
    pub fn property_model(&self) -> &Arc<PropertyModel<T>> {
        &self.inner.model
    }

    /// Whether an evaluation is scheduled or running
    pub fn is_evaluating(&self) -> bool {
        self.inner
            .state
            .lock()
            .task_to_complete
            .as_ref()
            .map_or(false, |task| !task.is_finished())
    }

    /// Wait until no evaluation is pending
    ///
    /// Lets functions handed to the scheduler by the stream listener get
    /// scheduled, then waits for each evaluation in turn. A cancelled
    /// evaluation counts as complete; a failed one is returned as
    /// [`StreamError::Evaluation`].
    pub async fn run_until_complete(&self) -> StreamResult<()> {
        loop {
            tokio::task::yield_now().await;

            let task = self.inner.state.lock().task_to_complete.take();
            let Some(task) = task else {
                return Ok(());
            };

            match task.await {
                Ok(result) => result?,
                Err(e) if e.is_cancelled() => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Call the current function on the calling thread
    ///
    /// Bypasses the scheduler and leaves `value` untouched.
    pub fn evaluate_immediate(&self) -> Option<T> {
        let stream = self.inner.state.lock().stream.clone();
        stream
            .and_then(|stream| stream.value())
            .and_then(|value_func| value_func())
    }

    /// Stop evaluating and release the upstream
    ///
    /// Cancels the in-flight evaluation and blocks until any worker call that
    /// already started has returned.
    pub fn close(&self) {
        let (listener, stream, task) = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.generation += 1;
            (state.listener.take(), state.stream.take(), state.task.take())
        };

        drop(listener);
        if let Some(stream) = stream {
            stream.remove_ref();
        }
        if let Some(task) = task {
            task.abort();
        }
        drop(self.inner.task_lock.write());

        self.inner.model.close();
        debug!("Function stream value model closed");
    }
}

impl<T> Drop for FuncStreamValueModel<T> {
    fn drop(&mut self) {
        let (listener, stream, task) = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            (state.listener.take(), state.stream.take(), state.task.take())
        };

        drop(listener);
        if let Some(stream) = stream {
            stream.remove_ref();
        }
        if let Some(task) = task {
            task.abort();
        }
    }
}

impl<T: Send + Sync> Observable for FuncStreamValueModel<T> {
    fn property_changed_event(&self) -> &Event<String> {
        self.inner.model.property_changed_event()
    }
}
