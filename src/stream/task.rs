// Copyright (c) 2025 - Cowboy AI, Inc.
//! StreamTask - at most one in-flight task per owner
//!
//! Timed operators schedule their delayed work through a [`StreamTask`]. The
//! task slot holds at most one cancellable task; scheduling while a task is
//! active is a usage error.
//!
//! ```text
//!            create_task              completes / cancelled
//!  idle ───────────────────▶ active ───────────────────────▶ idle
//!                              │
//!                              └──── clear() ──────────────▶ idle
//! ```
//!
//! Completion clears the slot from inside the task, guarded by a generation
//! number so that a task cancelled by `clear()` can never clear the slot of
//! the task that replaced it.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::{Arc, Weak};
use tokio::task::AbortHandle;
use tracing::trace;

use crate::scheduler::Scheduler;

#[derive(Debug, Default)]
struct TaskSlot {
    generation: u64,
    active: bool,
    handle: Option<AbortHandle>,
}

/// Clears the owning slot when the task future completes or is dropped
struct CompletionGuard {
    slot: Weak<Mutex<TaskSlot>>,
    generation: u64,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.upgrade() {
            let mut slot = slot.lock();
            if slot.generation == self.generation {
                slot.active = false;
                slot.handle = None;
                trace!(generation = self.generation, "Stream task finished");
            }
        }
    }
}

/// Slot owning at most one scheduled unit of asynchronous work
#[derive(Debug)]
pub struct StreamTask {
    scheduler: Scheduler,
    slot: Arc<Mutex<TaskSlot>>,
}

impl StreamTask {
    /// Create an idle task slot on `scheduler`
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            slot: Arc::new(Mutex::new(TaskSlot::default())),
        }
    }

    /// Whether a task is currently held
    pub fn is_active(&self) -> bool {
        self.slot.lock().active
    }

    /// Schedule `future` as the slot's task
    ///
    /// # Panics
    ///
    /// Panics if a task is already active.
    pub fn create_task<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = {
            let mut slot = self.slot.lock();
            assert!(!slot.active, "stream task already active");
            slot.generation += 1;
            slot.active = true;
            slot.generation
        };

        let guard = CompletionGuard {
            slot: Arc::downgrade(&self.slot),
            generation,
        };
        let handle = self.scheduler.create_task(async move {
            let _guard = guard;
            future.await;
        });

        let mut slot = self.slot.lock();
        if slot.active && slot.generation == generation {
            slot.handle = Some(handle.abort_handle());
        }
        trace!(generation, "Stream task scheduled");
    }

    /// Request cancellation of the active task and release the slot
    ///
    /// Does not wait for the task to observe the cancellation.
    pub fn clear(&self) {
        let handle = {
            let mut slot = self.slot.lock();
            slot.active = false;
            slot.handle.take()
        };

        if let Some(handle) = handle {
            trace!("Stream task cancelled");
            handle.abort();
        }
    }
}

impl Drop for StreamTask {
    fn drop(&mut self) {
        self.clear();
    }
}
