// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cooperative scheduler handle
//!
//! Timed stream operators and models never talk to tokio directly. They hold a
//! [`Scheduler`], a cloneable handle that can spawn cancellable tasks, sleep,
//! push blocking work onto the executor pool and hand closures back into the
//! scheduler from foreign threads.
//!
//! ```text
//!  listener (any thread) ──call_soon_threadsafe──▶ scheduler task
//!                                                    │
//!                                                    ├─ create_task ─▶ sleep(period) ─▶ fire
//!                                                    └─ run_in_executor ─▶ blocking pool
//! ```
//!
//! Applications that do not already own a runtime can build one from a
//! [`SchedulerConfig`] with [`SchedulerRuntime`].

use std::future::Future;
use std::time::Duration;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::{RuntimeFlavor, SchedulerConfig};
use crate::errors::StreamResult;

/// Handle to the cooperative scheduler shared by timed operators and models
#[derive(Debug, Clone)]
pub struct Scheduler {
    handle: Handle,
}

impl Scheduler {
    /// Wrap an existing tokio runtime handle
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Scheduler for the runtime the caller is currently running on
    pub fn current() -> StreamResult<Self> {
        Ok(Self::new(Handle::try_current()?))
    }

    /// Spawn a cancellable task onto the scheduler
    pub fn create_task<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }

    /// Suspend the calling task for `duration`
    pub async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Run a potentially blocking function on the executor pool
    pub fn run_in_executor<F, R>(&self, f: F) -> JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.handle.spawn_blocking(f)
    }

    /// Schedule `f` to run on the scheduler; callable from any thread
    pub fn call_soon_threadsafe<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.spawn(async move { f() });
    }

    /// The underlying tokio handle
    pub fn handle(&self) -> &Handle {
        &self.handle
    }
}

/// An owned tokio runtime built from a [`SchedulerConfig`]
pub struct SchedulerRuntime {
    runtime: Runtime,
    config: SchedulerConfig,
}

impl SchedulerRuntime {
    /// Build a runtime according to `config`
    pub fn new(config: SchedulerConfig) -> StreamResult<Self> {
        config.validate()?;

        let mut builder = match config.flavor {
            RuntimeFlavor::CurrentThread => Builder::new_current_thread(),
            RuntimeFlavor::MultiThread => {
                let mut builder = Builder::new_multi_thread();
                builder.worker_threads(config.worker_threads);
                builder
            }
        };

        let runtime = builder
            .max_blocking_threads(config.max_blocking_threads)
            .thread_name(config.thread_name.clone())
            .enable_all()
            .build()?;

        info!(
            flavor = ?config.flavor,
            max_blocking_threads = config.max_blocking_threads,
            "Scheduler runtime started"
        );

        Ok(Self { runtime, config })
    }

    /// Handle to this runtime's scheduler
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(self.runtime.handle().clone())
    }

    /// Drive `future` to completion on this runtime
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// The configuration this runtime was built with
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}

impl Drop for SchedulerRuntime {
    fn drop(&mut self) {
        debug!(flavor = ?self.config.flavor, "Scheduler runtime shutting down");
    }
}
