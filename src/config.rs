// Copyright (c) 2025 - Cowboy AI, Inc.
//! Scheduler configuration

use serde::{Deserialize, Serialize};

use crate::errors::{StreamError, StreamResult};

/// Environment variable selecting the runtime flavor (`current_thread` or `multi_thread`)
pub const ENV_FLAVOR: &str = "CIM_REACTIVE_FLAVOR";
/// Environment variable for the number of worker threads (multi-thread flavor only)
pub const ENV_WORKER_THREADS: &str = "CIM_REACTIVE_WORKER_THREADS";
/// Environment variable for the size of the blocking executor pool
pub const ENV_MAX_BLOCKING_THREADS: &str = "CIM_REACTIVE_MAX_BLOCKING_THREADS";
/// Environment variable for the runtime thread name
pub const ENV_THREAD_NAME: &str = "CIM_REACTIVE_THREAD_NAME";

/// Which tokio runtime drives the cooperative scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeFlavor {
    /// Single logical main context; all stream delivery happens on one thread
    CurrentThread,
    /// Work-stealing pool of worker threads
    MultiThread,
}

impl std::str::FromStr for RuntimeFlavor {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "current_thread" | "current" => Ok(RuntimeFlavor::CurrentThread),
            "multi_thread" | "multi" => Ok(RuntimeFlavor::MultiThread),
            other => Err(StreamError::Configuration(format!(
                "unknown runtime flavor: {}",
                other
            ))),
        }
    }
}

/// Configuration for a [`SchedulerRuntime`](crate::scheduler::SchedulerRuntime)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Runtime flavor
    pub flavor: RuntimeFlavor,
    /// Worker threads (ignored for the current-thread flavor)
    pub worker_threads: usize,
    /// Upper bound on the blocking pool used for function evaluation
    pub max_blocking_threads: usize,
    /// Name given to runtime threads
    pub thread_name: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            flavor: RuntimeFlavor::CurrentThread,
            worker_threads: 2,
            max_blocking_threads: 4,
            thread_name: "cim-reactive".to_string(),
        }
    }
}

impl SchedulerConfig {
    /// Set the runtime flavor
    pub fn with_flavor(mut self, flavor: RuntimeFlavor) -> Self {
        self.flavor = flavor;
        self
    }

    /// Set the number of worker threads
    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }

    /// Set the blocking pool size
    pub fn with_max_blocking_threads(mut self, max_blocking_threads: usize) -> Self {
        self.max_blocking_threads = max_blocking_threads;
        self
    }

    /// Set the runtime thread name
    pub fn with_thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }

    /// Load configuration from `CIM_REACTIVE_*` environment variables,
    /// falling back to defaults for anything unset
    pub fn from_env() -> StreamResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> StreamResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(flavor) = lookup(ENV_FLAVOR) {
            config.flavor = flavor.parse()?;
        }
        if let Some(threads) = lookup(ENV_WORKER_THREADS) {
            config.worker_threads = parse_count(ENV_WORKER_THREADS, &threads)?;
        }
        if let Some(threads) = lookup(ENV_MAX_BLOCKING_THREADS) {
            config.max_blocking_threads = parse_count(ENV_MAX_BLOCKING_THREADS, &threads)?;
        }
        if let Some(name) = lookup(ENV_THREAD_NAME) {
            config.thread_name = name;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the runtime builder cannot honour
    pub fn validate(&self) -> StreamResult<()> {
        if self.worker_threads == 0 {
            return Err(StreamError::Configuration(
                "worker_threads must be greater than zero".to_string(),
            ));
        }
        if self.max_blocking_threads == 0 {
            return Err(StreamError::Configuration(
                "max_blocking_threads must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_count(key: &str, value: &str) -> StreamResult<usize> {
    value
        .trim()
        .parse()
        .map_err(|e| StreamError::Configuration(format!("{}={}: {}", key, value, e)))
}
