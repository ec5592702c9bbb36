// Copyright (c) 2025 - Cowboy AI, Inc.
//! Explicit reference counts for streams owning disposable resources

use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::warn;

/// Count of explicit references taken on a stream
///
/// Streams that own a scheduled task use this to release the task
/// deterministically when the last long-lived consumer lets go.
#[derive(Debug, Default)]
pub struct RefCount {
    count: AtomicUsize,
}

impl RefCount {
    /// A count starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a reference, returning the new count
    pub fn increment(&self) -> usize {
        self.count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Release a reference
    ///
    /// Returns `true` when this call released the last reference. Releasing
    /// with no references outstanding is ignored.
    pub fn decrement(&self) -> bool {
        match self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(previous) => previous == 1,
            Err(_) => {
                warn!("remove_ref called with no outstanding references");
                false
            }
        }
    }

    /// Current number of references
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }
}
