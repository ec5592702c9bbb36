// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for reactive stream operations

use thiserror::Error;

/// Errors that can occur while scheduling or evaluating stream work
#[derive(Debug, Error)]
pub enum StreamError {
    /// No tokio runtime is reachable from the calling context
    #[error("No scheduler available: {0}")]
    NoScheduler(String),

    /// The scheduler runtime could not be built
    #[error("Scheduler runtime error: {0}")]
    Runtime(#[from] std::io::Error),

    /// A worker evaluation failed or panicked
    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    /// The model, reactor or stream has already been closed
    #[error("Closed: {0}")]
    Closed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for reactive stream operations
pub type StreamResult<T> = Result<T, StreamError>;

impl From<tokio::runtime::TryCurrentError> for StreamError {
    fn from(err: tokio::runtime::TryCurrentError) -> Self {
        StreamError::NoScheduler(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StreamError {
    fn from(err: tokio::task::JoinError) -> Self {
        StreamError::Evaluation(err.to_string())
    }
}
