//! Error types for the queue crate

use thiserror::Error;

/// Result type for queue operations
pub type Result<T> = std::result::Result<T, QueueError>;

/// Errors that can occur when interacting with a queue
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The consumer role is already held by another thread
    #[error("consumer role is already held")]
    ConsumerBusy,
}
