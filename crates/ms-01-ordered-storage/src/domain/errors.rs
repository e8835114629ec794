//! # Domain Errors
//!
//! Error types for the ordered storage layer.
//!
//! Every variant names the container it was raised by, so a caller several
//! layers up can still tell which queue or field failed.

use shared_types::Uid;
use thiserror::Error;

/// Errors raised by the key-value substrate and the containers built on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// A queue node with this id does not exist.
    #[error("Node {id} not found in {list}")]
    NotFound { list: String, id: Uid },

    /// A queue node with this id already exists.
    #[error("Node {id} already exists in {list}")]
    DuplicateNode { list: String, id: Uid },

    /// Head or tail access on an empty queue.
    #[error("Queue {list} is empty")]
    Empty { list: String },

    /// Pagination offset past the end of the queue.
    #[error("Offset {offset} out of range for {list} (length {length})")]
    OutOfRange {
        list: String,
        offset: usize,
        length: usize,
    },

    /// Item absent from a set or array.
    #[error("Item {item} not found in {container}")]
    ItemNotFound { container: String, item: String },

    /// Array index past the current length.
    #[error("Index {index} out of bounds for {container} (length {length})")]
    IndexOutOfBounds {
        container: String,
        index: usize,
        length: usize,
    },

    /// An identifier sequence reached `u64::MAX`.
    #[error("Identifier sequence {sequence} exhausted")]
    IdOverflow { sequence: String },

    /// Commit or rollback of a checkpoint that is not the innermost one.
    #[error("Checkpoint {requested} is not the innermost (expected {innermost})")]
    CheckpointMismatch { requested: usize, innermost: usize },

    /// Commit or rollback without any open checkpoint.
    #[error("No active checkpoint")]
    NoActiveCheckpoint,

    /// Value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Stored structure is internally inconsistent.
    #[error("Corrupted {container}: {reason}")]
    Corrupted { container: String, reason: String },

    /// Backend I/O failure.
    #[error("Database error: {0}")]
    Database(String),
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type StorageResult<T> = Result<T, StorageError>;
