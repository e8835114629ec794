//! Port definitions for the ordered storage layer.

pub mod outbound;

pub use outbound::{CheckpointId, KeyValueStore, TransactionalStore};
