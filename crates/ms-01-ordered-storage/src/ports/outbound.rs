//! # Outbound Ports (Driven Ports)
//!
//! The flat key-value table every container is laid out on, and the
//! checkpoint extension the execution engine needs for frame-isolated
//! rollback.

use crate::domain::errors::StorageResult;

/// The flat table every container is laid out on.
///
/// Keys are byte strings derived from container and field names; values are
/// bincode-encoded. Testing and simulation: `InMemoryKVStore`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    fn put(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Deleting an absent key is not an error.
    fn delete(&mut self, key: &[u8]) -> StorageResult<()>;

    fn exists(&self, key: &[u8]) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Handle of an open checkpoint, returned by [`TransactionalStore::checkpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CheckpointId(pub usize);

/// A key-value store with nested write frames.
///
/// Checkpoints form a stack. `commit` folds the innermost frame into its
/// parent (or makes it durable when it is the outermost), `rollback` undoes
/// every write made since the checkpoint was taken. Both must name the
/// innermost open checkpoint.
pub trait TransactionalStore: KeyValueStore {
    /// Open a new write frame.
    fn checkpoint(&mut self) -> CheckpointId;

    /// Keep the writes of the innermost frame.
    fn commit(&mut self, id: CheckpointId) -> StorageResult<()>;

    /// Undo the writes of the innermost frame.
    fn rollback(&mut self, id: CheckpointId) -> StorageResult<()>;

    /// Number of open frames.
    fn depth(&self) -> usize;
}
