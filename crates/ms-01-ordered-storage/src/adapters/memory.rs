use crate::domain::errors::{StorageError, StorageResult};
use crate::ports::outbound::{CheckpointId, KeyValueStore, TransactionalStore};
use std::collections::BTreeMap;
use tracing::trace;

/// Undo record: the key and the value it held before the write.
type JournalEntry = (Vec<u8>, Option<Vec<u8>>);

/// In-memory key-value store with a checkpoint journal.
///
/// While a checkpoint is open, every write pushes the previous value of its
/// key onto the innermost frame; rolling back replays that frame in reverse.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    frames: Vec<Vec<JournalEntry>>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn record(&mut self, key: &[u8]) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push((key.to_vec(), self.data.get(key).cloned()));
        }
    }

    fn check_innermost(&self, id: CheckpointId) -> StorageResult<()> {
        let innermost = match self.frames.len() {
            0 => return Err(StorageError::NoActiveCheckpoint),
            n => n - 1,
        };
        if id.0 != innermost {
            return Err(StorageError::CheckpointMismatch {
                requested: id.0,
                innermost,
            });
        }
        Ok(())
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.record(key);
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StorageResult<()> {
        if self.data.contains_key(key) {
            self.record(key);
            self.data.remove(key);
        }
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> StorageResult<bool> {
        Ok(self.data.contains_key(key))
    }
}

impl TransactionalStore for InMemoryKVStore {
    fn checkpoint(&mut self) -> CheckpointId {
        self.frames.push(Vec::new());
        let id = CheckpointId(self.frames.len() - 1);
        trace!(checkpoint = id.0, "Checkpoint opened");
        id
    }

    fn commit(&mut self, id: CheckpointId) -> StorageResult<()> {
        self.check_innermost(id)?;
        let frame = self.frames.pop().unwrap_or_default();
        if let Some(parent) = self.frames.last_mut() {
            parent.extend(frame);
        }
        trace!(checkpoint = id.0, "Checkpoint committed");
        Ok(())
    }

    fn rollback(&mut self, id: CheckpointId) -> StorageResult<()> {
        self.check_innermost(id)?;
        let frame = self.frames.pop().unwrap_or_default();
        let undone = frame.len();
        for (key, previous) in frame.into_iter().rev() {
            match previous {
                Some(value) => {
                    self.data.insert(key, value);
                }
                None => {
                    self.data.remove(&key);
                }
            }
        }
        trace!(checkpoint = id.0, undone, "Checkpoint rolled back");
        Ok(())
    }

    fn depth(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_kv_store() {
        let mut store = InMemoryKVStore::new();

        store.put(b"key1", b"value1").unwrap();
        store.put(b"key2", b"value2").unwrap();

        assert_eq!(store.get(b"key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(store.get(b"key3").unwrap(), None);
        assert!(store.exists(b"key1").unwrap());
        assert!(!store.exists(b"key3").unwrap());

        store.delete(b"key1").unwrap();
        assert!(!store.exists(b"key1").unwrap());
        store.delete(b"missing").unwrap();
    }

    #[test]
    fn test_rollback_restores_previous_values() {
        let mut store = InMemoryKVStore::new();
        store.put(b"a", b"1").unwrap();

        let cp = store.checkpoint();
        store.put(b"a", b"2").unwrap();
        store.put(b"a", b"3").unwrap();
        store.put(b"b", b"new").unwrap();
        store.delete(b"a").unwrap();
        store.rollback(cp).unwrap();

        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"b").unwrap(), None);
        assert_eq!(store.depth(), 0);
    }

    #[test]
    fn test_nested_rollback_keeps_outer_writes() {
        let mut store = InMemoryKVStore::new();

        let outer = store.checkpoint();
        store.put(b"outer", b"kept").unwrap();

        let inner = store.checkpoint();
        store.put(b"inner", b"dropped").unwrap();
        store.put(b"outer", b"overwritten").unwrap();
        store.rollback(inner).unwrap();

        store.commit(outer).unwrap();
        assert_eq!(store.get(b"outer").unwrap(), Some(b"kept".to_vec()));
        assert_eq!(store.get(b"inner").unwrap(), None);
    }

    #[test]
    fn test_committed_inner_frame_rolls_back_with_outer() {
        let mut store = InMemoryKVStore::new();

        let outer = store.checkpoint();
        let inner = store.checkpoint();
        store.put(b"k", b"v").unwrap();
        store.commit(inner).unwrap();
        store.rollback(outer).unwrap();

        assert_eq!(store.get(b"k").unwrap(), None);
    }

    #[test]
    fn test_checkpoint_order_enforced() {
        let mut store = InMemoryKVStore::new();
        assert_eq!(
            store.commit(CheckpointId(0)),
            Err(StorageError::NoActiveCheckpoint)
        );

        let outer = store.checkpoint();
        let _inner = store.checkpoint();
        assert_eq!(
            store.rollback(outer),
            Err(StorageError::CheckpointMismatch {
                requested: 0,
                innermost: 1
            })
        );
    }
}
