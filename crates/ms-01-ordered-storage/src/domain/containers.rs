//! # Typed Containers
//!
//! Typed views over the flat key-value table. Each container owns a name
//! prefix and derives one key per field, so a record is a set of
//! independently keyed values rather than one serialized blob.
//!
//! - `VarDb<T>`: a single field
//! - `ArrayDb<T>`: an indexed array with a stored length
//! - `SetDb<T>`: an insertion-ordered set on top of `ArrayDb`

use crate::domain::errors::{StorageError, StorageResult};
use crate::ports::outbound::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::marker::PhantomData;

/// Joins a container name and a field name into a storage key.
pub fn field_key(name: &str, field: &str) -> Vec<u8> {
    format!("{name}_{field}").into_bytes()
}

pub(crate) fn encode<T: Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
    Ok(bincode::deserialize(bytes)?)
}

// =============================================================================
// VARDB
// =============================================================================

/// A single persisted field.
pub struct VarDb<T> {
    key: String,
    _value: PhantomData<fn() -> T>,
}

impl<T> VarDb<T> {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            _value: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<T: Serialize + DeserializeOwned> VarDb<T> {
    pub fn get<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<Option<T>> {
        store
            .get(self.key.as_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// Reads the field, falling back to `T::default()` when unset.
    pub fn get_or_default<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<T>
    where
        T: Default,
    {
        Ok(self.get(store)?.unwrap_or_default())
    }

    pub fn set<S: KeyValueStore + ?Sized>(&self, store: &mut S, value: &T) -> StorageResult<()> {
        store.put(self.key.as_bytes(), &encode(value)?)
    }

    pub fn remove<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> StorageResult<()> {
        store.delete(self.key.as_bytes())
    }

    pub fn is_set<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<bool> {
        store.exists(self.key.as_bytes())
    }
}

// =============================================================================
// ARRAYDB
// =============================================================================

/// Indexed array; the length lives in its own field.
pub struct ArrayDb<T> {
    name: String,
    size: VarDb<u64>,
    _value: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> ArrayDb<T> {
    const SUFFIX: &'static str = "_ARRAYDB";

    pub fn new(var_key: &str) -> Self {
        let name = format!("{var_key}{}", Self::SUFFIX);
        Self {
            size: VarDb::new(format!("{name}_size")),
            name,
            _value: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn slot(&self, index: usize) -> Vec<u8> {
        field_key(&self.name, &index.to_string())
    }

    pub fn len<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<usize> {
        Ok(self.size.get_or_default(store)? as usize)
    }

    pub fn is_empty<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<bool> {
        Ok(self.len(store)? == 0)
    }

    pub fn push<S: KeyValueStore + ?Sized>(&self, store: &mut S, value: &T) -> StorageResult<()> {
        let len = self.len(store)?;
        store.put(&self.slot(len), &encode(value)?)?;
        self.size.set(store, &(len as u64 + 1))
    }

    pub fn get<S: KeyValueStore + ?Sized>(&self, store: &S, index: usize) -> StorageResult<T> {
        let length = self.len(store)?;
        if index >= length {
            return Err(StorageError::IndexOutOfBounds {
                container: self.name.clone(),
                index,
                length,
            });
        }
        match store.get(&self.slot(index))? {
            Some(bytes) => decode(&bytes),
            None => Err(StorageError::Corrupted {
                container: self.name.clone(),
                reason: format!("missing slot {index}"),
            }),
        }
    }

    pub fn set<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        index: usize,
        value: &T,
    ) -> StorageResult<()> {
        let length = self.len(store)?;
        if index >= length {
            return Err(StorageError::IndexOutOfBounds {
                container: self.name.clone(),
                index,
                length,
            });
        }
        store.put(&self.slot(index), &encode(value)?)
    }

    /// Removes and returns the last element.
    pub fn pop<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> StorageResult<Option<T>> {
        let len = self.len(store)?;
        if len == 0 {
            return Ok(None);
        }
        let value = self.get(store, len - 1)?;
        store.delete(&self.slot(len - 1))?;
        self.size.set(store, &(len as u64 - 1))?;
        Ok(Some(value))
    }

    /// Removes the element at `index`, shifting the tail left to keep order.
    pub fn remove_at<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        index: usize,
    ) -> StorageResult<T> {
        let removed = self.get(store, index)?;
        let len = self.len(store)?;
        for i in index + 1..len {
            let moved = self.get(store, i)?;
            store.put(&self.slot(i - 1), &encode(&moved)?)?;
        }
        store.delete(&self.slot(len - 1))?;
        self.size.set(store, &(len as u64 - 1))?;
        Ok(removed)
    }

    pub fn items<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<Vec<T>> {
        (0..self.len(store)?).map(|i| self.get(store, i)).collect()
    }

    pub fn position<S: KeyValueStore + ?Sized>(
        &self,
        store: &S,
        value: &T,
    ) -> StorageResult<Option<usize>>
    where
        T: PartialEq,
    {
        Ok(self.items(store)?.iter().position(|item| item == value))
    }

    pub fn clear<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> StorageResult<()> {
        let len = self.len(store)?;
        for i in 0..len {
            store.delete(&self.slot(i))?;
        }
        self.size.remove(store)
    }
}

// =============================================================================
// SETDB
// =============================================================================

/// Set of unique values that remembers insertion order.
///
/// Vote sets rely on the order: the last element is the most recent voter.
pub struct SetDb<T> {
    items: ArrayDb<T>,
}

impl<T: Serialize + DeserializeOwned + PartialEq + Debug> SetDb<T> {
    const SUFFIX: &'static str = "_SETDB";

    pub fn new(var_key: &str) -> Self {
        Self {
            items: ArrayDb::new(&format!("{var_key}{}", Self::SUFFIX)),
        }
    }

    pub fn name(&self) -> &str {
        self.items.name()
    }

    /// Adds `item` if absent. Returns whether it was inserted.
    pub fn add<S: KeyValueStore + ?Sized>(&self, store: &mut S, item: &T) -> StorageResult<bool> {
        if self.contains(store, item)? {
            return Ok(false);
        }
        self.items.push(store, item)?;
        Ok(true)
    }

    /// Removes `item`, failing with `ItemNotFound` if absent.
    pub fn remove<S: KeyValueStore + ?Sized>(&self, store: &mut S, item: &T) -> StorageResult<()> {
        match self.items.position(store, item)? {
            Some(index) => {
                self.items.remove_at(store, index)?;
                Ok(())
            }
            None => Err(StorageError::ItemNotFound {
                container: self.name().to_string(),
                item: format!("{item:?}"),
            }),
        }
    }

    /// Removes `item` if present. Returns whether it was there.
    pub fn discard<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        item: &T,
    ) -> StorageResult<bool> {
        match self.items.position(store, item)? {
            Some(index) => {
                self.items.remove_at(store, index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn contains<S: KeyValueStore + ?Sized>(&self, store: &S, item: &T) -> StorageResult<bool> {
        Ok(self.items.position(store, item)?.is_some())
    }

    pub fn len<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<usize> {
        self.items.len(store)
    }

    pub fn is_empty<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<bool> {
        self.items.is_empty(store)
    }

    /// Most recently added element.
    pub fn last<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<Option<T>> {
        let len = self.items.len(store)?;
        if len == 0 {
            return Ok(None);
        }
        self.items.get(store, len - 1).map(Some)
    }

    pub fn items<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<Vec<T>> {
        self.items.items(store)
    }

    pub fn clear<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> StorageResult<()> {
        self.items.clear(store)
    }
}
