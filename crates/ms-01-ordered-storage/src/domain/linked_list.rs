//! # Persistent Ordered Queue
//!
//! A doubly-linked list laid out over the key-value table. The list keeps
//! `head_id`, `tail_id` and `length` fields; each node keeps `init`, `value`,
//! `next` and `prev` fields under a name derived from its id.
//!
//! ## Invariants
//!
//! - `length == 0` iff head and tail are unset
//! - the head has no `prev`, the tail has no `next`
//! - walking `next` from the head reaches the tail in `length` steps
//!
//! Node ids come from the list's own [`IdFactory`] sequence unless the
//! caller supplies one. [`UidLinkedListDb`] always supplies the value itself,
//! which turns the list into an ordered set of identifiers.

use crate::domain::containers::VarDb;
use crate::domain::errors::{StorageError, StorageResult};
use crate::domain::id_factory::IdFactory;
use crate::ports::outbound::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::Uid;
use std::marker::PhantomData;
use tracing::{debug, trace};

/// Upper bound on the number of nodes visited by one `select` page.
pub const DEFAULT_MAX_ITERATION: usize = 100;

/// Optional filter applied by `select`.
pub type NodeFilter<'f, V> = &'f dyn Fn(Uid, &V) -> bool;

// =============================================================================
// NODE
// =============================================================================

struct Node<V> {
    init: VarDb<bool>,
    value: VarDb<V>,
    next: VarDb<Uid>,
    prev: VarDb<Uid>,
}

impl<V: Serialize + DeserializeOwned> Node<V> {
    fn new(id: Uid, list: &str) -> Self {
        let name = format!("{id}{list}_NODEDB");
        Self {
            init: VarDb::new(format!("{name}_init")),
            value: VarDb::new(format!("{name}_value")),
            next: VarDb::new(format!("{name}_next")),
            prev: VarDb::new(format!("{name}_prev")),
        }
    }

    fn exists<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<bool> {
        Ok(self.init.get(store)?.unwrap_or(false))
    }

    fn write_value<S: KeyValueStore + ?Sized>(&self, store: &mut S, value: &V) -> StorageResult<()> {
        self.init.set(store, &true)?;
        self.value.set(store, value)
    }

    fn read_value<S: KeyValueStore + ?Sized>(&self, store: &S, list: &str) -> StorageResult<V> {
        self.value.get(store)?.ok_or_else(|| StorageError::Corrupted {
            container: list.to_string(),
            reason: format!("node value missing under {}", self.value.key()),
        })
    }

    fn delete<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> StorageResult<()> {
        self.value.remove(store)?;
        self.prev.remove(store)?;
        self.next.remove(store)?;
        self.init.remove(store)
    }
}

// =============================================================================
// LINKED LIST
// =============================================================================

/// Doubly-linked list of `V` values keyed by integer node ids.
pub struct LinkedListDb<V> {
    name: String,
    head_id: VarDb<Uid>,
    tail_id: VarDb<Uid>,
    length: VarDb<u64>,
    ids: IdFactory,
    max_iteration: usize,
    _value: PhantomData<fn() -> V>,
}

impl<V: Serialize + DeserializeOwned> LinkedListDb<V> {
    const SUFFIX: &'static str = "_LINKED_LISTDB";

    pub fn new(var_key: &str) -> Self {
        let name = format!("{var_key}{}", Self::SUFFIX);
        Self {
            head_id: VarDb::new(format!("{name}_head_id")),
            tail_id: VarDb::new(format!("{name}_tail_id")),
            length: VarDb::new(format!("{name}_length")),
            ids: IdFactory::new(format!("{name}_nodedb")),
            max_iteration: DEFAULT_MAX_ITERATION,
            name,
            _value: PhantomData,
        }
    }

    /// Overrides the page bound used by `select`.
    #[must_use]
    pub fn with_max_iteration(mut self, max_iteration: usize) -> Self {
        self.max_iteration = max_iteration;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_iteration(&self) -> usize {
        self.max_iteration
    }

    fn node(&self, id: Uid) -> Node<V> {
        Node::new(id, &self.name)
    }

    fn existing_node<S: KeyValueStore + ?Sized>(&self, store: &S, id: Uid) -> StorageResult<Node<V>> {
        let node = self.node(id);
        if !node.exists(store)? {
            return Err(StorageError::NotFound {
                list: self.name.clone(),
                id,
            });
        }
        Ok(node)
    }

    fn empty_error(&self) -> StorageError {
        StorageError::Empty {
            list: self.name.clone(),
        }
    }

    fn create_node<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        value: &V,
        id: Option<Uid>,
    ) -> StorageResult<(Uid, Node<V>)> {
        let id = match id {
            Some(id) => id,
            None => self.ids.get_uid(store)?,
        };
        let node = self.node(id);
        if node.exists(store)? {
            return Err(StorageError::DuplicateNode {
                list: self.name.clone(),
                id,
            });
        }
        node.write_value(store, value)?;
        Ok((id, node))
    }

    fn set_length<S: KeyValueStore + ?Sized>(&self, store: &mut S, length: usize) -> StorageResult<()> {
        self.length.set(store, &(length as u64))
    }

    pub fn len<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<usize> {
        Ok(self.length.get_or_default(store)? as usize)
    }

    pub fn is_empty<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<bool> {
        Ok(self.len(store)? == 0)
    }

    pub fn head_id<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<Option<Uid>> {
        self.head_id.get(store)
    }

    pub fn tail_id<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<Option<Uid>> {
        self.tail_id.get(store)
    }

    /// Returns true if a node with this id is linked in the list.
    pub fn contains<S: KeyValueStore + ?Sized>(&self, store: &S, id: Uid) -> StorageResult<bool> {
        self.node(id).exists(store)
    }

    pub fn node_value<S: KeyValueStore + ?Sized>(&self, store: &S, id: Uid) -> StorageResult<V> {
        self.existing_node(store, id)?.read_value(store, &self.name)
    }

    pub fn head_value<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<V> {
        let id = self.head_id(store)?.ok_or_else(|| self.empty_error())?;
        self.node_value(store, id)
    }

    pub fn tail_value<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<V> {
        let id = self.tail_id(store)?.ok_or_else(|| self.empty_error())?;
        self.node_value(store, id)
    }

    /// Id of the node after `id`, or `None` at the tail.
    pub fn next<S: KeyValueStore + ?Sized>(&self, store: &S, id: Uid) -> StorageResult<Option<Uid>> {
        self.existing_node(store, id)?.next.get(store)
    }

    /// Id of the node before `id`, or `None` at the head.
    pub fn prev<S: KeyValueStore + ?Sized>(&self, store: &S, id: Uid) -> StorageResult<Option<Uid>> {
        self.existing_node(store, id)?.prev.get(store)
    }

    /// Links a new node after the tail and returns its id.
    pub fn append<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        value: &V,
        id: Option<Uid>,
    ) -> StorageResult<Uid> {
        let (cur_id, cur) = self.create_node(store, value, id)?;
        let length = self.len(store)?;

        match self.tail_id(store)? {
            Some(tail_id) if length > 0 => {
                let tail = self.existing_node(store, tail_id)?;
                tail.next.set(store, &cur_id)?;
                cur.prev.set(store, &tail_id)?;
                self.tail_id.set(store, &cur_id)?;
            }
            _ => {
                self.head_id.set(store, &cur_id)?;
                self.tail_id.set(store, &cur_id)?;
            }
        }

        self.set_length(store, length + 1)?;
        debug!(list = %self.name, id = cur_id, length = length + 1, "Appended node");
        Ok(cur_id)
    }

    /// Links a new node before the head and returns its id.
    pub fn prepend<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        value: &V,
        id: Option<Uid>,
    ) -> StorageResult<Uid> {
        let (cur_id, cur) = self.create_node(store, value, id)?;
        let length = self.len(store)?;

        match self.head_id(store)? {
            Some(head_id) if length > 0 => {
                let head = self.existing_node(store, head_id)?;
                head.prev.set(store, &cur_id)?;
                cur.next.set(store, &head_id)?;
                self.head_id.set(store, &cur_id)?;
            }
            _ => {
                self.head_id.set(store, &cur_id)?;
                self.tail_id.set(store, &cur_id)?;
            }
        }

        self.set_length(store, length + 1)?;
        debug!(list = %self.name, id = cur_id, length = length + 1, "Prepended node");
        Ok(cur_id)
    }

    /// Unlinks and deletes the node `id`.
    pub fn remove<S: KeyValueStore + ?Sized>(&self, store: &mut S, id: Uid) -> StorageResult<()> {
        let cur = self.existing_node(store, id)?;

        if self.head_id(store)? == Some(id) {
            return self.remove_head(store);
        }
        if self.tail_id(store)? == Some(id) {
            return self.remove_tail(store);
        }

        let not_linked = || StorageError::Corrupted {
            container: self.name.clone(),
            reason: format!("interior node {id} is missing a link"),
        };
        let next_id = cur.next.get(store)?.ok_or_else(not_linked)?;
        let prev_id = cur.prev.get(store)?.ok_or_else(not_linked)?;
        let next = self.existing_node(store, next_id)?;
        let prev = self.existing_node(store, prev_id)?;

        next.prev.set(store, &prev_id)?;
        prev.next.set(store, &next_id)?;
        cur.delete(store)?;

        let length = self.len(store)?;
        self.set_length(store, length.saturating_sub(1))?;
        debug!(list = %self.name, id, "Removed interior node");
        Ok(())
    }

    pub fn remove_head<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> StorageResult<()> {
        let length = self.len(store)?;
        let head_id = self.head_id(store)?.ok_or_else(|| self.empty_error())?;
        if length <= 1 {
            return self.clear(store);
        }

        let old_head = self.existing_node(store, head_id)?;
        let new_head_id = old_head.next.get(store)?.ok_or_else(|| StorageError::Corrupted {
            container: self.name.clone(),
            reason: format!("head {head_id} has no successor with length {length}"),
        })?;
        self.head_id.set(store, &new_head_id)?;
        self.existing_node(store, new_head_id)?.prev.remove(store)?;
        old_head.delete(store)?;

        self.set_length(store, length - 1)?;
        debug!(list = %self.name, id = head_id, "Removed head node");
        Ok(())
    }

    pub fn remove_tail<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> StorageResult<()> {
        let length = self.len(store)?;
        let tail_id = self.tail_id(store)?.ok_or_else(|| self.empty_error())?;
        if length <= 1 {
            return self.clear(store);
        }

        let old_tail = self.existing_node(store, tail_id)?;
        let new_tail_id = old_tail.prev.get(store)?.ok_or_else(|| StorageError::Corrupted {
            container: self.name.clone(),
            reason: format!("tail {tail_id} has no predecessor with length {length}"),
        })?;
        self.tail_id.set(store, &new_tail_id)?;
        self.existing_node(store, new_tail_id)?.next.remove(store)?;
        old_tail.delete(store)?;

        self.set_length(store, length - 1)?;
        debug!(list = %self.name, id = tail_id, "Removed tail node");
        Ok(())
    }

    /// Deletes every node and resets the list to empty.
    pub fn clear<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> StorageResult<()> {
        let ids = self
            .iter(&*store)
            .map(|item| item.map(|(id, _)| id))
            .collect::<StorageResult<Vec<_>>>()?;
        for id in &ids {
            self.node(*id).delete(store)?;
        }

        self.head_id.remove(store)?;
        self.tail_id.remove(store)?;
        self.set_length(store, 0)?;
        debug!(list = %self.name, removed = ids.len(), "Cleared list");
        Ok(())
    }

    /// Lazy head-to-tail traversal yielding `(id, value)` pairs.
    ///
    /// The store is borrowed shared, so the list cannot be mutated while the
    /// iterator is alive.
    pub fn iter<'a, S: KeyValueStore + ?Sized>(&'a self, store: &'a S) -> Iter<'a, S, V> {
        Iter {
            list: self,
            store,
            cursor: None,
            started: false,
        }
    }

    /// One page of values: skips `offset` nodes, then visits at most
    /// `max_iteration` nodes, keeping those accepted by `filter`.
    ///
    /// The bound counts visited nodes, not kept ones, so a selective filter
    /// returns a short page.
    pub fn select<S: KeyValueStore + ?Sized>(
        &self,
        store: &S,
        offset: usize,
        filter: Option<NodeFilter<'_, V>>,
    ) -> StorageResult<Vec<V>> {
        let length = self.len(store)?;
        if offset > length {
            return Err(StorageError::OutOfRange {
                list: self.name.clone(),
                offset,
                length,
            });
        }

        let mut page = Vec::new();
        for item in self.iter(store).skip(offset).take(self.max_iteration) {
            let (id, value) = item?;
            if filter.map_or(true, |accept| accept(id, &value)) {
                page.push(value);
            }
        }
        trace!(list = %self.name, offset, returned = page.len(), "Selected page");
        Ok(page)
    }
}

// =============================================================================
// ITERATOR
// =============================================================================

/// Iterator returned by [`LinkedListDb::iter`].
pub struct Iter<'a, S: ?Sized, V> {
    list: &'a LinkedListDb<V>,
    store: &'a S,
    cursor: Option<Uid>,
    started: bool,
}

impl<'a, S, V> Iterator for Iter<'a, S, V>
where
    S: KeyValueStore + ?Sized,
    V: Serialize + DeserializeOwned,
{
    type Item = StorageResult<(Uid, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = if self.started {
            self.cursor?
        } else {
            self.started = true;
            match self.list.head_id(self.store) {
                Ok(Some(id)) => id,
                Ok(None) => return None,
                Err(err) => return Some(Err(err)),
            }
        };

        let step = || -> StorageResult<((Uid, V), Option<Uid>)> {
            let node = self.list.existing_node(self.store, current)?;
            let value = node.read_value(self.store, &self.list.name)?;
            let next = if self.list.tail_id(self.store)? == Some(current) {
                None
            } else {
                node.next.get(self.store)?
            };
            Ok(((current, value), next))
        };

        match step() {
            Ok((item, next)) => {
                self.cursor = next;
                Some(Ok(item))
            }
            Err(err) => {
                self.cursor = None;
                Some(Err(err))
            }
        }
    }
}

// =============================================================================
// UID LINKED LIST
// =============================================================================

/// Ordered set of identifiers: each value is its own node id.
pub struct UidLinkedListDb {
    inner: LinkedListDb<Uid>,
}

impl UidLinkedListDb {
    pub fn new(var_key: &str) -> Self {
        Self {
            inner: LinkedListDb::new(&format!("{var_key}_UID")),
        }
    }

    #[must_use]
    pub fn with_max_iteration(self, max_iteration: usize) -> Self {
        Self {
            inner: self.inner.with_max_iteration(max_iteration),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn append<S: KeyValueStore + ?Sized>(&self, store: &mut S, uid: Uid) -> StorageResult<()> {
        self.inner.append(store, &uid, Some(uid)).map(|_| ())
    }

    pub fn prepend<S: KeyValueStore + ?Sized>(&self, store: &mut S, uid: Uid) -> StorageResult<()> {
        self.inner.prepend(store, &uid, Some(uid)).map(|_| ())
    }

    pub fn remove<S: KeyValueStore + ?Sized>(&self, store: &mut S, uid: Uid) -> StorageResult<()> {
        self.inner.remove(store, uid)
    }

    pub fn remove_head<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> StorageResult<()> {
        self.inner.remove_head(store)
    }

    pub fn remove_tail<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> StorageResult<()> {
        self.inner.remove_tail(store)
    }

    pub fn clear<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> StorageResult<()> {
        self.inner.clear(store)
    }

    pub fn contains<S: KeyValueStore + ?Sized>(&self, store: &S, uid: Uid) -> StorageResult<bool> {
        self.inner.contains(store, uid)
    }

    pub fn len<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<usize> {
        self.inner.len(store)
    }

    pub fn is_empty<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<bool> {
        self.inner.is_empty(store)
    }

    pub fn head_value<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<Uid> {
        self.inner.head_value(store)
    }

    pub fn tail_value<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<Uid> {
        self.inner.tail_value(store)
    }

    /// All identifiers, head to tail.
    pub fn to_vec<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<Vec<Uid>> {
        self.inner
            .iter(store)
            .map(|item| item.map(|(_, uid)| uid))
            .collect()
    }

    pub fn select<S: KeyValueStore + ?Sized>(
        &self,
        store: &S,
        offset: usize,
        filter: Option<NodeFilter<'_, Uid>>,
    ) -> StorageResult<Vec<Uid>> {
        self.inner.select(store, offset, filter)
    }
}

// =============================================================================
// TESTS
// =============================================================================
