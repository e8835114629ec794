//! # Ordered Storage (ms-01)
//!
//! Persistence primitives of the wallet ledger, laid out over a flat
//! key-value table with no native collection types.
//!
//! ## Components
//!
//! | Component | Role |
//! |-----------|------|
//! | `IdFactory` | Strictly increasing identifiers per sequence name |
//! | `LinkedListDb` | Doubly-linked list with O(1) insert/remove at any node |
//! | `UidLinkedListDb` | Ordered set of identifiers (value is the node id) |
//! | `VarDb` / `ArrayDb` / `SetDb` | Typed fields over the same table |
//! | `InMemoryKVStore` | Reference store with nested checkpoints |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Containers, allocator, queue and errors
//! - `ports/` - `KeyValueStore` and `TransactionalStore`
//! - `adapters/` - In-memory store
//!
//! ## Usage
//!
//! ```
//! use ms_01_ordered_storage::{InMemoryKVStore, UidLinkedListDb};
//!
//! let mut store = InMemoryKVStore::new();
//! let waiting = UidLinkedListDb::new("WAITING");
//! waiting.append(&mut store, 1).unwrap();
//! waiting.append(&mut store, 2).unwrap();
//! waiting.remove(&mut store, 1).unwrap();
//! assert_eq!(waiting.select(&store, 0, None).unwrap(), vec![2]);
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::InMemoryKVStore;
pub use domain::{
    field_key, ArrayDb, IdFactory, LinkedListDb, NodeFilter, SetDb, StorageError, StorageResult,
    UidLinkedListDb, VarDb, DEFAULT_MAX_ITERATION,
};
pub use ports::{CheckpointId, KeyValueStore, TransactionalStore};
