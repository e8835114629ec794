//! Domain layer for the ordered storage subsystem.

pub mod containers;
pub mod errors;
pub mod id_factory;
pub mod linked_list;

pub use containers::{field_key, ArrayDb, SetDb, VarDb};
pub use errors::{StorageError, StorageResult};
pub use id_factory::IdFactory;
pub use linked_list::{Iter, LinkedListDb, NodeFilter, UidLinkedListDb, DEFAULT_MAX_ITERATION};
