//! # Identifier Allocator
//!
//! Issues strictly increasing identifiers per sequence name. The first
//! identifier of a sequence is 1; 0 is never issued, so it can never collide
//! with an unset field.

use crate::domain::containers::VarDb;
use crate::domain::errors::{StorageError, StorageResult};
use crate::ports::outbound::KeyValueStore;
use shared_types::Uid;
use tracing::trace;

/// Counter for one named sequence.
pub struct IdFactory {
    sequence: String,
    last: VarDb<Uid>,
}

impl IdFactory {
    const SUFFIX: &'static str = "_ID_FACTORY";

    pub fn new(sequence: impl Into<String>) -> Self {
        let sequence = sequence.into();
        Self {
            last: VarDb::new(format!("{sequence}{}_uid", Self::SUFFIX)),
            sequence,
        }
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    /// Allocates the next identifier and persists it.
    pub fn get_uid<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> StorageResult<Uid> {
        let next = self
            .last
            .get_or_default(store)?
            .checked_add(1)
            .ok_or_else(|| StorageError::IdOverflow {
                sequence: self.sequence.clone(),
            })?;
        self.last.set(store, &next)?;
        trace!(sequence = %self.sequence, uid = next, "Allocated identifier");
        Ok(next)
    }

    /// Last identifier issued, or 0 if none was.
    pub fn last_uid<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<Uid> {
        self.last.get_or_default(store)
    }
}
