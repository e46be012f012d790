//! Persistence gateway
//!
//! The services never talk to a database directly; they go through
//! [`EntityStore`]. [`MemoryStore`] is the in-process implementation used by
//! tests and embedders without a backend of their own.

use crate::error::StoreError;
use crate::types::{EntityKind, EntityRecord, RecordVersion};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use inquest_document::EntityId;

/// Precondition attached to a save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteCondition {
    /// Overwrite whatever is stored
    Unconditional,
    /// Write only if the stored record is still in this state
    IfUnchanged(RecordVersion),
}

impl WriteCondition {
    /// Condition that holds while nothing has saved over `loaded`
    #[inline]
    #[must_use]
    pub fn unchanged_from(loaded: &EntityRecord) -> Self {
        Self::IfUnchanged(loaded.version())
    }
}

/// Entity persistence
///
/// Implementations must make [`save`](Self::save) atomic per entity: the
/// condition check and the write happen under one lock or transaction.
pub trait EntityStore: Send + Sync {
    /// Reserve a fresh id for a new entity of `kind`
    ///
    /// # Errors
    /// Returns [`StoreError::Backend`] if the backend cannot hand out ids
    fn allocate_id(&self, kind: EntityKind) -> Result<EntityId, StoreError>;

    /// Load one entity, `None` if absent
    ///
    /// # Errors
    /// Returns [`StoreError::Backend`] on backend failure
    fn load(&self, kind: EntityKind, id: &EntityId) -> Result<Option<EntityRecord>, StoreError>;

    /// Insert or replace an entity
    ///
    /// Returns the record as stored, with `revision` and `changed` updated.
    ///
    /// # Errors
    /// Returns [`StoreError::StaleWrite`] if `condition` does not hold
    fn save(
        &self,
        record: EntityRecord,
        condition: WriteCondition,
    ) -> Result<EntityRecord, StoreError>;

    /// Remove an entity; `false` if it was not there
    ///
    /// # Errors
    /// Returns [`StoreError::Backend`] on backend failure
    fn delete(&self, kind: EntityKind, id: &EntityId) -> Result<bool, StoreError>;

    /// All entities of `kind`, ordered by id
    ///
    /// # Errors
    /// Returns [`StoreError::Backend`] on backend failure
    fn list(&self, kind: EntityKind) -> Result<Vec<EntityRecord>, StoreError>;
}

/// Concurrent in-memory store
///
/// Ids are numeric and allocated per kind starting at 1.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<(EntityKind, EntityId), EntityRecord>,
    counters: DashMap<EntityKind, u64>,
}

impl MemoryStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entities across kinds
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check for an empty store
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl EntityStore for MemoryStore {
    fn allocate_id(&self, kind: EntityKind) -> Result<EntityId, StoreError> {
        let mut counter = self.counters.entry(kind).or_insert(0);
        *counter += 1;
        Ok(EntityId::from(*counter))
    }

    fn load(&self, kind: EntityKind, id: &EntityId) -> Result<Option<EntityRecord>, StoreError> {
        Ok(self
            .records
            .get(&(kind, id.clone()))
            .map(|entry| entry.value().clone()))
    }

    fn save(
        &self,
        mut record: EntityRecord,
        condition: WriteCondition,
    ) -> Result<EntityRecord, StoreError> {
        let kind = record.kind;
        let id = record.id.clone();

        match self.records.entry((kind, id.clone())) {
            Entry::Occupied(mut slot) => {
                let current = slot.get();
                if let WriteCondition::IfUnchanged(expected) = condition {
                    let actual = current.version();
                    if actual != expected {
                        tracing::debug!("Rejected stale write to {} {}", kind, id);
                        return Err(StoreError::StaleWrite {
                            kind,
                            id,
                            expected,
                            actual: Some(actual),
                        });
                    }
                }
                record.created = current.created;
                record.revision = current.revision + 1;
                record.changed = Utc::now();
                slot.insert(record.clone());
            }
            Entry::Vacant(slot) => {
                if let WriteCondition::IfUnchanged(expected) = condition {
                    tracing::debug!("Rejected write to vanished {} {}", kind, id);
                    return Err(StoreError::StaleWrite {
                        kind,
                        id,
                        expected,
                        actual: None,
                    });
                }
                record.revision = 1;
                record.changed = Utc::now();
                slot.insert(record.clone());
            }
        }

        tracing::debug!("Saved {} {} at revision {}", kind, record.id, record.revision);
        Ok(record)
    }

    fn delete(&self, kind: EntityKind, id: &EntityId) -> Result<bool, StoreError> {
        Ok(self.records.remove(&(kind, id.clone())).is_some())
    }

    fn list(&self, kind: EntityKind) -> Result<Vec<EntityRecord>, StoreError> {
        let mut records: Vec<EntityRecord> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == kind)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }
}
