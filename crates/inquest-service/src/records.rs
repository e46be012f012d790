//! Load/validate/save plumbing shared by both services

use crate::config::{ServiceConfig, WritePolicy};
use crate::error::ServiceError;
use crate::store::{EntityStore, WriteCondition};
use crate::types::{EntityKind, EntityMetadata, EntityRecord};
use inquest_document::codec::{self, DocumentCodec};
use inquest_document::EntityId;
use std::sync::Arc;

pub(crate) struct Records<S: ?Sized> {
    store: Arc<S>,
    config: ServiceConfig,
}

impl<S: ?Sized> Clone for Records<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: EntityStore + ?Sized> Records<S> {
    pub(crate) fn new(store: Arc<S>, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    pub(crate) fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub(crate) fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub(crate) fn load(&self, kind: EntityKind, id: &EntityId) -> Result<EntityRecord, ServiceError> {
        match self.store.load(kind, id)? {
            Some(record) => {
                tracing::debug!("Loaded {} {} at revision {}", kind, id, record.revision);
                Ok(record)
            }
            None => {
                tracing::warn!("{} {} not found", kind, id);
                Err(ServiceError::not_found(kind, id.clone()))
            }
        }
    }

    pub(crate) fn load_document<D: DocumentCodec>(
        &self,
        kind: EntityKind,
        id: &EntityId,
    ) -> Result<(EntityRecord, D), ServiceError> {
        let record = self.load(kind, id)?;
        let document = codec::decode(&record.document).map_err(|err| {
            tracing::warn!("Stored {} {} does not decode: {}", kind, id, err);
            err
        })?;
        Ok((record, document))
    }

    /// Precondition for replacing `loaded` under the configured policy
    pub(crate) fn condition_for(&self, loaded: &EntityRecord) -> WriteCondition {
        match self.config.write_policy {
            WritePolicy::LastWriteWins => WriteCondition::Unconditional,
            WritePolicy::RejectStale => WriteCondition::unchanged_from(loaded),
        }
    }

    pub(crate) fn save(
        &self,
        record: EntityRecord,
        condition: WriteCondition,
    ) -> Result<EntityRecord, ServiceError> {
        self.store.save(record, condition).map_err(|err| {
            if err.is_stale() {
                tracing::warn!("{}", err);
            }
            ServiceError::from(err)
        })
    }

    /// Trimmed label, rejected if empty or too long
    pub(crate) fn validate_label(&self, label: &str) -> Result<String, ServiceError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(ServiceError::InvalidMetadata("label is required".to_string()));
        }
        let len = label.chars().count();
        if len > self.config.label_max_len {
            return Err(ServiceError::InvalidMetadata(format!(
                "label is {} characters, limit is {}",
                len, self.config.label_max_len
            )));
        }
        Ok(label.to_string())
    }

    /// Unsaved record for a freshly allocated entity
    pub(crate) fn new_record(
        &self,
        kind: EntityKind,
        id: EntityId,
        label: String,
        metadata: EntityMetadata,
    ) -> EntityRecord {
        let mut record = EntityRecord::new(kind, id, label);
        record.description = metadata.description;
        record.enabled = metadata.enabled.unwrap_or(self.config.default_enabled);
        record.owner = metadata.owner;
        record
    }
}
