//! Investigation service
//!
//! Creates investigations, routes step mutations through the document
//! engine, and manages investigation metadata. Every step mutation is a
//! single load, apply, encode, save sequence; a failed mutation writes
//! nothing.

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::records::Records;
use crate::store::{EntityStore, WriteCondition};
use crate::types::{EntityKind, EntityMetadata, EntitySummary, MetadataChanges};
use inquest_document::codec;
use inquest_document::{
    EntityId, InvestigationDocument, StepDocument, StepMutation, StepPayload, StepSequence,
    StepUuid,
};
use std::sync::Arc;

const KIND: EntityKind = EntityKind::Investigation;

/// Investigation operations over an [`EntityStore`]
pub struct InvestigationService<S: ?Sized> {
    records: Records<S>,
}

impl<S: ?Sized> Clone for InvestigationService<S> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
        }
    }
}

impl<S: EntityStore + ?Sized> InvestigationService<S> {
    /// Create service over `store`
    #[must_use]
    pub fn new(store: Arc<S>, config: ServiceConfig) -> Self {
        Self {
            records: Records::new(store, config),
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        self.records.config()
    }

    /// Create an investigation with an empty step document
    ///
    /// # Errors
    /// Returns [`ServiceError::InvalidMetadata`] for a missing or oversized
    /// label, [`ServiceError::Store`] if the store fails
    pub fn create(
        &self,
        label: &str,
        metadata: EntityMetadata,
    ) -> Result<InvestigationDocument, ServiceError> {
        let label = self.records.validate_label(label)?;
        let id = self.records.store().allocate_id(KIND)?;

        let document = InvestigationDocument::new(id.clone(), label.clone());
        let record = self
            .records
            .new_record(KIND, id, label, metadata)
            .with_document(codec::encode(&document));
        let saved = self.records.save(record, WriteCondition::Unconditional)?;

        tracing::info!("Created investigation {}: {}", saved.id, saved.label);
        Ok(document)
    }

    /// Stored document text, verbatim
    ///
    /// # Errors
    /// Returns [`ServiceError::NotFound`] if the investigation does not exist
    pub fn get_document(&self, id: &EntityId) -> Result<String, ServiceError> {
        Ok(self.records.load(KIND, id)?.document)
    }

    /// Decoded document
    ///
    /// # Errors
    /// Returns [`ServiceError::NotFound`] if the investigation does not exist,
    /// [`ServiceError::Document`] if the stored text is malformed
    pub fn get(&self, id: &EntityId) -> Result<InvestigationDocument, ServiceError> {
        Ok(self
            .records
            .load_document::<InvestigationDocument>(KIND, id)?
            .1)
    }

    /// All investigations, ordered by id
    ///
    /// # Errors
    /// Returns [`ServiceError::Store`] if the store fails
    pub fn list(&self) -> Result<Vec<EntitySummary>, ServiceError> {
        let records = self.records.store().list(KIND)?;
        tracing::debug!("Listed {} investigations", records.len());
        Ok(records.iter().map(|record| record.summary()).collect())
    }

    /// Append a step
    ///
    /// # Errors
    /// Returns [`ServiceError::NotFound`] for an unknown investigation and
    /// a conflict if `step_uuid` is already present
    pub fn add_step(
        &self,
        id: &EntityId,
        payload: StepPayload,
        step_uuid: StepUuid,
    ) -> Result<InvestigationDocument, ServiceError> {
        self.mutate(id, StepMutation::Add { step_uuid, payload })
    }

    /// Replace one step's payload
    ///
    /// # Errors
    /// Returns a not-found error for an unknown investigation or step
    pub fn update_step(
        &self,
        id: &EntityId,
        step_uuid: StepUuid,
        payload: StepPayload,
    ) -> Result<InvestigationDocument, ServiceError> {
        self.mutate(id, StepMutation::Update { step_uuid, payload })
    }

    /// Replace the step sequence with a permutation of itself
    ///
    /// # Errors
    /// Returns a conflict unless `new_order` holds exactly the stored steps
    pub fn reorder_steps(
        &self,
        id: &EntityId,
        new_order: StepSequence,
    ) -> Result<InvestigationDocument, ServiceError> {
        self.mutate(id, StepMutation::Reorder(new_order))
    }

    /// Remove one step and renumber the rest
    ///
    /// # Errors
    /// Returns a not-found error for an unknown investigation or step
    pub fn delete_step(
        &self,
        id: &EntityId,
        step_uuid: StepUuid,
    ) -> Result<InvestigationDocument, ServiceError> {
        self.mutate(id, StepMutation::Delete(step_uuid))
    }

    /// Run one mutation end to end
    ///
    /// # Errors
    /// Propagates load, decode, mutation and save failures; nothing is
    /// written unless every earlier stage succeeded
    pub fn mutate(
        &self,
        id: &EntityId,
        mutation: StepMutation,
    ) -> Result<InvestigationDocument, ServiceError> {
        let name = mutation.name();
        let (mut record, document) = self.records.load_document::<InvestigationDocument>(KIND, id)?;
        let condition = self.records.condition_for(&record);

        let next = mutation.apply(&document).map_err(|err| {
            tracing::warn!("{} on investigation {} rejected: {}", name, id, err);
            err
        })?;

        record.document = codec::encode(&next);
        let saved = self.records.save(record, condition)?;

        tracing::info!(
            "{} on investigation {}: {} steps, revision {}",
            name,
            id,
            next.steps().len(),
            saved.revision
        );
        Ok(next)
    }

    /// Copy an investigation into a new one
    ///
    /// Steps are copied verbatim, including their uuids and ids. The copy
    /// gets a new entity id and document uuid. Metadata starts from the
    /// source's and is overridden by `changes`.
    ///
    /// # Errors
    /// Returns [`ServiceError::NotFound`] for an unknown source and
    /// [`ServiceError::InvalidMetadata`] for a bad label
    pub fn duplicate(
        &self,
        source_id: &EntityId,
        changes: MetadataChanges,
    ) -> Result<InvestigationDocument, ServiceError> {
        let (source, document) = self
            .records
            .load_document::<InvestigationDocument>(KIND, source_id)?;
        let label = self
            .records
            .validate_label(changes.label.as_deref().unwrap_or(&source.label))?;
        let id = self.records.store().allocate_id(KIND)?;

        let copy = document.duplicate_as(id.clone(), label.clone());
        let metadata = EntityMetadata {
            description: source.description,
            enabled: Some(source.enabled),
            owner: source.owner,
        };
        let mut record = self.records.new_record(KIND, id, label, metadata);
        changes.apply_to(&mut record);
        record.document = codec::encode(&copy);

        let saved = self.records.save(record, WriteCondition::Unconditional)?;
        tracing::info!("Duplicated investigation {} as {}", source_id, saved.id);
        Ok(copy)
    }

    /// Update entity metadata; the step document is left as stored
    ///
    /// # Errors
    /// Returns [`ServiceError::NotFound`] for an unknown investigation and
    /// [`ServiceError::InvalidMetadata`] for a bad label
    pub fn update(
        &self,
        id: &EntityId,
        changes: MetadataChanges,
    ) -> Result<InvestigationDocument, ServiceError> {
        let (mut record, document) = self.records.load_document::<InvestigationDocument>(KIND, id)?;
        let condition = self.records.condition_for(&record);

        if let Some(label) = changes.label.as_deref() {
            record.label = self.records.validate_label(label)?;
        }
        changes.apply_to(&mut record);

        let saved = self.records.save(record, condition)?;
        tracing::info!("Updated investigation {} metadata: {}", id, saved.label);
        Ok(document)
    }

    /// Delete an investigation
    ///
    /// Reports taken from it are left in place.
    ///
    /// # Errors
    /// Returns [`ServiceError::NotFound`] if the investigation does not exist
    pub fn delete(&self, id: &EntityId) -> Result<(), ServiceError> {
        if !self.records.store().delete(KIND, id)? {
            return Err(ServiceError::not_found(KIND, id.clone()));
        }
        tracing::info!("Deleted investigation {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WritePolicy;
    use crate::store::MemoryStore;
    use crate::types::EntityRecord;
    use inquest_document::{DocumentError, Step};
    use pretty_assertions::assert_eq;

    fn service() -> (Arc<MemoryStore>, InvestigationService<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = InvestigationService::new(Arc::clone(&store), ServiceConfig::default());
        (store, service)
    }

    fn layout(doc: &InvestigationDocument) -> Vec<(String, u32)> {
        doc.steps()
            .iter()
            .map(|s| (s.step_uuid().to_string(), s.id()))
            .collect()
    }

    #[test]
    fn create_starts_empty() {
        let (store, service) = service();
        let doc = service.create("Burglary", EntityMetadata::new()).unwrap();

        assert!(doc.steps().is_empty());
        assert_eq!(doc.investigation_label(), "Burglary");

        let record = store.load(KIND, doc.entity_id()).unwrap().unwrap();
        assert!(record.enabled);
        assert_eq!(record.revision, 1);
        assert_eq!(service.get(doc.entity_id()).unwrap(), doc);
    }

    #[test]
    fn create_rejects_blank_label() {
        let (store, service) = service();
        let err = service.create("", EntityMetadata::new()).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidMetadata(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn step_lifecycle() {
        let (_, service) = service();
        let id = service.create("Case", EntityMetadata::new()).unwrap().entity_id().clone();

        for uuid in ["a", "b", "c"] {
            service
                .add_step(&id, StepPayload::new().with("title", uuid), StepUuid::new(uuid))
                .unwrap();
        }
        service
            .update_step(&id, StepUuid::new("b"), StepPayload::new().with("title", "B"))
            .unwrap();
        let doc = service.delete_step(&id, StepUuid::new("a")).unwrap();

        assert_eq!(layout(&doc), vec![("b".to_string(), 1), ("c".to_string(), 2)]);
        assert_eq!(service.get(&id).unwrap(), doc);
    }

    #[test]
    fn reorder_through_service() {
        let (_, service) = service();
        let id = service.create("Case", EntityMetadata::new()).unwrap().entity_id().clone();
        service.add_step(&id, StepPayload::new(), StepUuid::new("a")).unwrap();
        let doc = service.add_step(&id, StepPayload::new(), StepUuid::new("b")).unwrap();

        let reversed: StepSequence = doc.steps().iter().rev().cloned().collect();
        let doc = service.reorder_steps(&id, reversed).unwrap();
        assert_eq!(layout(&doc), vec![("b".to_string(), 1), ("a".to_string(), 2)]);
    }

    #[test]
    fn failed_mutation_writes_nothing() {
        let (store, service) = service();
        let id = service.create("Case", EntityMetadata::new()).unwrap().entity_id().clone();
        service.add_step(&id, StepPayload::new(), StepUuid::new("a")).unwrap();
        let before = store.load(KIND, &id).unwrap().unwrap();

        let err = service
            .add_step(&id, StepPayload::new(), StepUuid::new("a"))
            .unwrap_err();
        assert!(err.is_conflict());

        let bad_order: StepSequence = vec![Step::new("zzz", StepPayload::new())].into();
        assert!(service.reorder_steps(&id, bad_order).unwrap_err().is_conflict());

        assert_eq!(store.load(KIND, &id).unwrap().unwrap(), before);
    }

    #[test]
    fn unknown_investigation() {
        let (_, service) = service();
        let missing = EntityId::from(99);
        assert!(service.get_document(&missing).unwrap_err().is_not_found());
        assert!(service
            .add_step(&missing, StepPayload::new(), StepUuid::new("a"))
            .unwrap_err()
            .is_not_found());
        assert!(service.delete(&missing).unwrap_err().is_not_found());
    }

    #[test]
    fn malformed_stored_document() {
        let (store, service) = service();
        store
            .save(
                EntityRecord::new(KIND, EntityId::from(1), "Broken").with_document("not json"),
                WriteCondition::Unconditional,
            )
            .unwrap();

        let err = service
            .add_step(&EntityId::from(1), StepPayload::new(), StepUuid::new("a"))
            .unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(service.get_document(&EntityId::from(1)).unwrap(), "not json");
    }

    #[test]
    fn update_leaves_document_alone() {
        let (store, service) = service();
        let id = service.create("Case", EntityMetadata::new()).unwrap().entity_id().clone();
        service.add_step(&id, StepPayload::new(), StepUuid::new("a")).unwrap();
        let text = service.get_document(&id).unwrap();

        let doc = service
            .update(&id, MetadataChanges::new().with_label("Renamed").with_enabled(false))
            .unwrap();

        let record = store.load(KIND, &id).unwrap().unwrap();
        assert_eq!(record.label, "Renamed");
        assert!(!record.enabled);
        assert_eq!(record.document, text);
        assert_eq!(doc.investigation_label(), "Case");
    }

    #[test]
    fn update_rejects_oversized_label() {
        let store = Arc::new(MemoryStore::new());
        let service = InvestigationService::new(
            Arc::clone(&store),
            ServiceConfig::default().with_label_max_len(4),
        );
        let id = service.create("Case", EntityMetadata::new()).unwrap().entity_id().clone();

        let err = service
            .update(&id, MetadataChanges::new().with_label("Too long"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidMetadata(_)));
        assert_eq!(store.load(KIND, &id).unwrap().unwrap().label, "Case");
    }

    #[test]
    fn reject_stale_passes_without_contention() {
        let store = Arc::new(MemoryStore::new());
        let service = InvestigationService::new(
            Arc::clone(&store),
            ServiceConfig::default().with_write_policy(WritePolicy::RejectStale),
        );
        let id = service.create("Case", EntityMetadata::new()).unwrap().entity_id().clone();
        service.add_step(&id, StepPayload::new(), StepUuid::new("a")).unwrap();
        service.add_step(&id, StepPayload::new(), StepUuid::new("b")).unwrap();
        assert_eq!(service.get(&id).unwrap().steps().len(), 2);
    }

    #[test]
    fn mutation_errors_keep_their_kind() {
        let (_, service) = service();
        let id = service.create("Case", EntityMetadata::new()).unwrap().entity_id().clone();
        let err = service.delete_step(&id, StepUuid::new("x")).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Document(DocumentError::StepNotFound(_))
        ));
    }
}
