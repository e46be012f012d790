//! Report snapshot service
//!
//! A report is a one-time copy of an investigation's steps. After creation
//! it shares nothing with its source: later edits to the investigation do
//! not reach the report, and deleting the investigation leaves it intact.

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::records::Records;
use crate::store::{EntityStore, WriteCondition};
use crate::types::{EntityKind, EntityMetadata, EntitySummary, MetadataChanges};
use inquest_document::codec;
use inquest_document::{EntityId, InvestigationDocument, ReportDocument, StepDocument};
use std::sync::Arc;

const KIND: EntityKind = EntityKind::Report;

/// Report operations over an [`EntityStore`]
pub struct ReportService<S: ?Sized> {
    records: Records<S>,
}

impl<S: ?Sized> Clone for ReportService<S> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
        }
    }
}

impl<S: EntityStore + ?Sized> ReportService<S> {
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

    /// Snapshot an investigation into a new report
    ///
    /// The label defaults to the investigation's label. The investigation
    /// is read, never written.
    ///
    /// # Errors
    /// Returns [`ServiceError::NotFound`] for an unknown investigation,
    /// [`ServiceError::Document`] if its document is malformed and
    /// [`ServiceError::InvalidMetadata`] for a bad label
    pub fn create_from_investigation(
        &self,
        investigation_id: &EntityId,
        changes: MetadataChanges,
    ) -> Result<ReportDocument, ServiceError> {
        let (source, document) = self
            .records
            .load_document::<InvestigationDocument>(EntityKind::Investigation, investigation_id)?;
        let label = self
            .records
            .validate_label(changes.label.as_deref().unwrap_or(&source.label))?;
        let id = self.records.store().allocate_id(KIND)?;

        let report = ReportDocument::snapshot_of(
            &document,
            investigation_id.clone(),
            id.clone(),
            label.clone(),
        );
        let mut record = self
            .records
            .new_record(KIND, id, label, EntityMetadata::new());
        changes.apply_to(&mut record);
        record.document = codec::encode(&report);

        let saved = self.records.save(record, WriteCondition::Unconditional)?;
        tracing::info!(
            "Created report {} from investigation {} with {} steps",
            saved.id,
            investigation_id,
            report.steps().len()
        );
        Ok(report)
    }

    /// Stored document text, verbatim
    ///
    /// # Errors
    /// Returns [`ServiceError::NotFound`] if the report does not exist
    pub fn get_document(&self, id: &EntityId) -> Result<String, ServiceError> {
        Ok(self.records.load(KIND, id)?.document)
    }

    /// Decoded document
    ///
    /// # Errors
    /// Returns [`ServiceError::NotFound`] if the report does not exist,
    /// [`ServiceError::Document`] if the stored text is malformed
    pub fn get(&self, id: &EntityId) -> Result<ReportDocument, ServiceError> {
        Ok(self
            .records
            .load_document::<ReportDocument>(KIND, id)?
            .1)
    }

    /// All reports, ordered by id
    ///
    /// # Errors
    /// Returns [`ServiceError::Store`] if the store fails
    pub fn list(&self) -> Result<Vec<EntitySummary>, ServiceError> {
        let records = self.records.store().list(KIND)?;
        tracing::debug!("Listed {} reports", records.len());
        Ok(records.iter().map(|record| record.summary()).collect())
    }

    /// Replace the report document with caller-supplied text
    ///
    /// The text must decode as a report; it is then stored exactly as
    /// given. No step-level validation beyond decoding takes place.
    ///
    /// # Errors
    /// Returns [`ServiceError::NotFound`] for an unknown report and
    /// [`ServiceError::Document`] if `raw` is not a report document
    pub fn update_report_document(
        &self,
        id: &EntityId,
        raw: &str,
    ) -> Result<ReportDocument, ServiceError> {
        let mut record = self.records.load(KIND, id)?;
        let report: ReportDocument = codec::decode(raw)?;
        if report.entity_id() != id {
            tracing::warn!(
                "Report {} overwritten with a document claiming entity {}",
                id,
                report.entity_id()
            );
        }

        let condition = self.records.condition_for(&record);
        record.document = raw.to_string();
        let saved = self.records.save(record, condition)?;

        tracing::info!("Overwrote report {} document, revision {}", id, saved.revision);
        Ok(report)
    }

    /// Update report metadata; the document is left as stored
    ///
    /// # Errors
    /// Returns [`ServiceError::NotFound`] for an unknown report and
    /// [`ServiceError::InvalidMetadata`] for a bad label
    pub fn update(
        &self,
        id: &EntityId,
        changes: MetadataChanges,
    ) -> Result<EntitySummary, ServiceError> {
        let mut record = self.records.load(KIND, id)?;
        let condition = self.records.condition_for(&record);

        if let Some(label) = changes.label.as_deref() {
            record.label = self.records.validate_label(label)?;
        }
        changes.apply_to(&mut record);

        let saved = self.records.save(record, condition)?;
        tracing::info!("Updated report {} metadata: {}", id, saved.label);
        Ok(saved.summary())
    }

    /// Delete a report
    ///
    /// # Errors
    /// Returns [`ServiceError::NotFound`] if the report does not exist
    pub fn delete(&self, id: &EntityId) -> Result<(), ServiceError> {
        if !self.records.store().delete(KIND, id)? {
            return Err(ServiceError::not_found(KIND, id.clone()));
        }
        tracing::info!("Deleted report {}", id);
        Ok(())
    }
}
