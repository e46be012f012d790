//! Investigation and report documents
//!
//! Both documents embed a [`StepSequence`]. They differ in identity
//! semantics: an investigation owns its steps and is mutated step by step,
//! while a report is a one-time snapshot that carries a back-reference to
//! the investigation it was taken from.

use crate::ids::EntityId;
use crate::step::StepSequence;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Documents the step engine can operate on
///
/// This trait is **sealed**: the engine relies on write access to the step
/// sequence, which only the document types of this crate grant.
pub trait StepDocument: sealed::Sealed + Clone + std::fmt::Debug {
    /// Document kind, used in log fields and error messages
    const KIND: &'static str;

    /// Steps in sequence order
    fn steps(&self) -> &StepSequence;

    /// Identifier of the owning entity
    fn entity_id(&self) -> &EntityId;
}

#[allow(unreachable_pub)]
pub(crate) mod sealed {
    use crate::step::StepSequence;

    pub trait Sealed {
        fn steps_mut(&mut self) -> &mut StepSequence;
    }
}

/// Decoded form of an investigation's document field
#[derive(Debug, Clone, PartialEq)]
pub struct InvestigationDocument {
    entity_id: EntityId,
    uuid: Uuid,
    investigation_label: String,
    steps: StepSequence,
    extra: Map<String, Value>,
}

impl InvestigationDocument {
    /// Fresh document for a newly created investigation
    ///
    /// Assigns a new document uuid and starts with no steps.
    #[must_use]
    pub fn new(entity_id: EntityId, label: impl Into<String>) -> Self {
        Self::from_parts(entity_id, Uuid::new_v4(), label, StepSequence::new())
    }

    /// Assemble a document from its parts without renumbering
    #[must_use]
    pub fn from_parts(
        entity_id: EntityId,
        uuid: Uuid,
        label: impl Into<String>,
        steps: StepSequence,
    ) -> Self {
        Self {
            entity_id,
            uuid,
            investigation_label: label.into(),
            steps,
            extra: Map::new(),
        }
    }

    /// Verbatim clone into a new investigation
    ///
    /// Steps keep their uuids and ids. The copy gets a new document uuid and
    /// belongs to `entity_id`. Fields written by other clients are not
    /// carried over.
    #[must_use]
    pub fn duplicate_as(&self, entity_id: EntityId, label: impl Into<String>) -> Self {
        Self::from_parts(entity_id, Uuid::new_v4(), label, self.steps.clone())
    }

    /// Document uuid, fixed at creation
    #[inline]
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Label captured when the document was created
    #[inline]
    #[must_use]
    pub fn investigation_label(&self) -> &str {
        &self.investigation_label
    }

    /// Top-level fields this crate does not own, preserved verbatim
    #[inline]
    #[must_use]
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub(crate) fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }
}

impl sealed::Sealed for InvestigationDocument {
    fn steps_mut(&mut self) -> &mut StepSequence {
        &mut self.steps
    }
}

impl StepDocument for InvestigationDocument {
    const KIND: &'static str = "investigation";

    fn steps(&self) -> &StepSequence {
        &self.steps
    }

    fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }
}

/// Decoded form of a report's document field
///
/// Independent of its source once created: the steps are owned values,
/// not references into the investigation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    entity_id: EntityId,
    uuid: Option<Uuid>,
    report_label: String,
    investigation_id: EntityId,
    steps: StepSequence,
    extra: Map<String, Value>,
}

impl ReportDocument {
    /// Snapshot `source` into a new report owned by `entity_id`
    ///
    /// `investigation_id` is the id the source was loaded under; the
    /// `entityId` written inside the source document is not consulted.
    #[must_use]
    pub fn snapshot_of(
        source: &InvestigationDocument,
        investigation_id: EntityId,
        entity_id: EntityId,
        label: impl Into<String>,
    ) -> Self {
        Self::from_parts(
            entity_id,
            Some(Uuid::new_v4()),
            label,
            investigation_id,
            source.steps.clone(),
        )
    }

    /// Assemble a report from its parts without renumbering
    #[must_use]
    pub fn from_parts(
        entity_id: EntityId,
        uuid: Option<Uuid>,
        label: impl Into<String>,
        investigation_id: EntityId,
        steps: StepSequence,
    ) -> Self {
        Self {
            entity_id,
            uuid,
            report_label: label.into(),
            investigation_id,
            steps,
            extra: Map::new(),
        }
    }

    /// Document uuid (absent on report bodies written before uuids existed)
    #[inline]
    #[must_use]
    pub fn uuid(&self) -> Option<Uuid> {
        self.uuid
    }

    /// Report label
    #[inline]
    #[must_use]
    pub fn report_label(&self) -> &str {
        &self.report_label
    }

    /// Investigation the snapshot was taken from
    #[inline]
    #[must_use]
    pub fn investigation_id(&self) -> &EntityId {
        &self.investigation_id
    }

    /// Top-level fields this crate does not own, preserved verbatim
    #[inline]
    #[must_use]
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub(crate) fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }
}

impl sealed::Sealed for ReportDocument {
    fn steps_mut(&mut self) -> &mut StepSequence {
        &mut self.steps
    }
}

impl StepDocument for ReportDocument {
    const KIND: &'static str = "report";

    fn steps(&self) -> &StepSequence {
        &self.steps
    }

    fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }
}
