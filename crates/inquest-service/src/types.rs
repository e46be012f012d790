//! Core types for the document services
//!
//! Defines:
//! - Entity kinds and stored records
//! - Metadata supplied on create and update
//! - Summaries returned by list operations

use chrono::{DateTime, Utc};
use inquest_document::{DocumentHash, EntityId};
use serde::{Deserialize, Serialize};

/// Kind of entity held by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Mutable investigation with a step document
    Investigation,
    /// Immutable-by-convention snapshot of an investigation
    Report,
}

impl EntityKind {
    /// Stable name for logs and errors
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Investigation => "investigation",
            Self::Report => "report",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted entity: metadata plus the document text field
///
/// The store treats `document` as opaque text. `revision` and `changed` are
/// maintained by the store on every save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Entity id
    pub id: EntityId,
    /// Entity kind
    pub kind: EntityKind,
    /// Human label
    pub label: String,
    /// Free-text description
    pub description: Option<String>,
    /// Published / enabled flag
    pub enabled: bool,
    /// Owning user
    pub owner: Option<String>,
    /// Encoded document
    pub document: String,
    /// Creation time
    pub created: DateTime<Utc>,
    /// Last save time
    pub changed: DateTime<Utc>,
    /// Save counter, starts at 1
    pub revision: u64,
}

impl EntityRecord {
    /// Create an unsaved record
    #[must_use]
    pub fn new(kind: EntityKind, id: EntityId, label: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            kind,
            label: label.into(),
            description: None,
            enabled: true,
            owner: None,
            document: String::new(),
            created: now,
            changed: now,
            revision: 0,
        }
    }

    /// With document text
    #[inline]
    #[must_use]
    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = document.into();
        self
    }

    /// Revision and document fingerprint as currently held
    #[inline]
    #[must_use]
    pub fn version(&self) -> RecordVersion {
        RecordVersion {
            revision: self.revision,
            hash: DocumentHash::of_text(&self.document),
        }
    }

    /// Summary for list responses
    #[must_use]
    pub fn summary(&self) -> EntitySummary {
        EntitySummary {
            entity_id: self.id.clone(),
            label: self.label.clone(),
            revision_id: self.revision,
            created_time: self.created,
            changed_time: self.changed,
            enabled: self.enabled,
            owner: self.owner.clone(),
            document: self.document.clone(),
        }
    }
}

/// Identity of one saved state of a record
///
/// Two loads see the same state only if both fields match: the revision
/// catches metadata-only saves and A-B-A document edits, the hash catches
/// stores that rewrite text without bumping the revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordVersion {
    /// Save counter
    pub revision: u64,
    /// Fingerprint of the document text
    pub hash: DocumentHash,
}

impl std::fmt::Display for RecordVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "r{}@{}", self.revision, self.hash.short())
    }
}

/// Metadata for a new entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityMetadata {
    /// Free-text description
    pub description: Option<String>,
    /// Enabled flag; the configured default applies when absent
    pub enabled: Option<bool>,
    /// Owning user
    pub owner: Option<String>,
}

impl EntityMetadata {
    /// Create empty metadata
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With enabled flag
    #[inline]
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// With owner
    #[inline]
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

/// Partial metadata update; `None` leaves a field as it is
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataChanges {
    /// New label
    pub label: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New enabled flag
    pub enabled: Option<bool>,
    /// New owner
    pub owner: Option<String>,
}

impl MetadataChanges {
    /// Create an empty change set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With label
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With enabled flag
    #[inline]
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// With owner
    #[inline]
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Check for an empty change set
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.description.is_none()
            && self.enabled.is_none()
            && self.owner.is_none()
    }

    /// Copy every present field onto `record`, label excluded
    pub(crate) fn apply_to(self, record: &mut EntityRecord) {
        if let Some(description) = self.description {
            record.description = Some(description);
        }
        if let Some(enabled) = self.enabled {
            record.enabled = enabled;
        }
        if let Some(owner) = self.owner {
            record.owner = Some(owner);
        }
    }
}

/// List entry for an investigation or report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySummary {
    /// Entity id
    pub entity_id: EntityId,
    /// Human label
    pub label: String,
    /// Current revision
    pub revision_id: u64,
    /// Creation time
    pub created_time: DateTime<Utc>,
    /// Last save time
    pub changed_time: DateTime<Utc>,
    /// Enabled flag
    pub enabled: bool,
    /// Owning user
    pub owner: Option<String>,
    /// Encoded document
    #[serde(rename = "jsonString")]
    pub document: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display() {
        assert_eq!(EntityKind::Investigation.to_string(), "investigation");
        assert_eq!(EntityKind::Report.as_str(), "report");
    }

    #[test]
    fn changes_skip_absent_fields() {
        let mut record = EntityRecord::new(EntityKind::Report, EntityId::from(1), "R");
        record.owner = Some("alice".into());

        MetadataChanges::new()
            .with_enabled(false)
            .with_label("ignored here")
            .apply_to(&mut record);

        assert!(!record.enabled);
        assert_eq!(record.owner.as_deref(), Some("alice"));
        assert_eq!(record.label, "R");
    }

    #[test]
    fn summary_uses_list_field_names() {
        let record = EntityRecord::new(EntityKind::Investigation, EntityId::from(3), "Case")
            .with_document("{}");
        let value = serde_json::to_value(record.summary()).unwrap();

        assert_eq!(value["entityId"], 3);
        assert_eq!(value["label"], "Case");
        assert_eq!(value["jsonString"], "{}");
        assert!(value.get("revisionId").is_some());
        assert!(value.get("createdTime").is_some());
    }

    #[test]
    fn version_tracks_revision_and_text() {
        let mut record = EntityRecord::new(EntityKind::Report, EntityId::from(1), "R")
            .with_document("{}");
        let first = record.version();

        record.revision += 1;
        assert_ne!(record.version(), first);
        assert_eq!(record.version().hash, first.hash);
        assert!(record.version().to_string().starts_with("r1@"));
    }

    #[test]
    fn empty_changes() {
        assert!(MetadataChanges::new().is_empty());
        assert!(!MetadataChanges::new().with_owner("bob").is_empty());
    }
}
