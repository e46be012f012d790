//! Error types for the document services
//!
//! Provides error handling for:
//! - Missing investigations and reports
//! - Rejected metadata (labels)
//! - Document decode and step mutation failures
//! - Persistence failures, including stale conditional writes

use crate::types::{EntityKind, RecordVersion};
use inquest_document::{DocumentError, EntityId};

/// Main service error type
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Referenced investigation or report does not exist
    #[error("{kind} {id} not found")]
    NotFound {
        /// Kind of entity looked up
        kind: EntityKind,
        /// Requested id
        id: EntityId,
    },

    /// Metadata failed validation
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Document decode or step mutation failed
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Persistence gateway failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Build a not-found error
    #[inline]
    pub fn not_found(kind: EntityKind, id: impl Into<EntityId>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Check if the error reports an absent entity or step
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Document(DocumentError::StepNotFound(_))
        )
    }

    /// Check if the error reports a conflict with current state
    ///
    /// Duplicate step uuids, reorders that do not match the stored steps,
    /// and stale conditional writes.
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Document(err) => err.is_conflict(),
            Self::Store(err) => err.is_stale(),
            _ => false,
        }
    }

    /// Check if the stored document could not be decoded
    #[inline]
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Document(DocumentError::MalformedDocument(_)))
    }
}

/// Persistence gateway errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Conditional write found a different record state than the one loaded
    #[error("stale write to {kind} {id}: expected {expected}, found {}", describe(.actual))]
    StaleWrite {
        /// Kind of the entity written
        kind: EntityKind,
        /// Entity written
        id: EntityId,
        /// State the writer loaded
        expected: RecordVersion,
        /// State currently stored (`None` if the entity is gone)
        actual: Option<RecordVersion>,
    },

    /// Backend-specific failure
    #[error("backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Check if the error is a failed precondition
    #[inline]
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleWrite { .. })
    }
}

fn describe(actual: &Option<RecordVersion>) -> String {
    actual
        .as_ref()
        .map_or_else(|| "deleted entity".to_string(), ToString::to_string)
}
