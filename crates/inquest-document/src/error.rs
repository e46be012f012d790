//! Error types for step documents

use crate::ids::StepUuid;

/// Errors raised by the codec and the step collection engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// Stored text does not parse into the expected document shape
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// A step with this uuid already exists in the document
    #[error("duplicate step uuid: {0}")]
    DuplicateStepUuid(StepUuid),

    /// No step with this uuid exists in the document
    #[error("step not found: {0}")]
    StepNotFound(StepUuid),

    /// Reorder input does not carry exactly the current set of steps
    #[error("invalid reorder: missing {missing:?}, unexpected {unexpected:?}")]
    InvalidReorder {
        /// Uuids present in the document but absent (or under-represented) in the input
        missing: Vec<StepUuid>,
        /// Uuids present in the input but absent (or over-represented) in the document
        unexpected: Vec<StepUuid>,
    },
}

impl DocumentError {
    /// Build a malformed-document error from any displayable cause
    #[inline]
    pub fn malformed(cause: impl std::fmt::Display) -> Self {
        Self::MalformedDocument(cause.to_string())
    }

    /// Check if the error reports a conflict with the current document state
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DuplicateStepUuid(_) | Self::InvalidReorder { .. }
        )
    }
}
