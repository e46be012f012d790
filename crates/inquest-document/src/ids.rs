//! Identifier newtypes shared by investigation and report documents

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Stable identity of a step for the lifetime of its document
///
/// Assigned by the caller when the step is added. Never reused once the
/// step is deleted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepUuid(String);

impl StepUuid {
    /// Wrap a caller-supplied token
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the token
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StepUuid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StepUuid {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for StepUuid {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier of an owning entity, assigned by the persistence collaborator
///
/// Stores hand out either integers or strings; both shapes survive a
/// decode/encode cycle unchanged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    /// Integer key (serial primary key)
    Numeric(u64),
    /// Opaque string key
    Text(String),
}

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self::Numeric(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}
