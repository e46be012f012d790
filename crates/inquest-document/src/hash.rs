//! Document fingerprints
//!
//! [`DocumentHash`] is the BLAKE3 hash of a document's stored text. The
//! persistence layer uses it as a precondition token: a write conditioned on
//! the hash that was loaded fails if another writer got there first.

use crate::codec::{encode, DocumentCodec};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A 32-byte fingerprint of stored document text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentHash([u8; 32]);

impl DocumentHash {
    /// Wrap raw bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Fingerprint raw stored text
    #[inline]
    #[must_use]
    pub fn of_text(raw: &str) -> Self {
        Self(*blake3::hash(raw.as_bytes()).as_bytes())
    }

    /// Fingerprint a document by its encoded form
    #[inline]
    #[must_use]
    pub fn of_document<D: DocumentCodec>(document: &D) -> Self {
        Self::of_text(&encode(document))
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for DocumentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Errors parsing a hex fingerprint
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// Wrong byte length
    #[error("invalid hash length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Required length
        expected: usize,
        /// Decoded length
        actual: usize,
    },

    /// Not hex
    #[error("invalid hex encoding: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

impl FromStr for DocumentHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| HashError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self(bytes))
    }
}
