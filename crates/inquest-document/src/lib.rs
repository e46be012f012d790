//! Inquest step documents
//!
//! An investigation stores its ordered steps as one JSON document inside a
//! single text field. This crate is the only correct way to edit that
//! document.
//!
//! # Core Concepts
//!
//! - [`InvestigationDocument`] / [`ReportDocument`]: decoded document fields
//! - [`Step`], [`StepPayload`], [`StepSequence`]: ordered step records
//! - [`codec`]: stored text to document and back
//! - [`engine`]: add/update/reorder/delete preserving identity and ordering
//! - [`DocumentHash`]: fingerprint of stored text for conditional writes
//!
//! # Example
//!
//! ```rust
//! use inquest_document::{codec, engine, EntityId, InvestigationDocument, StepPayload, StepUuid};
//!
//! let doc = InvestigationDocument::new(EntityId::from(1), "Burglary on 5th");
//! let doc = engine::add_step(&doc, StepPayload::new().with("title", "Canvass"), StepUuid::new("s1"))?;
//!
//! let stored = codec::encode(&doc);
//! let back: InvestigationDocument = codec::decode(&stored)?;
//! assert_eq!(back, doc);
//! # Ok::<(), inquest_document::DocumentError>(())
//! ```

#![warn(unreachable_pub)]

pub mod codec;
mod document;
pub mod engine;
mod error;
mod hash;
mod ids;
mod step;

pub use codec::DocumentCodec;
pub use document::{InvestigationDocument, ReportDocument, StepDocument};
pub use engine::StepMutation;
pub use error::DocumentError;
pub use hash::{DocumentHash, HashError};
pub use ids::{EntityId, StepUuid};
pub use step::{Step, StepPayload, StepSequence, STEP_ID_KEY, STEP_UUID_KEY};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
