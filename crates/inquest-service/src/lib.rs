//! Inquest document services
//!
//! Investigation and report operations over an [`EntityStore`]. Step
//! documents are decoded and mutated with `inquest-document`; this crate
//! owns loading, validation and persistence.
//!
//! # Example
//!
//! ```rust
//! use inquest_service::{
//!     EntityMetadata, InvestigationService, MemoryStore, MetadataChanges, ReportService,
//!     ServiceConfig,
//! };
//! use inquest_document::{StepDocument, StepPayload, StepUuid};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let investigations = InvestigationService::new(Arc::clone(&store), ServiceConfig::default());
//! let reports = ReportService::new(store, ServiceConfig::default());
//!
//! let id = investigations.create("Burglary on 5th", EntityMetadata::new())?.entity_id().clone();
//! investigations.add_step(&id, StepPayload::new().with("title", "Canvass"), StepUuid::new("s1"))?;
//!
//! let report = reports.create_from_investigation(&id, MetadataChanges::new())?;
//! assert_eq!(report.steps().len(), 1);
//! # Ok::<(), inquest_service::ServiceError>(())
//! ```

#![warn(unreachable_pub)]

pub mod config;
mod error;
mod investigation;
mod records;
mod report;
pub mod store;
pub mod telemetry;
mod types;

pub use config::{ConfigError, InquestConfig, ServiceConfig, TelemetryConfig, WritePolicy};
pub use error::{ServiceError, StoreError};
pub use investigation::InvestigationService;
pub use report::ReportService;
pub use store::{EntityStore, MemoryStore, WriteCondition};
pub use telemetry::{init_tracing, TelemetryError};
pub use types::{
    EntityKind, EntityMetadata, EntityRecord, EntitySummary, MetadataChanges, RecordVersion,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
