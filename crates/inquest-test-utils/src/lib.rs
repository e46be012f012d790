//! Testing utilities for the Inquest workspace
//!
//! Shared fixtures and helpers.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use inquest_document::{EntityId, StepDocument, StepPayload, StepUuid};
use inquest_service::{
    EntityMetadata, InvestigationService, MemoryStore, ReportService, ServiceConfig,
};
use std::sync::Arc;

/// Both services over one shared in-memory store
pub struct TestServices {
    pub store: Arc<MemoryStore>,
    pub investigations: InvestigationService<MemoryStore>,
    pub reports: ReportService<MemoryStore>,
}

pub fn setup_services(config: ServiceConfig) -> TestServices {
    let store = Arc::new(MemoryStore::new());
    TestServices {
        investigations: InvestigationService::new(Arc::clone(&store), config.clone()),
        reports: ReportService::new(Arc::clone(&store), config),
        store,
    }
}

pub fn setup_default_services() -> TestServices {
    setup_services(ServiceConfig::default())
}

pub fn titled(title: &str) -> StepPayload {
    StepPayload::new().with("title", title)
}

/// Stored investigation whose steps carry `uuids`, titled after their uuid
pub fn create_investigation_with_steps(
    services: &TestServices,
    label: &str,
    uuids: &[&str],
) -> EntityId {
    let id = services
        .investigations
        .create(label, EntityMetadata::new())
        .unwrap()
        .entity_id()
        .clone();
    for uuid in uuids {
        services
            .investigations
            .add_step(&id, titled(uuid), StepUuid::new(*uuid))
            .unwrap();
    }
    id
}

/// `(stepUuid, id)` pairs in sequence order
pub fn layout<D: StepDocument>(doc: &D) -> Vec<(String, u32)> {
    doc.steps()
        .iter()
        .map(|step| (step.step_uuid().to_string(), step.id()))
        .collect()
}

pub fn pairs(expected: &[(&str, u32)]) -> Vec<(String, u32)> {
    expected
        .iter()
        .map(|(uuid, id)| ((*uuid).to_string(), *id))
        .collect()
}
