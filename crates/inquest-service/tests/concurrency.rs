use inquest_document::{codec, InvestigationDocument, StepDocument, StepUuid};
use inquest_service::{
    EntityKind, EntityStore, MetadataChanges, ServiceConfig, ServiceError, StoreError,
    WriteCondition, WritePolicy,
};
use inquest_test_utils::{create_investigation_with_steps, setup_services, titled};
use std::sync::Arc;

#[test]
fn reject_stale_detects_interleaved_writer() {
    let services =
        setup_services(ServiceConfig::default().with_write_policy(WritePolicy::RejectStale));
    let id = create_investigation_with_steps(&services, "Case", &["a"]);

    // Writer B loads, writer A commits, writer B commits its stale copy.
    let stale = services.store.load(EntityKind::Investigation, &id).unwrap().unwrap();
    services
        .investigations
        .add_step(&id, titled("b"), StepUuid::new("b"))
        .unwrap();

    let condition = WriteCondition::unchanged_from(&stale);
    let err = services.store.save(stale, condition).unwrap_err();
    assert!(matches!(err, StoreError::StaleWrite { .. }));
    assert_eq!(services.investigations.get(&id).unwrap().steps().len(), 2);
}

#[test]
fn reject_stale_protects_metadata_only_change() {
    let services =
        setup_services(ServiceConfig::default().with_write_policy(WritePolicy::RejectStale));
    let id = create_investigation_with_steps(&services, "Case", &["a"]);

    let stale = services.store.load(EntityKind::Investigation, &id).unwrap().unwrap();
    services
        .investigations
        .update(&id, MetadataChanges::new().with_label("Renamed"))
        .unwrap();

    let condition = WriteCondition::unchanged_from(&stale);
    let err = services.store.save(stale, condition).unwrap_err();
    assert!(err.is_stale());

    let listed = services.investigations.list().unwrap();
    assert_eq!(listed[0].label, "Renamed");
}

#[test]
fn last_write_wins_can_lose_a_step() {
    let services = setup_services(ServiceConfig::default());
    let id = create_investigation_with_steps(&services, "Case", &["a"]);

    let stale = services.store.load(EntityKind::Investigation, &id).unwrap().unwrap();
    services
        .investigations
        .add_step(&id, titled("b"), StepUuid::new("b"))
        .unwrap();
    services.store.save(stale, WriteCondition::Unconditional).unwrap();

    let doc: InvestigationDocument =
        codec::decode(&services.investigations.get_document(&id).unwrap()).unwrap();
    assert_eq!(doc.steps().len(), 1);
}

#[test]
fn parallel_adds_under_reject_stale_never_corrupt() {
    let services = Arc::new(setup_services(
        ServiceConfig::default().with_write_policy(WritePolicy::RejectStale),
    ));
    let id = create_investigation_with_steps(&services, "Case", &[]);

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let services = Arc::clone(&services);
            let id = id.clone();
            std::thread::spawn(move || {
                let uuid = StepUuid::new(format!("s{n}"));
                loop {
                    match services.investigations.add_step(&id, titled("x"), uuid.clone()) {
                        Ok(_) => break,
                        Err(err) if err.is_conflict() => continue,
                        Err(err) => panic!("unexpected {err}"),
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let doc = services.investigations.get(&id).unwrap();
    assert_eq!(doc.steps().len(), 8);
    assert!(doc.steps().is_contiguous());
    assert!(doc.steps().has_unique_uuids());
}

#[test]
fn stale_error_surfaces_as_conflict() {
    let err = ServiceError::from(StoreError::Backend("down".to_string()));
    assert!(!err.is_conflict());
    assert_eq!(err.to_string(), "store error: backend failure: down");
}
