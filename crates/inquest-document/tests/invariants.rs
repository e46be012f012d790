use inquest_document::codec::{decode, encode};
use inquest_document::engine::{add_step, delete_step, reorder_steps, update_step};
use inquest_document::{
    DocumentError, EntityId, InvestigationDocument, Step, StepDocument, StepPayload,
    StepSequence, StepUuid,
};
use proptest::prelude::*;
use serde_json::{json, Value};

#[derive(Debug, Clone)]
enum Op {
    Add(u8, StepPayload),
    Update(u8, StepPayload),
    Delete(u8),
    Reorder(Vec<usize>),
}

fn uuid(n: u8) -> StepUuid {
    StepUuid::new(format!("s{n}"))
}

fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        "[a-z ]{0,12}".prop_map(Value::from),
        Just(Value::Null),
    ]
}

fn payload() -> impl Strategy<Value = StepPayload> {
    prop::collection::vec(("[a-z]{1,6}", json_leaf()), 0..4).prop_map(|fields| {
        fields
            .into_iter()
            .fold(StepPayload::new(), |p, (k, v)| p.with(k, v))
    })
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u8..8, payload()).prop_map(|(n, p)| Op::Add(n, p)),
        1 => (0u8..8, payload()).prop_map(|(n, p)| Op::Update(n, p)),
        2 => (0u8..8).prop_map(Op::Delete),
        1 => prop::collection::vec(any::<usize>(), 0..8).prop_map(Op::Reorder),
    ]
}

/// Deterministic permutation of the current steps driven by `keys`
fn permute(steps: &StepSequence, keys: &[usize]) -> StepSequence {
    let mut indexed: Vec<(usize, usize, Step)> = steps
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, s)| (keys.get(i).copied().unwrap_or(i), i, s))
        .collect();
    indexed.sort_by_key(|(k, i, _)| (*k, *i));
    indexed.into_iter().map(|(_, _, s)| s).collect()
}

fn apply(doc: &InvestigationDocument, op: Op) -> Result<InvestigationDocument, DocumentError> {
    match op {
        Op::Add(n, p) => add_step(doc, p, uuid(n)),
        Op::Update(n, p) => update_step(doc, &uuid(n), p),
        Op::Delete(n) => delete_step(doc, &uuid(n)),
        Op::Reorder(keys) => reorder_steps(doc, permute(doc.steps(), &keys)),
    }
}

fn uuids(doc: &InvestigationDocument) -> Vec<String> {
    doc.steps().iter().map(|s| s.step_uuid().to_string()).collect()
}

proptest! {
    #[test]
    fn prop_ids_contiguous_and_uuids_unique(ops in prop::collection::vec(op(), 0..40)) {
        let mut doc = InvestigationDocument::new(EntityId::from(1), "Case");
        for op in ops {
            match apply(&doc, op.clone()) {
                Ok(next) => {
                    prop_assert!(next.steps().is_contiguous());
                    prop_assert!(next.steps().has_unique_uuids());
                    doc = next;
                }
                Err(DocumentError::DuplicateStepUuid(u)) => {
                    prop_assert!(doc.steps().contains(&u));
                }
                Err(DocumentError::StepNotFound(u)) => {
                    prop_assert!(!doc.steps().contains(&u));
                }
                Err(other) => prop_assert!(false, "unexpected error {other:?} for {op:?}"),
            }
        }
    }

    #[test]
    fn prop_untouched_steps_keep_relative_order(
        ops in prop::collection::vec(op(), 0..20),
        victim in 0u8..8,
    ) {
        let mut doc = InvestigationDocument::new(EntityId::from(1), "Case");
        for op in ops {
            if let Ok(next) = apply(&doc, op) {
                doc = next;
            }
        }

        let before = uuids(&doc);
        if let Ok(after) = delete_step(&doc, &uuid(victim)) {
            let expected: Vec<String> = before
                .into_iter()
                .filter(|u| *u != uuid(victim).to_string())
                .collect();
            prop_assert_eq!(uuids(&after), expected);
        }
    }

    #[test]
    fn prop_round_trip(ops in prop::collection::vec(op(), 0..30)) {
        let mut doc = InvestigationDocument::new(EntityId::from(42), "Round trip");
        for op in ops {
            if let Ok(next) = apply(&doc, op) {
                doc = next;
            }
        }
        let back: InvestigationDocument = decode(&encode(&doc)).unwrap();
        prop_assert_eq!(back, doc);
    }

    #[test]
    fn prop_reorder_with_wrong_multiset_fails(n in 1u8..6, extra in 0u8..8, drop_one in any::<bool>()) {
        let doc = (0..n).fold(InvestigationDocument::new(EntityId::from(1), "Case"), |d, i| {
            add_step(&d, StepPayload::new(), uuid(i)).unwrap()
        });

        let mut incoming: Vec<Step> = doc.steps().iter().cloned().collect();
        if drop_one {
            incoming.pop();
        } else {
            incoming.push(Step::new(uuid(extra), StepPayload::new()));
        }

        let result = reorder_steps(&doc, incoming.into());
        prop_assert!(
            matches!(result, Err(DocumentError::InvalidReorder { .. })),
            "expected InvalidReorder"
        );
    }
}

#[test]
fn empty_document_round_trips() {
    let doc = InvestigationDocument::new(EntityId::from("inv-1"), "");
    let back: InvestigationDocument = decode(&encode(&doc)).unwrap();
    assert_eq!(back, doc);
}

#[test]
fn add_step_matches_stored_shape() {
    let doc = InvestigationDocument::new(EntityId::from(1), "Case");
    let doc = add_step(&doc, StepPayload::new().with("title", "x"), StepUuid::new("s1")).unwrap();

    let stored: Value = serde_json::from_str(&encode(&doc)).unwrap();
    assert_eq!(stored["steps"], json!([{"stepUuid": "s1", "id": 1, "title": "x"}]));
}

#[test]
fn delete_middle_of_three() {
    let doc = ["a", "b", "c"].iter().fold(
        InvestigationDocument::new(EntityId::from(1), "Case"),
        |d, u| add_step(&d, StepPayload::new(), StepUuid::new(*u)).unwrap(),
    );
    let doc = delete_step(&doc, &StepUuid::new("b")).unwrap();

    let stored: Value = serde_json::from_str(&encode(&doc)).unwrap();
    assert_eq!(
        stored["steps"],
        json!([{"stepUuid": "a", "id": 1}, {"stepUuid": "c", "id": 2}])
    );
}
