//! Step records and the ordered step sequence
//!
//! A [`Step`] pairs a stable [`StepUuid`] with a derived 1-based position
//! (`id`) and an opaque [`StepPayload`]. [`StepSequence`] is the ordered
//! collection stored in a document; its order is the investigation's step
//! order.

use crate::ids::StepUuid;
use serde_json::{Map, Value};

/// Wire key of the step identity field
pub const STEP_UUID_KEY: &str = "stepUuid";

/// Wire key of the derived position field
pub const STEP_ID_KEY: &str = "id";

/// Caller-defined step content
///
/// An open key/value map. The engine never inspects it; the two keys owned
/// by the step record itself (`stepUuid`, `id`) are stripped on
/// construction so they cannot shadow the record fields on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepPayload(Map<String, Value>);

impl StepPayload {
    /// Create empty payload
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build payload from a JSON map, dropping the record-owned keys
    #[must_use]
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        map.remove(STEP_UUID_KEY);
        map.remove(STEP_ID_KEY);
        Self(map)
    }

    /// Insert a field (record-owned keys are ignored)
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != STEP_UUID_KEY && key != STEP_ID_KEY {
            self.0.insert(key, value.into());
        }
        self
    }

    /// Look up a field
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check for an empty payload
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Borrow the underlying map
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Unwrap into the underlying map
    #[inline]
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl TryFrom<Value> for StepPayload {
    type Error = crate::DocumentError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            other => Err(crate::DocumentError::malformed(format!(
                "step payload must be an object, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

/// One ordered element of a document
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    step_uuid: StepUuid,
    id: u32,
    payload: StepPayload,
}

impl Step {
    /// Create a step with no position yet
    ///
    /// The position is assigned when the step enters a document.
    #[inline]
    #[must_use]
    pub fn new(step_uuid: impl Into<StepUuid>, payload: StepPayload) -> Self {
        Self {
            step_uuid: step_uuid.into(),
            id: 0,
            payload,
        }
    }

    /// Create a step with an explicit position (decoding, fixtures)
    #[inline]
    #[must_use]
    pub fn with_id(step_uuid: impl Into<StepUuid>, id: u32, payload: StepPayload) -> Self {
        Self {
            step_uuid: step_uuid.into(),
            id,
            payload,
        }
    }

    /// Stable identity
    #[inline]
    #[must_use]
    pub fn step_uuid(&self) -> &StepUuid {
        &self.step_uuid
    }

    /// 1-based position, recomputed after every structural change
    #[inline]
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Step content
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &StepPayload {
        &self.payload
    }

    pub(crate) fn set_payload(&mut self, payload: StepPayload) {
        self.payload = payload;
    }
}

/// Ordered collection of steps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepSequence(Vec<Step>);

impl StepSequence {
    /// Create empty sequence
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check for no steps
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in sequence order
    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.0.iter()
    }

    /// Borrow as slice
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Step] {
        &self.0
    }

    /// Index of the step carrying `uuid`
    #[must_use]
    pub fn position(&self, uuid: &StepUuid) -> Option<usize> {
        self.0.iter().position(|step| step.step_uuid == *uuid)
    }

    /// Step carrying `uuid`
    #[must_use]
    pub fn get(&self, uuid: &StepUuid) -> Option<&Step> {
        self.0.iter().find(|step| step.step_uuid == *uuid)
    }

    /// Check membership by uuid
    #[inline]
    #[must_use]
    pub fn contains(&self, uuid: &StepUuid) -> bool {
        self.position(uuid).is_some()
    }

    /// Uuids in sequence order
    #[must_use]
    pub fn uuids(&self) -> Vec<&StepUuid> {
        self.0.iter().map(Step::step_uuid).collect()
    }

    /// Recompute every `id` as `1 + index`
    ///
    /// O(n). Runs unconditionally at the end of every engine operation.
    #[must_use]
    pub fn renumbered(mut self) -> Self {
        for (index, step) in self.0.iter_mut().enumerate() {
            step.id = u32::try_from(index + 1).unwrap_or(u32::MAX);
        }
        self
    }

    /// Check that ids run exactly `1..=len` in order
    #[must_use]
    pub fn is_contiguous(&self) -> bool {
        self.0
            .iter()
            .enumerate()
            .all(|(index, step)| step.id as usize == index + 1)
    }

    /// Check that no uuid appears twice
    #[must_use]
    pub fn has_unique_uuids(&self) -> bool {
        self.first_repeated().is_none()
    }

    /// First uuid seen a second time, in sequence order
    #[must_use]
    pub fn first_repeated(&self) -> Option<&StepUuid> {
        let mut seen = std::collections::HashSet::with_capacity(self.0.len());
        self.0
            .iter()
            .map(Step::step_uuid)
            .find(|uuid| !seen.insert(*uuid))
    }

    pub(crate) fn push(&mut self, step: Step) {
        self.0.push(step);
    }

    /// Drop every step carrying `uuid`, returning how many were removed
    pub(crate) fn remove_all(&mut self, uuid: &StepUuid) -> usize {
        let before = self.0.len();
        self.0.retain(|step| step.step_uuid != *uuid);
        before - self.0.len()
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Step> {
        self.0.get_mut(index)
    }
}

impl From<Vec<Step>> for StepSequence {
    fn from(steps: Vec<Step>) -> Self {
        Self(steps)
    }
}

impl FromIterator<Step> for StepSequence {
    fn from_iter<I: IntoIterator<Item = Step>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for StepSequence {
    type Item = Step;
    type IntoIter = std::vec::IntoIter<Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a StepSequence {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_strips_record_keys() {
        let map = json!({"stepUuid": "x", "id": 9, "title": "t"});
        let payload = StepPayload::try_from(map).unwrap();
        assert_eq!(payload.len(), 1);
        assert_eq!(payload.get("title"), Some(&json!("t")));
    }

    #[test]
    fn payload_with_ignores_record_keys() {
        let payload = StepPayload::new().with("id", 4).with("kind", "note");
        assert_eq!(payload.len(), 1);
        assert!(payload.get("id").is_none());
    }

    #[test]
    fn payload_rejects_non_object() {
        assert!(StepPayload::try_from(json!([1, 2])).is_err());
    }

    #[test]
    fn renumbered_assigns_positions() {
        let seq: StepSequence = vec![
            Step::with_id("a", 7, StepPayload::new()),
            Step::with_id("b", 7, StepPayload::new()),
            Step::new("c", StepPayload::new()),
        ]
        .into();
        assert!(!seq.is_contiguous());

        let seq = seq.renumbered();
        let ids: Vec<u32> = seq.iter().map(Step::id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(seq.is_contiguous());
    }

    #[test]
    fn lookup_by_uuid() {
        let seq: StepSequence = vec![
            Step::new("a", StepPayload::new()),
            Step::new("b", StepPayload::new()),
        ]
        .into();
        assert_eq!(seq.position(&StepUuid::new("b")), Some(1));
        assert!(seq.contains(&StepUuid::new("a")));
        assert!(seq.get(&StepUuid::new("z")).is_none());
        assert!(seq.has_unique_uuids());
    }

    #[test]
    fn duplicate_uuids_detected() {
        let seq: StepSequence = vec![
            Step::new("a", StepPayload::new()),
            Step::new("a", StepPayload::new()),
        ]
        .into();
        assert!(!seq.has_unique_uuids());
        assert_eq!(seq.first_repeated(), Some(&StepUuid::new("a")));
    }

    #[test]
    fn remove_all_drops_every_copy() {
        let mut seq: StepSequence = vec![
            Step::new("a", StepPayload::new()),
            Step::new("b", StepPayload::new()),
            Step::new("a", StepPayload::new()),
        ]
        .into();
        assert_eq!(seq.remove_all(&StepUuid::new("a")), 2);
        assert_eq!(seq.uuids(), vec![&StepUuid::new("b")]);
    }

    #[test]
    fn empty_sequence_is_contiguous() {
        assert!(StepSequence::new().renumbered().is_contiguous());
    }
}
