//! Step Record Codec
//!
//! Converts the opaque document text stored on an entity to and from the
//! in-memory documents. The wire shape is the storage contract:
//!
//! ```json
//! {"entityId": 7, "uuid": "…", "investigationLabel": "…",
//!  "steps": [{"stepUuid": "s1", "id": 1, "title": "…"}]}
//! ```
//!
//! The codec checks structure only. It does not renumber, and it does not
//! reject duplicate step uuids; invariant enforcement belongs to the engine.

use crate::document::{InvestigationDocument, ReportDocument, StepDocument};
use crate::error::DocumentError;
use crate::ids::{EntityId, StepUuid};
use crate::step::{json_type_name, Step, StepPayload, StepSequence, STEP_ID_KEY, STEP_UUID_KEY};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Wire key of the owning entity id
pub const ENTITY_ID_KEY: &str = "entityId";
/// Wire key of the document uuid
pub const UUID_KEY: &str = "uuid";
/// Wire key of the investigation label
pub const INVESTIGATION_LABEL_KEY: &str = "investigationLabel";
/// Wire key of the report label
pub const REPORT_LABEL_KEY: &str = "reportLabel";
/// Wire key of a report's source investigation
pub const INVESTIGATION_ID_KEY: &str = "investigationId";
/// Wire key of the step array
pub const STEPS_KEY: &str = "steps";

/// Documents with a JSON object representation
pub trait DocumentCodec: StepDocument + Sized {
    /// Build the document from a parsed top-level object
    ///
    /// # Errors
    /// Returns [`DocumentError::MalformedDocument`] if a field has the wrong shape
    fn from_object(object: Map<String, Value>) -> Result<Self, DocumentError>;

    /// Produce the top-level object, steps in sequence order
    fn to_object(&self) -> Map<String, Value>;
}

/// Decode stored document text
///
/// # Errors
/// Returns [`DocumentError::MalformedDocument`] if the text is empty, is not
/// JSON, is not an object, or carries a `steps` value that is not an array
/// of objects each holding a `stepUuid`
pub fn decode<D: DocumentCodec>(raw: &str) -> Result<D, DocumentError> {
    if raw.trim().is_empty() {
        return Err(DocumentError::malformed("empty document text"));
    }
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| DocumentError::malformed(format!("invalid JSON: {e}")))?;
    match value {
        Value::Object(object) => D::from_object(object),
        other => Err(DocumentError::malformed(format!(
            "document must be an object, got {}",
            json_type_name(&other)
        ))),
    }
}

/// Encode a document to its stored text
///
/// Total: building a JSON value and printing it cannot fail.
#[must_use]
pub fn encode<D: DocumentCodec>(document: &D) -> String {
    Value::Object(document.to_object()).to_string()
}

/// Decode a step array (for example a full reorder list supplied by a caller)
///
/// # Errors
/// Returns [`DocumentError::MalformedDocument`] if `value` is not an array
/// of step objects
pub fn decode_steps(value: Value) -> Result<StepSequence, DocumentError> {
    match value {
        Value::Null => Ok(StepSequence::new()),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| decode_step(index, item))
            .collect(),
        other => Err(DocumentError::malformed(format!(
            "{STEPS_KEY} must be an array, got {}",
            json_type_name(&other)
        ))),
    }
}

/// Encode steps as a JSON array in sequence order
#[must_use]
pub fn encode_steps(steps: &StepSequence) -> Value {
    Value::Array(steps.iter().map(encode_step).collect())
}

fn decode_step(index: usize, value: Value) -> Result<Step, DocumentError> {
    let mut object = match value {
        Value::Object(object) => object,
        other => {
            return Err(DocumentError::malformed(format!(
                "step {index} must be an object, got {}",
                json_type_name(&other)
            )))
        }
    };

    let step_uuid = match object.remove(STEP_UUID_KEY) {
        Some(Value::String(s)) if !s.is_empty() => StepUuid::new(s),
        Some(Value::String(_)) => {
            return Err(DocumentError::malformed(format!(
                "step {index} has an empty {STEP_UUID_KEY}"
            )))
        }
        Some(other) => {
            return Err(DocumentError::malformed(format!(
                "step {index} {STEP_UUID_KEY} must be a string, got {}",
                json_type_name(&other)
            )))
        }
        None => {
            return Err(DocumentError::malformed(format!(
                "step {index} is missing {STEP_UUID_KEY}"
            )))
        }
    };

    // Derived field: anything but a valid position decodes as 0 and is
    // reassigned by the next mutation.
    let id = object
        .remove(STEP_ID_KEY)
        .as_ref()
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0);

    Ok(Step::with_id(step_uuid, id, StepPayload::from_map(object)))
}

fn encode_step(step: &Step) -> Value {
    let mut object = Map::with_capacity(step.payload().len() + 2);
    object.insert(
        STEP_UUID_KEY.to_string(),
        Value::String(step.step_uuid().as_str().to_string()),
    );
    object.insert(STEP_ID_KEY.to_string(), Value::from(step.id()));
    for (key, value) in step.payload().iter() {
        object.insert(key.clone(), value.clone());
    }
    Value::Object(object)
}

fn take_entity_id(object: &mut Map<String, Value>, key: &str) -> Result<EntityId, DocumentError> {
    match object.remove(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .map(EntityId::Numeric)
            .ok_or_else(|| DocumentError::malformed(format!("{key} is not a valid id: {n}"))),
        Some(Value::String(s)) => Ok(EntityId::Text(s)),
        Some(other) => Err(DocumentError::malformed(format!(
            "{key} must be a number or string, got {}",
            json_type_name(&other)
        ))),
        None => Err(DocumentError::malformed(format!("missing {key}"))),
    }
}

fn take_uuid(object: &mut Map<String, Value>) -> Result<Option<Uuid>, DocumentError> {
    match object.remove(UUID_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Uuid::parse_str(&s)
            .map(Some)
            .map_err(|e| DocumentError::malformed(format!("{UUID_KEY} is not a uuid: {e}"))),
        Some(other) => Err(DocumentError::malformed(format!(
            "{UUID_KEY} must be a string, got {}",
            json_type_name(&other)
        ))),
    }
}

fn take_label(object: &mut Map<String, Value>, key: &str) -> Result<String, DocumentError> {
    match object.remove(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(DocumentError::malformed(format!(
            "{key} must be a string, got {}",
            json_type_name(&other)
        ))),
    }
}

fn take_steps(object: &mut Map<String, Value>) -> Result<StepSequence, DocumentError> {
    object
        .remove(STEPS_KEY)
        .map_or_else(|| Ok(StepSequence::new()), decode_steps)
}

fn entity_id_value(id: &EntityId) -> Value {
    match id {
        EntityId::Numeric(n) => Value::from(*n),
        EntityId::Text(s) => Value::String(s.clone()),
    }
}

fn append_extra(object: &mut Map<String, Value>, extra: &Map<String, Value>) {
    for (key, value) in extra {
        object.entry(key.clone()).or_insert_with(|| value.clone());
    }
}

impl DocumentCodec for InvestigationDocument {
    fn from_object(mut object: Map<String, Value>) -> Result<Self, DocumentError> {
        let entity_id = take_entity_id(&mut object, ENTITY_ID_KEY)?;
        let uuid = take_uuid(&mut object)?
            .ok_or_else(|| DocumentError::malformed(format!("missing {UUID_KEY}")))?;
        let label = take_label(&mut object, INVESTIGATION_LABEL_KEY)?;
        let steps = take_steps(&mut object)?;
        Ok(Self::from_parts(entity_id, uuid, label, steps).with_extra(object))
    }

    fn to_object(&self) -> Map<String, Value> {
        let mut object = Map::new();
        object.insert(ENTITY_ID_KEY.to_string(), entity_id_value(self.entity_id()));
        object.insert(UUID_KEY.to_string(), Value::String(self.uuid().to_string()));
        object.insert(
            INVESTIGATION_LABEL_KEY.to_string(),
            Value::String(self.investigation_label().to_string()),
        );
        object.insert(STEPS_KEY.to_string(), encode_steps(self.steps()));
        append_extra(&mut object, self.extra());
        object
    }
}

impl DocumentCodec for ReportDocument {
    fn from_object(mut object: Map<String, Value>) -> Result<Self, DocumentError> {
        let entity_id = take_entity_id(&mut object, ENTITY_ID_KEY)?;
        let uuid = take_uuid(&mut object)?;
        let label = take_label(&mut object, REPORT_LABEL_KEY)?;
        let investigation_id = take_entity_id(&mut object, INVESTIGATION_ID_KEY)?;
        let steps = take_steps(&mut object)?;
        Ok(Self::from_parts(entity_id, uuid, label, investigation_id, steps).with_extra(object))
    }

    fn to_object(&self) -> Map<String, Value> {
        let mut object = Map::new();
        object.insert(ENTITY_ID_KEY.to_string(), entity_id_value(self.entity_id()));
        if let Some(uuid) = self.uuid() {
            object.insert(UUID_KEY.to_string(), Value::String(uuid.to_string()));
        }
        object.insert(
            REPORT_LABEL_KEY.to_string(),
            Value::String(self.report_label().to_string()),
        );
        object.insert(
            INVESTIGATION_ID_KEY.to_string(),
            entity_id_value(self.investigation_id()),
        );
        object.insert(STEPS_KEY.to_string(), encode_steps(self.steps()));
        append_extra(&mut object, self.extra());
        object
    }
}
