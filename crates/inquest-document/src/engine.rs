//! Step Collection Engine
//!
//! Add/update/reorder/delete on a decoded document. Every operation is a
//! pure function `(document, input) -> new document`; the input document is
//! never touched, so a failed operation leaves nothing half-applied.
//!
//! # Invariants (hold after every successful operation)
//! - step uuids are unique within the sequence
//! - ids run exactly `1..=N` in sequence order
//! - untouched steps keep their relative order
//!
//! Every operation ends with [`StepSequence::renumbered`], even when the
//! cardinality did not change, so there is a single code path to verify.
//! A result that still repeats a uuid (only possible when the stored
//! document already did) is refused with [`DocumentError::MalformedDocument`].

use crate::document::{sealed::Sealed, StepDocument};
use crate::error::DocumentError;
use crate::ids::StepUuid;
use crate::step::{Step, StepPayload, StepSequence};
use std::collections::BTreeMap;

/// Append a step
///
/// # Errors
/// Returns [`DocumentError::DuplicateStepUuid`] if `step_uuid` is already present
pub fn add_step<D: StepDocument>(
    document: &D,
    payload: StepPayload,
    step_uuid: StepUuid,
) -> Result<D, DocumentError> {
    if document.steps().contains(&step_uuid) {
        return Err(DocumentError::DuplicateStepUuid(step_uuid));
    }
    rewrite(document, |steps| {
        steps.push(Step::new(step_uuid, payload));
    })
}

/// Replace the payload of one step in place
///
/// # Errors
/// Returns [`DocumentError::StepNotFound`] if no step carries `step_uuid`
pub fn update_step<D: StepDocument>(
    document: &D,
    step_uuid: &StepUuid,
    payload: StepPayload,
) -> Result<D, DocumentError> {
    let index = locate(document, step_uuid)?;
    rewrite(document, |steps| {
        if let Some(step) = steps.get_mut(index) {
            step.set_payload(payload);
        }
    })
}

/// Replace the whole sequence with `new_order`
///
/// Payloads are taken from `new_order`; incoming ids are ignored and
/// recomputed.
///
/// # Errors
/// Returns [`DocumentError::InvalidReorder`] unless the multiset of uuids in
/// `new_order` equals the one currently in the document
pub fn reorder_steps<D: StepDocument>(
    document: &D,
    new_order: StepSequence,
) -> Result<D, DocumentError> {
    check_same_steps(document.steps(), &new_order)?;
    rewrite(document, move |steps| *steps = new_order)
}

/// Remove a step, keeping the rest in order
///
/// Every step carrying `step_uuid` is removed.
///
/// # Errors
/// Returns [`DocumentError::StepNotFound`] if no step carries `step_uuid`
pub fn delete_step<D: StepDocument>(
    document: &D,
    step_uuid: &StepUuid,
) -> Result<D, DocumentError> {
    locate(document, step_uuid)?;
    rewrite(document, |steps| {
        steps.remove_all(step_uuid);
    })
}

/// A step mutation as a value
///
/// Lets the service layer run every mutation through one
/// load/apply/save path.
#[derive(Debug, Clone, PartialEq)]
pub enum StepMutation {
    /// Append a new step
    Add {
        /// Identity of the new step
        step_uuid: StepUuid,
        /// Its content
        payload: StepPayload,
    },
    /// Replace one step's payload
    Update {
        /// Step to update
        step_uuid: StepUuid,
        /// Replacement content
        payload: StepPayload,
    },
    /// Replace the sequence with a permutation of itself
    Reorder(StepSequence),
    /// Remove one step
    Delete(StepUuid),
}

impl StepMutation {
    /// Apply to a document
    ///
    /// # Errors
    /// Propagates the error of the underlying operation
    pub fn apply<D: StepDocument>(self, document: &D) -> Result<D, DocumentError> {
        match self {
            Self::Add { step_uuid, payload } => add_step(document, payload, step_uuid),
            Self::Update { step_uuid, payload } => update_step(document, &step_uuid, payload),
            Self::Reorder(steps) => reorder_steps(document, steps),
            Self::Delete(step_uuid) => delete_step(document, &step_uuid),
        }
    }

    /// Operation name for log fields
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add_step",
            Self::Update { .. } => "update_step",
            Self::Reorder(_) => "reorder_steps",
            Self::Delete(_) => "delete_step",
        }
    }

    /// Step the mutation targets, if it targets exactly one
    #[inline]
    #[must_use]
    pub fn target(&self) -> Option<&StepUuid> {
        match self {
            Self::Add { step_uuid, .. } | Self::Update { step_uuid, .. } => Some(step_uuid),
            Self::Delete(step_uuid) => Some(step_uuid),
            Self::Reorder(_) => None,
        }
    }

    /// Check if the mutation can change cardinality or order
    #[inline]
    #[must_use]
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::Update { .. })
    }
}

fn locate<D: StepDocument>(document: &D, step_uuid: &StepUuid) -> Result<usize, DocumentError> {
    document
        .steps()
        .position(step_uuid)
        .ok_or_else(|| DocumentError::StepNotFound(step_uuid.clone()))
}

/// Clone, edit the steps, renumber, check uniqueness
fn rewrite<D, F>(document: &D, edit: F) -> Result<D, DocumentError>
where
    D: StepDocument,
    F: FnOnce(&mut StepSequence),
{
    let mut next = document.clone();
    let steps = next.steps_mut();
    edit(steps);
    *steps = std::mem::take(steps).renumbered();

    if let Some(uuid) = next.steps().first_repeated() {
        return Err(DocumentError::malformed(format!(
            "{} {} repeats step uuid {}",
            D::KIND,
            next.entity_id(),
            uuid
        )));
    }
    Ok(next)
}

fn check_same_steps(current: &StepSequence, incoming: &StepSequence) -> Result<(), DocumentError> {
    let mut balance: BTreeMap<&StepUuid, i64> = BTreeMap::new();
    for step in current {
        *balance.entry(step.step_uuid()).or_default() += 1;
    }
    for step in incoming {
        *balance.entry(step.step_uuid()).or_default() -= 1;
    }

    let mut missing = Vec::new();
    let mut unexpected = Vec::new();
    for (uuid, count) in balance {
        let copies = usize::try_from(count.unsigned_abs()).unwrap_or(usize::MAX);
        if count > 0 {
            missing.extend(std::iter::repeat(uuid.clone()).take(copies));
        } else if count < 0 {
            unexpected.extend(std::iter::repeat(uuid.clone()).take(copies));
        }
    }

    if missing.is_empty() && unexpected.is_empty() {
        Ok(())
    } else {
        Err(DocumentError::InvalidReorder {
            missing,
            unexpected,
        })
    }
}
