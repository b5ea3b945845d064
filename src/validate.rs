//! Validation entry points
//!
//! Two ways to validate an instance against its class's compiled
//! validator: [`validate`] hands back the engine's [`Validation`] (complete
//! or pending), [`validate_or_reject`] awaits it and turns an invalid
//! outcome into an error carrying the full error list.
//!
//! An instance whose class was never sealed, and has no sealed ancestor, is
//! a configuration error, distinct from a validation failure.

use thiserror::Error;

use crate::engine::{Outcome, Validation, ValidationError};
use crate::instance::Instance;
use crate::registry::Registry;
use crate::schema::ClassId;

/// Configuration errors raised before the engine runs at all.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidateError {
    /// Neither the instance's class nor any of its ancestors has a
    /// compiled validator.
    #[error("class '{0}' has no compiled validator; it was never sealed")]
    MissingValidator(ClassId),
}

/// Errors from [`validate_or_reject`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectError {
    #[error(transparent)]
    Config(#[from] ValidateError),
    /// The instance failed validation; carries every error the engine
    /// reported.
    #[error("validation failed with {} error(s)", .0.len())]
    Invalid(Vec<ValidationError>),
}

/// Validates the instance in place against its class's compiled validator.
///
/// The validator is looked up along the ancestor chain, nearest sealed
/// class first. The returned [`Validation`] is complete for synchronous
/// schemas and pending for schemas sealed with the deferred flag.
pub fn validate<'a>(
    registry: &Registry,
    instance: &'a mut Instance,
) -> Result<Validation<'a>, ValidateError> {
    let compiled = registry
        .compiled(instance.class())
        .ok_or_else(|| ValidateError::MissingValidator(instance.class().clone()))?;
    Ok(compiled.run(instance.fields_mut()))
}

/// Validates and awaits the outcome, rejecting with the full error list
/// when the instance is invalid.
pub async fn validate_or_reject(
    registry: &Registry,
    instance: &mut Instance,
) -> Result<(), RejectError> {
    let validation = validate(registry, instance)?;
    match validation.outcome().await {
        Outcome::Valid => Ok(()),
        Outcome::Invalid(errors) => Err(RejectError::Invalid(errors)),
    }
}
