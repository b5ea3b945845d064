//! Validation engine
//!
//! The sole external collaborator of the schema core, consumed through two
//! entry points: [`Validator::compile`] turns one resolved class schema
//! into a reusable [`CompiledValidator`], and [`CompiledValidator::run`]
//! validates one instance's fields. Concrete rule semantics and message
//! formatting are owned by the engine; the core only hands over opaque
//! option bags.

mod compile;
mod exec;
pub mod messages;

use std::collections::HashMap;

use futures_util::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::schema::{ClassId, ClassSchema};

pub use compile::CompiledValidator;
pub use messages::Messages;

/// Engine construction options.
#[derive(Debug, Clone, Default)]
pub struct ValidatorOptions {
    /// Message templates overriding or extending the defaults, keyed by
    /// error kind. Custom checks may introduce brand new kinds here.
    pub messages: HashMap<String, String>,
}

/// Schema compiler. One instance can compile any number of schemas; each
/// compiled validator carries its own copy of the message table.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    messages: Messages,
}

impl Validator {
    /// Creates a validator with the given options.
    pub fn new(options: ValidatorOptions) -> Self {
        Self {
            messages: Messages::new(options.messages),
        }
    }
}

/// Resolves class references the engine meets inside a schema
/// (`instanceOf`). Implemented by the registry.
pub trait SchemaLookup {
    /// Returns the referenced class's resolved schema, if it is declared.
    fn resolved_schema(&self, class: &ClassId) -> Option<ClassSchema>;
}

/// A lookup that knows no classes; usable for schemas without structural
/// class references.
pub struct NoClasses;

impl SchemaLookup for NoClasses {
    fn resolved_schema(&self, _class: &ClassId) -> Option<ClassSchema> {
        None
    }
}

/// One validation error record, passed to callers verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Error kind (`required`, `string`, `objectStrict`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Path of the offending field (`prop`, `prop[1].name`, ...).
    pub field: String,
    /// Human-readable message; absent when no template matches the kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The offending value, when one was seen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
}

/// Result of running a compiled validator to completion.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The instance satisfied the schema.
    Valid,
    /// Ordered validation errors.
    Invalid(Vec<ValidationError>),
}

impl Outcome {
    /// Builds an outcome from a (possibly empty) error sequence.
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        if errors.is_empty() {
            Outcome::Valid
        } else {
            Outcome::Invalid(errors)
        }
    }

    /// Whether validation succeeded.
    pub fn is_valid(&self) -> bool {
        matches!(self, Outcome::Valid)
    }

    /// The error sequence; empty when valid.
    pub fn errors(&self) -> &[ValidationError] {
        match self {
            Outcome::Valid => &[],
            Outcome::Invalid(errors) => errors,
        }
    }
}

/// A possibly deferred validation run.
///
/// Synchronous schemas complete inline; schemas sealed with `async: true`
/// always yield `Pending`, even when no check actually suspends.
pub enum Validation<'a> {
    /// The run finished synchronously.
    Complete(Outcome),
    /// The run suspended on an asynchronous check; awaiting the future
    /// finishes it (and applies any in-place instance mutation).
    Pending(BoxFuture<'a, Outcome>),
}

impl<'a> Validation<'a> {
    /// Whether this run was deferred.
    pub fn is_pending(&self) -> bool {
        matches!(self, Validation::Pending(_))
    }

    /// Drives the run to completion.
    pub async fn outcome(self) -> Outcome {
        match self {
            Validation::Complete(outcome) => outcome,
            Validation::Pending(future) => future.await,
        }
    }
}

impl std::fmt::Debug for Validation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Validation::Complete(outcome) => f.debug_tuple("Complete").field(outcome).finish(),
            Validation::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Errors raised while compiling a schema.
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    /// A rule fragment has no `type` discriminator.
    #[error("rule for field '{field}' has no type discriminator")]
    MissingType {
        /// Offending field path.
        field: String,
    },

    /// The discriminator names no known rule kind.
    #[error("unknown rule kind '{kind}' for field '{field}'")]
    UnknownRuleKind {
        /// Offending field path.
        field: String,
        /// The unrecognized kind.
        kind: String,
    },

    /// A rule option has the wrong shape for its kind.
    #[error("invalid option '{option}' for {kind} rule on field '{field}'")]
    InvalidOption {
        /// Offending field path.
        field: String,
        /// Rule kind.
        kind: String,
        /// Option name.
        option: String,
    },

    /// A multi rule with no alternatives.
    #[error("multi rule on field '{field}' declares no rules")]
    MissingRules {
        /// Offending field path.
        field: String,
    },

    /// A custom rule without check logic.
    #[error("custom rule on field '{field}' has no check function")]
    MissingCheck {
        /// Offending field path.
        field: String,
    },

    /// An asynchronous check appears in a schema not sealed with
    /// `async: true`.
    #[error("field '{field}' carries an async check but the schema is not async")]
    AsyncCheckInSyncSchema {
        /// Offending field path.
        field: String,
    },

    /// `instanceOf` names a class that was never declared.
    #[error("instanceOf references undeclared class '{0}'")]
    UnknownClass(ClassId),

    /// `instanceOf` references form a cycle.
    #[error("instanceOf references form a cycle through class '{0}'")]
    RecursiveClassReference(ClassId),
}
