//! # Validus
//!
//! Declarative validation schemas for dynamic JSON documents, with
//! class-style inheritance and registry-compiled validators.
//!
//! Classes are declared against a [`Registry`]: each field declaration
//! contributes a rule fragment from the [`rules`] catalogue, repeat
//! declarations for the same field stack into a tagged multi-rule, and
//! classes compose by `extends` links and by embedding other classes as
//! nested objects or arrays. Sealing a class flattens its ancestor chain
//! into a single schema and compiles it into a reusable validator.
//!
//! Validation runs against an [`Instance`], a class-tagged field map, and
//! mutates it in place: type conversions, trimming, strict-remove, and
//! custom-check sanitizers all write back into the instance.
//!
//! ```no_run
//! use serde_json::json;
//! use validus::{rules, Registry, SchemaOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Registry::new();
//! let user = registry
//!     .declare("User")?
//!     .field("name", rules::string(json!({ "min": 1 })))
//!     .field("age", rules::number(json!({ "positive": true })))
//!     .seal(SchemaOptions::default())?;
//!
//! let mut instance = user.instance();
//! instance.assign(json!({ "name": "Ada", "age": 36 }));
//! let outcome = validus::validate(&registry, &mut instance)?;
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod instance;
pub mod registry;
pub mod rules;
pub mod schema;
pub mod validate;

pub use engine::{
    CompileError, CompiledValidator, Outcome, SchemaLookup, Validation, ValidationError,
    Validator, ValidatorOptions,
};
pub use instance::Instance;
pub use registry::{ClassBuilder, ClassRef, Registry, SchemaOptions};
pub use schema::{
    CheckError, CheckErrors, CheckFn, ClassId, ClassSchema, FieldSchema, RuleFragment,
    SchemaError, SchemaResult, StrictMode,
};
pub use validate::{validate, validate_or_reject, RejectError, ValidateError};
