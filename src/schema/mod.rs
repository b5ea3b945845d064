//! Schema accumulation and resolution machinery
//!
//! # Design principles
//!
//! - One mutation primitive: every field declaration funnels through the
//!   accumulator, which owns the multi-rule tagging policy
//! - Own-metadata lookups never follow the ancestor chain; only the
//!   resolver walks ancestors, explicitly
//! - Merge precedence is base-to-derived, derived overriding
//! - Resolution returns fresh copies; stored schemas are never mutated
//!   by composition or compilation

pub mod chain;
pub mod compose;
mod errors;
pub mod store;
mod types;
pub mod update;

pub mod resolve;

pub use errors::{SchemaError, SchemaResult};
pub use types::{
    AsyncCheck, CheckError, CheckErrors, CheckFn, ClassId, ClassSchema, FieldSchema,
    RuleFragment, StrictMode, SyncCheck,
};
