//! Schema registration error types

use thiserror::Error;

use super::types::ClassId;
use crate::engine::CompileError;

/// Result type for registration and sealing operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while declaring or sealing classes.
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    /// A class with this name is already registered.
    #[error("class '{0}' is already declared")]
    DuplicateClass(ClassId),

    /// Referenced class was never declared.
    #[error("class '{0}' is not declared")]
    UnknownClass(ClassId),

    /// The engine rejected the resolved schema.
    #[error("schema compilation failed: {0}")]
    Compile(#[from] CompileError),
}
