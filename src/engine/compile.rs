//! Schema compilation
//!
//! Turns one resolved class schema into a typed rule tree. All option
//! parsing happens here, once per seal: patterns are compiled, numeric
//! bounds extracted, class references resolved (and cycle-checked) through
//! the lookup. The produced validator is immutable and shared by every
//! instance of the class.

use regex::Regex;
use serde_json::Value;

use crate::schema::{CheckFn, ClassId, ClassSchema, FieldSchema, RuleFragment, StrictMode};

use super::messages::Messages;
use super::{CompileError, SchemaLookup, Validator};

/// A compiled, reusable validator for one class schema.
#[derive(Debug)]
pub struct CompiledValidator {
    pub(super) root: ObjectRule,
    pub(super) is_async: bool,
    pub(super) messages: Messages,
}

impl CompiledValidator {
    /// Whether runs of this validator are deferred (`$$async` was set).
    pub fn is_async(&self) -> bool {
        self.is_async
    }
}

/// Compiled object body: declared props in declaration order plus the
/// unknown-field policy.
#[derive(Debug)]
pub(super) struct ObjectRule {
    pub(super) strict: StrictMode,
    pub(super) props: Vec<(String, CompiledRule)>,
}

impl ObjectRule {
    pub(super) fn declares(&self, name: &str) -> bool {
        self.props.iter().any(|(prop, _)| prop == name)
    }
}

/// One compiled rule: the shared `optional` flag plus kind-specific state.
#[derive(Debug)]
pub(super) struct CompiledRule {
    pub(super) optional: bool,
    pub(super) kind: CompiledKind,
}

#[derive(Debug)]
pub(super) enum CompiledKind {
    Any,
    String {
        empty: bool,
        min: Option<usize>,
        max: Option<usize>,
    },
    Boolean {
        convert: bool,
    },
    Number {
        convert: bool,
        min: Option<f64>,
        max: Option<f64>,
    },
    Uuid {
        version: Option<usize>,
    },
    ObjectId {
        pattern: Regex,
    },
    Email {
        pattern: Regex,
    },
    Date {
        convert: bool,
    },
    Enum {
        values: Vec<Value>,
    },
    Array {
        items: Option<Box<CompiledRule>>,
        min: Option<usize>,
        max: Option<usize>,
    },
    Object(ObjectRule),
    Instance {
        class: ClassId,
        rule: ObjectRule,
    },
    Equal {
        value: Option<Value>,
        field: Option<String>,
    },
    Currency {
        pattern: Regex,
    },
    Function,
    Luhn,
    Mac {
        pattern: Regex,
    },
    Url {
        pattern: Regex,
    },
    Custom {
        check: CheckFn,
    },
    Multi {
        rules: Vec<CompiledRule>,
    },
}

impl Validator {
    /// Compiles a resolved schema into a reusable validator.
    ///
    /// The engine owns the schema copy it is given; callers keep their own.
    /// `$$async` decides whether runs are deferred; an async check inside a
    /// schema that was not sealed async is a compile error rather than a
    /// silent misbehavior.
    pub fn compile(
        &self,
        schema: ClassSchema,
        lookup: &dyn SchemaLookup,
    ) -> Result<CompiledValidator, CompileError> {
        let is_async = schema.async_mode == Some(true);
        let strict = schema.strict.unwrap_or_default();
        let mut ctx = Context {
            lookup,
            is_async,
            visiting: Vec::new(),
        };
        let root = compile_object(&schema.fields, strict, "", &mut ctx)?;
        log::debug!(
            "compiled schema with {} root props (async={})",
            root.props.len(),
            is_async
        );
        Ok(CompiledValidator {
            root,
            is_async,
            messages: self.messages.clone(),
        })
    }
}

struct Context<'a> {
    lookup: &'a dyn SchemaLookup,
    is_async: bool,
    /// Classes currently being inlined through `instanceOf`.
    visiting: Vec<ClassId>,
}

fn compile_object(
    fields: &FieldSchema,
    strict: StrictMode,
    path: &str,
    ctx: &mut Context<'_>,
) -> Result<ObjectRule, CompileError> {
    let mut props = Vec::with_capacity(fields.len());
    for (name, fragment) in fields {
        let field_path = make_path(path, name);
        props.push((name.clone(), compile_rule(fragment, &field_path, ctx)?));
    }
    Ok(ObjectRule { strict, props })
}

fn compile_rule(
    fragment: &RuleFragment,
    path: &str,
    ctx: &mut Context<'_>,
) -> Result<CompiledRule, CompileError> {
    let kind = fragment.kind().ok_or_else(|| CompileError::MissingType {
        field: path.to_string(),
    })?;
    let optional = opt_bool(fragment, kind, path, "optional", false)?;

    let compiled = match kind {
        "any" => CompiledKind::Any,
        "string" => CompiledKind::String {
            empty: opt_bool(fragment, kind, path, "empty", true)?,
            min: opt_usize(fragment, kind, path, "min")?,
            max: opt_usize(fragment, kind, path, "max")?,
        },
        "boolean" => CompiledKind::Boolean {
            convert: opt_bool(fragment, kind, path, "convert", false)?,
        },
        "number" => CompiledKind::Number {
            convert: opt_bool(fragment, kind, path, "convert", false)?,
            min: opt_f64(fragment, kind, path, "min")?,
            max: opt_f64(fragment, kind, path, "max")?,
        },
        "uuid" => CompiledKind::Uuid {
            version: opt_usize(fragment, kind, path, "version")?,
        },
        "objectID" => CompiledKind::ObjectId {
            pattern: pattern(r"^[0-9a-fA-F]{24}$", kind, path)?,
        },
        "email" => CompiledKind::Email {
            pattern: pattern(r"^[^\s@]+@[^\s@]+\.[^\s@]+$", kind, path)?,
        },
        "date" => CompiledKind::Date {
            convert: opt_bool(fragment, kind, path, "convert", false)?,
        },
        "enum" => {
            let values = match fragment.option("values") {
                Some(Value::Array(values)) => values.clone(),
                None => Vec::new(),
                Some(_) => {
                    return Err(invalid_option(kind, path, "values"));
                }
            };
            CompiledKind::Enum { values }
        }
        "array" => CompiledKind::Array {
            items: match &fragment.items {
                Some(items) => Some(Box::new(compile_rule(items, &format!("{path}[]"), ctx)?)),
                None => None,
            },
            min: opt_usize(fragment, kind, path, "min")?,
            max: opt_usize(fragment, kind, path, "max")?,
        },
        "object" => {
            let strict = fragment
                .option("strict")
                .map(StrictMode::from_value)
                .unwrap_or_default();
            let empty = FieldSchema::new();
            let props = fragment.props.as_ref().unwrap_or(&empty);
            CompiledKind::Object(compile_object(props, strict, path, ctx)?)
        }
        "class" => {
            let class = match fragment.option("instanceOf").and_then(Value::as_str) {
                Some(name) => ClassId::new(name),
                None => return Err(invalid_option(kind, path, "instanceOf")),
            };
            if ctx.visiting.contains(&class) {
                return Err(CompileError::RecursiveClassReference(class));
            }
            let referenced = ctx
                .lookup
                .resolved_schema(&class)
                .ok_or_else(|| CompileError::UnknownClass(class.clone()))?;
            ctx.visiting.push(class.clone());
            let rule = compile_object(
                &referenced.fields,
                referenced.strict.unwrap_or_default(),
                path,
                ctx,
            )?;
            ctx.visiting.pop();
            CompiledKind::Instance { class, rule }
        }
        "equal" => {
            let value = fragment.option("value").cloned();
            let field = fragment
                .option("field")
                .and_then(Value::as_str)
                .map(str::to_string);
            if value.is_none() && field.is_none() {
                return Err(invalid_option(kind, path, "value"));
            }
            CompiledKind::Equal { value, field }
        }
        "currency" => {
            let symbol = fragment
                .option("currencySymbol")
                .and_then(Value::as_str)
                .unwrap_or("$");
            let escaped = regex::escape(symbol);
            CompiledKind::Currency {
                pattern: pattern(
                    &format!(r"^(?:{escaped})?\s*-?\d{{1,3}}(?:,\d{{3}})*(?:\.\d+)?$"),
                    kind,
                    path,
                )?,
            }
        }
        "function" => CompiledKind::Function,
        "luhn" => CompiledKind::Luhn,
        "mac" => CompiledKind::Mac {
            pattern: pattern(
                r"^(?:[0-9a-fA-F]{2}[:-]){5}[0-9a-fA-F]{2}$|^(?:[0-9a-fA-F]{4}\.){2}[0-9a-fA-F]{4}$",
                kind,
                path,
            )?,
        },
        "url" => CompiledKind::Url {
            pattern: pattern(r"^https?://[^\s/$.?#][^\s]*$", kind, path)?,
        },
        "custom" => {
            let check = fragment
                .check
                .clone()
                .ok_or_else(|| CompileError::MissingCheck {
                    field: path.to_string(),
                })?;
            if check.is_async() && !ctx.is_async {
                return Err(CompileError::AsyncCheckInSyncSchema {
                    field: path.to_string(),
                });
            }
            CompiledKind::Custom { check }
        }
        "multi" => {
            let fragments = fragment.rules.as_deref().unwrap_or(&[]);
            if fragments.is_empty() {
                return Err(CompileError::MissingRules {
                    field: path.to_string(),
                });
            }
            let mut rules = Vec::with_capacity(fragments.len());
            for fragment in fragments {
                rules.push(compile_rule(fragment, path, ctx)?);
            }
            CompiledKind::Multi { rules }
        }
        other => {
            return Err(CompileError::UnknownRuleKind {
                field: path.to_string(),
                kind: other.to_string(),
            });
        }
    };

    Ok(CompiledRule {
        optional,
        kind: compiled,
    })
}

fn invalid_option(kind: &str, path: &str, option: &str) -> CompileError {
    CompileError::InvalidOption {
        field: path.to_string(),
        kind: kind.to_string(),
        option: option.to_string(),
    }
}

fn pattern(source: &str, kind: &str, path: &str) -> Result<Regex, CompileError> {
    Regex::new(source).map_err(|_| invalid_option(kind, path, "pattern"))
}

fn opt_bool(
    fragment: &RuleFragment,
    kind: &str,
    path: &str,
    option: &str,
    default: bool,
) -> Result<bool, CompileError> {
    match fragment.option(option) {
        None => Ok(default),
        Some(Value::Bool(value)) => Ok(*value),
        Some(_) => Err(invalid_option(kind, path, option)),
    }
}

fn opt_usize(
    fragment: &RuleFragment,
    kind: &str,
    path: &str,
    option: &str,
) -> Result<Option<usize>, CompileError> {
    match fragment.option(option) {
        None => Ok(None),
        Some(Value::Number(n)) if n.as_u64().is_some() => {
            Ok(n.as_u64().map(|value| value as usize))
        }
        Some(_) => Err(invalid_option(kind, path, option)),
    }
}

fn opt_f64(
    fragment: &RuleFragment,
    kind: &str,
    path: &str,
    option: &str,
) -> Result<Option<f64>, CompileError> {
    match fragment.option(option) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(_) => Err(invalid_option(kind, path, option)),
    }
}

/// Creates a field path from prefix and field name.
pub(super) fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}
