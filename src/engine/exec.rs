//! Compiled-rule evaluation
//!
//! The evaluator walks the rule tree against an instance's field map,
//! mutating it in place where a rule sanitizes (numeric conversion, strict
//! `"remove"`, custom-check return values). The walk is written as one
//! boxed-recursive future so synchronous and deferred runs share a single
//! code path; a schema compiled without async checks completes on the
//! first poll and is surfaced as `Validation::Complete`.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::{Map, Number, Value};

use crate::schema::{CheckError, CheckErrors, CheckFn, StrictMode};

use super::compile::{make_path, CompiledKind, CompiledRule, CompiledValidator, ObjectRule};
use super::{Outcome, Validation, ValidationError};

impl CompiledValidator {
    /// Validates one instance's fields against this compiled schema.
    ///
    /// The map is the instance itself, not a copy: strict `"remove"`
    /// deletes undeclared keys and sanitizing rules rewrite values as an
    /// observable side effect. Schemas sealed with `async: true` always
    /// yield `Pending`; the mutation then happens while the future runs.
    pub fn run<'a>(self: &Arc<Self>, fields: &'a mut Map<String, Value>) -> Validation<'a> {
        if self.is_async {
            return Validation::Pending(run_future(Arc::clone(self), fields));
        }
        match run_future(Arc::clone(self), &mut *fields).now_or_never() {
            Some(outcome) => Validation::Complete(outcome),
            // A sync-compiled schema completes on the first poll; surface
            // a fresh future rather than panic if that ever fails to hold.
            None => Validation::Pending(run_future(Arc::clone(self), fields)),
        }
    }
}

fn run_future<'a>(
    validator: Arc<CompiledValidator>,
    fields: &'a mut Map<String, Value>,
) -> BoxFuture<'a, Outcome> {
    Box::pin(async move {
        let errors = validator
            .eval_object(&validator.root, fields, String::new())
            .await;
        Outcome::from_errors(errors)
    })
}

impl CompiledValidator {
    fn eval_object<'f>(
        &'f self,
        rule: &'f ObjectRule,
        map: &'f mut Map<String, Value>,
        path: String,
    ) -> BoxFuture<'f, Vec<ValidationError>> {
        Box::pin(async move {
            let mut errors = Vec::new();

            // Snapshot for sibling-relative rules (`equal` by field).
            let siblings = map.clone();

            for (name, rule) in &rule.props {
                let field_path = make_path(&path, name);
                match map.get_mut(name) {
                    None | Some(Value::Null) => {
                        if !rule.optional {
                            errors.push(self.error("required", &field_path, None, None));
                        }
                    }
                    Some(value) => {
                        errors.extend(self.eval_rule(rule, value, &field_path, &siblings).await);
                    }
                }
            }

            match rule.strict {
                StrictMode::Lax => {}
                StrictMode::Strict => {
                    let forbidden: Vec<String> = map
                        .keys()
                        .filter(|key| !rule.declares(key))
                        .cloned()
                        .collect();
                    if !forbidden.is_empty() {
                        errors.push(self.error(
                            "objectStrict",
                            &path,
                            None,
                            Some(Value::String(forbidden.join(", "))),
                        ));
                    }
                }
                StrictMode::Remove => {
                    map.retain(|key, _| rule.declares(key));
                }
            }

            errors
        })
    }

    fn eval_rule<'f>(
        &'f self,
        rule: &'f CompiledRule,
        value: &'f mut Value,
        path: &'f str,
        siblings: &'f Map<String, Value>,
    ) -> BoxFuture<'f, Vec<ValidationError>> {
        Box::pin(async move {
            let mut errors = Vec::new();

            match &rule.kind {
                CompiledKind::Any => {}

                CompiledKind::String { empty, min, max } => match value.as_str() {
                    None => errors.push(self.type_error("string", path, value)),
                    Some(s) => {
                        if s.is_empty() && !empty {
                            errors.push(self.type_error("stringEmpty", path, value));
                        } else {
                            let length = s.chars().count();
                            if let Some(min) = min {
                                if length < *min {
                                    errors.push(self.bound_error("stringMin", path, *min, value));
                                }
                            }
                            if let Some(max) = max {
                                if length > *max {
                                    errors.push(self.bound_error("stringMax", path, *max, value));
                                }
                            }
                        }
                    }
                },

                CompiledKind::Boolean { convert } => {
                    let converted = match &*value {
                        Value::Bool(b) => Some(*b),
                        Value::String(s) if *convert => match s.as_str() {
                            "true" | "1" => Some(true),
                            "false" | "0" => Some(false),
                            _ => None,
                        },
                        Value::Number(n) if *convert => match n.as_i64() {
                            Some(1) => Some(true),
                            Some(0) => Some(false),
                            _ => None,
                        },
                        _ => None,
                    };
                    match converted {
                        None => errors.push(self.type_error("boolean", path, value)),
                        Some(b) => {
                            if !value.is_boolean() {
                                *value = Value::Bool(b);
                            }
                        }
                    }
                }

                CompiledKind::Number { convert, min, max } => {
                    let parsed = match &*value {
                        Value::Number(n) => n.as_f64(),
                        Value::String(s) if *convert => s.trim().parse::<f64>().ok(),
                        _ => None,
                    };
                    match parsed.and_then(Number::from_f64) {
                        None => errors.push(self.type_error("number", path, value)),
                        Some(number) => {
                            let n = number.as_f64().unwrap_or_default();
                            if !value.is_number() {
                                *value = Value::Number(number);
                            }
                            if let Some(min) = min {
                                if n < *min {
                                    errors.push(self.bound_error("numberMin", path, *min, value));
                                }
                            }
                            if let Some(max) = max {
                                if n > *max {
                                    errors.push(self.bound_error("numberMax", path, *max, value));
                                }
                            }
                        }
                    }
                }

                CompiledKind::Uuid { version } => match value.as_str() {
                    None => errors.push(self.type_error("uuid", path, value)),
                    Some(s) => match uuid::Uuid::parse_str(s) {
                        Err(_) => errors.push(self.type_error("uuid", path, value)),
                        Ok(parsed) => {
                            if let Some(version) = version {
                                if parsed.get_version_num() != *version {
                                    errors.push(self.bound_error(
                                        "uuidVersion",
                                        path,
                                        *version,
                                        value,
                                    ));
                                }
                            }
                        }
                    },
                },

                CompiledKind::ObjectId { pattern } => {
                    if !value.as_str().is_some_and(|s| pattern.is_match(s)) {
                        errors.push(self.type_error("objectID", path, value));
                    }
                }

                CompiledKind::Email { pattern } => match value.as_str() {
                    None => errors.push(self.type_error("email", path, value)),
                    Some("") => errors.push(self.type_error("emailEmpty", path, value)),
                    Some(s) => {
                        if !pattern.is_match(s) {
                            errors.push(self.type_error("email", path, value));
                        }
                    }
                },

                CompiledKind::Date { convert } => {
                    let ok = match &*value {
                        Value::String(s) => chrono::DateTime::parse_from_rfc3339(s).is_ok(),
                        // Epoch milliseconds, accepted only when converting.
                        Value::Number(n) => *convert && n.as_i64().is_some(),
                        _ => false,
                    };
                    if !ok {
                        errors.push(self.type_error("date", path, value));
                    }
                }

                CompiledKind::Enum { values } => {
                    if !values.iter().any(|allowed| allowed == &*value) {
                        let allowed = values
                            .iter()
                            .map(render_plain)
                            .collect::<Vec<_>>()
                            .join(", ");
                        errors.push(self.error(
                            "enumValue",
                            path,
                            Some(&allowed),
                            Some(value.clone()),
                        ));
                    }
                }

                CompiledKind::Array { items, min, max } => match value {
                    Value::Array(elements) => {
                        if let Some(min) = min {
                            if elements.len() < *min {
                                errors.push(self.bound_error_of(
                                    "arrayMin",
                                    path,
                                    *min,
                                    Value::Array(elements.clone()),
                                ));
                            }
                        }
                        if let Some(max) = max {
                            if elements.len() > *max {
                                errors.push(self.bound_error_of(
                                    "arrayMax",
                                    path,
                                    *max,
                                    Value::Array(elements.clone()),
                                ));
                            }
                        }
                        if let Some(items) = items {
                            for (index, element) in elements.iter_mut().enumerate() {
                                let element_path = format!("{path}[{index}]");
                                if element.is_null() {
                                    if !items.optional {
                                        errors.push(self.error(
                                            "required",
                                            &element_path,
                                            None,
                                            None,
                                        ));
                                    }
                                } else {
                                    errors.extend(
                                        self.eval_rule(items, element, &element_path, siblings)
                                            .await,
                                    );
                                }
                            }
                        }
                    }
                    other => errors.push(self.type_error("array", path, other)),
                },

                CompiledKind::Object(object) => match value {
                    Value::Object(map) => {
                        errors.extend(self.eval_object(object, map, path.to_string()).await);
                    }
                    other => errors.push(self.type_error("object", path, other)),
                },

                CompiledKind::Instance { class, rule } => match value {
                    Value::Object(map) => {
                        // Structural check: probe a copy so a failed match
                        // leaves the value untouched.
                        let mut probe = map.clone();
                        let nested = self.eval_object(rule, &mut probe, path.to_string()).await;
                        if !nested.is_empty() {
                            errors.push(self.error(
                                "classInstanceOf",
                                path,
                                Some(class.as_str()),
                                Some(Value::Object(map.clone())),
                            ));
                        }
                    }
                    other => errors.push(self.error(
                        "classInstanceOf",
                        path,
                        Some(class.as_str()),
                        Some(other.clone()),
                    )),
                },

                CompiledKind::Equal {
                    value: expected,
                    field,
                } => {
                    if let Some(expected) = expected {
                        if expected != &*value {
                            errors.push(self.error(
                                "equalValue",
                                path,
                                Some(&render_plain(expected)),
                                Some(value.clone()),
                            ));
                        }
                    } else if let Some(field) = field {
                        if siblings.get(field) != Some(&*value) {
                            errors.push(self.error(
                                "equalField",
                                path,
                                Some(field),
                                Some(value.clone()),
                            ));
                        }
                    }
                }

                CompiledKind::Currency { pattern } => {
                    if !value.as_str().is_some_and(|s| pattern.is_match(s)) {
                        errors.push(self.type_error("currency", path, value));
                    }
                }

                // Document values are never callable.
                CompiledKind::Function => {
                    errors.push(self.type_error("function", path, value));
                }

                CompiledKind::Luhn => {
                    if !value.as_str().is_some_and(luhn_checksum) {
                        errors.push(self.type_error("luhn", path, value));
                    }
                }

                CompiledKind::Mac { pattern } => {
                    if !value.as_str().is_some_and(|s| pattern.is_match(s)) {
                        errors.push(self.type_error("mac", path, value));
                    }
                }

                CompiledKind::Url { pattern } => {
                    if !value.as_str().is_some_and(|s| pattern.is_match(s)) {
                        errors.push(self.type_error("url", path, value));
                    }
                }

                CompiledKind::Custom { check } => {
                    let pushed = match check {
                        CheckFn::Sync(check) => {
                            let mut pushed = Vec::new();
                            let sanitized = check(&*value, &mut pushed);
                            *value = sanitized;
                            pushed
                        }
                        CheckFn::Async(check) => {
                            let accumulator = CheckErrors::new();
                            let sanitized = check(value.clone(), accumulator.clone()).await;
                            *value = sanitized;
                            accumulator.take()
                        }
                    };
                    for error in pushed {
                        errors.push(self.check_error(error, path));
                    }
                }

                CompiledKind::Multi { rules } => {
                    let mut collected = Vec::new();
                    let mut matched = false;
                    for rule in rules {
                        // Each alternative probes a copy; only the matching
                        // one is allowed to sanitize the real value.
                        let mut candidate = value.clone();
                        let branch =
                            self.eval_rule(rule, &mut candidate, path, siblings).await;
                        if branch.is_empty() {
                            *value = candidate;
                            matched = true;
                            break;
                        }
                        collected.extend(branch);
                    }
                    if !matched {
                        errors.extend(collected);
                    }
                }
            }

            errors
        })
    }

    fn error(
        &self,
        kind: &str,
        field: &str,
        expected: Option<&str>,
        actual: Option<Value>,
    ) -> ValidationError {
        ValidationError {
            kind: kind.to_string(),
            field: field.to_string(),
            message: self.messages.render(kind, field, expected, actual.as_ref()),
            actual,
        }
    }

    fn type_error(&self, kind: &str, field: &str, actual: &Value) -> ValidationError {
        self.error(kind, field, None, Some(actual.clone()))
    }

    fn bound_error(
        &self,
        kind: &str,
        field: &str,
        bound: impl ToString,
        actual: &Value,
    ) -> ValidationError {
        self.error(kind, field, Some(&bound.to_string()), Some(actual.clone()))
    }

    fn bound_error_of(
        &self,
        kind: &str,
        field: &str,
        bound: impl ToString,
        actual: Value,
    ) -> ValidationError {
        self.error(kind, field, Some(&bound.to_string()), Some(actual))
    }

    fn check_error(&self, error: CheckError, path: &str) -> ValidationError {
        let message = error
            .message
            .clone()
            .or_else(|| self.messages.render(&error.kind, path, None, error.actual.as_ref()));
        ValidationError {
            kind: error.kind,
            field: path.to_string(),
            message,
            actual: error.actual,
        }
    }
}

fn render_plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Luhn mod-10 checksum over a digit string; spaces and dashes are
/// separators, anything else fails.
fn luhn_checksum(input: &str) -> bool {
    let mut digits = Vec::new();
    for c in input.chars() {
        match c.to_digit(10) {
            Some(d) => digits.push(d),
            None if c == ' ' || c == '-' => {}
            None => return false,
        }
    }
    if digits.is_empty() {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}
