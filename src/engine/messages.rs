//! Validation message templates
//!
//! Templates are keyed by error kind and interpolate `{field}`,
//! `{expected}` and `{actual}`. Caller-supplied templates (including brand
//! new kinds for custom checks) override or extend the defaults; an error
//! kind with no template yields no message at all, which is the contract
//! for custom-check kinds the caller chose not to describe.

use std::collections::HashMap;

use serde_json::Value;

/// Message template table: defaults plus caller overrides.
#[derive(Debug, Clone, Default)]
pub struct Messages {
    custom: HashMap<String, String>,
}

impl Messages {
    /// Creates a table with the given overrides on top of the defaults.
    pub fn new(custom: HashMap<String, String>) -> Self {
        Self { custom }
    }

    /// Resolves and formats the message for an error kind.
    pub fn render(
        &self,
        kind: &str,
        field: &str,
        expected: Option<&str>,
        actual: Option<&Value>,
    ) -> Option<String> {
        let template = self
            .custom
            .get(kind)
            .map(String::as_str)
            .or_else(|| default_template(kind))?;
        Some(format_template(template, field, expected, actual))
    }
}

fn format_template(
    template: &str,
    field: &str,
    expected: Option<&str>,
    actual: Option<&Value>,
) -> String {
    template
        .replace("{field}", field)
        .replace("{expected}", expected.unwrap_or(""))
        .replace("{actual}", &actual.map(render_value).unwrap_or_default())
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn default_template(kind: &str) -> Option<&'static str> {
    Some(match kind {
        "required" => "The '{field}' field is required.",
        "string" => "The '{field}' field must be a string.",
        "stringEmpty" => "The '{field}' field must not be empty.",
        "stringMin" => "The '{field}' field length must be greater than or equal to {expected} characters long.",
        "stringMax" => "The '{field}' field length must be less than or equal to {expected} characters long.",
        "number" => "The '{field}' field must be a number.",
        "numberMin" => "The '{field}' field must be greater than or equal to {expected}.",
        "numberMax" => "The '{field}' field must be less than or equal to {expected}.",
        "boolean" => "The '{field}' field must be a boolean.",
        "array" => "The '{field}' field must be an array.",
        "arrayMin" => "The '{field}' field must contain at least {expected} items.",
        "arrayMax" => "The '{field}' field must contain less than or equal to {expected} items.",
        "object" => "The '{field}' must be an Object.",
        "objectStrict" => "The object '{field}' contains forbidden keys: '{actual}'.",
        "email" => "The '{field}' field must be a valid e-mail.",
        "emailEmpty" => "The '{field}' field must not be empty.",
        "uuid" => "The '{field}' field must be a valid UUID.",
        "uuidVersion" => "The '{field}' field must be a valid UUID version provided.",
        "objectID" => "The '{field}' field must be a valid ObjectID.",
        "date" => "The '{field}' field must be a Date.",
        "enumValue" => "The '{field}' field value '{expected}' does not match any of the allowed values.",
        "equalValue" => "The '{field}' field value must be equal to '{expected}'.",
        "equalField" => "The '{field}' field value must be equal to '{expected}' field value.",
        "function" => "The '{field}' field must be a function.",
        "luhn" => "The '{field}' field must be a valid checksum luhn.",
        "mac" => "The '{field}' field must be a valid MAC address.",
        "url" => "The '{field}' field must be a valid URL.",
        "currency" => "The '{field}' must be a valid currency format.",
        "classInstanceOf" => "The '{field}' field must be an instance of the '{expected}' class.",
        _ => return None,
    })
}
