//! Rule fragment catalogue
//!
//! One constructor per supported rule kind. Each merges its option bags as
//! `{defaults, caller, mandatory}`: defaults supply ergonomic but
//! overridable behavior (strings are non-empty, numbers coerce from
//! strings), mandatory options protect the `type` discriminator from
//! caller-supplied collisions. The catalogue is an open table: a new kind
//! is one new (mandatory, defaults) pair, nothing else changes.

use std::future::Future;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::schema::{CheckError, CheckErrors, CheckFn, ClassId, RuleFragment};

/// Interprets a caller-supplied options value as an option bag.
///
/// Only JSON objects contribute options; `null` (and anything else) reads
/// as the empty bag, so `json!({})` and `Value::Null` are interchangeable.
pub fn options_map(options: Value) -> Map<String, Value> {
    match options {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Builds a fragment as `{defaults, caller, mandatory}`, later bags
/// overwriting earlier ones key by key. An overwrite keeps the key's
/// original position, so the rendered option order is stable.
fn fragment(defaults: Value, caller: Value, mandatory: Value) -> RuleFragment {
    let mut options = options_map(defaults);
    options.extend(options_map(caller));
    options.extend(options_map(mandatory));
    RuleFragment::from_options(options)
}

/// Generic field declaration; defaults to `any` and passes every caller
/// option through untouched, discriminator included.
pub fn field(options: Value) -> RuleFragment {
    fragment(json!({ "type": "any" }), options, json!({}))
}

/// Accepts any value.
pub fn any(options: Value) -> RuleFragment {
    fragment(json!({}), options, json!({ "type": "any" }))
}

/// UTF-8 string; non-empty unless overridden.
pub fn string(options: Value) -> RuleFragment {
    fragment(json!({ "empty": false }), options, json!({ "type": "string" }))
}

/// Boolean value.
pub fn boolean(options: Value) -> RuleFragment {
    fragment(json!({}), options, json!({ "type": "boolean" }))
}

/// Numeric value; coerces from strings unless overridden.
pub fn number(options: Value) -> RuleFragment {
    fragment(json!({ "convert": true }), options, json!({ "type": "number" }))
}

/// RFC 4122 UUID string.
pub fn uuid(options: Value) -> RuleFragment {
    fragment(json!({}), options, json!({ "type": "uuid" }))
}

/// 24-character hexadecimal object id.
pub fn object_id(options: Value) -> RuleFragment {
    fragment(json!({}), options, json!({ "type": "objectID" }))
}

/// E-mail address.
pub fn email(options: Value) -> RuleFragment {
    fragment(json!({}), options, json!({ "type": "email" }))
}

/// Date value; RFC 3339 string, or epoch milliseconds with `convert`.
pub fn date(options: Value) -> RuleFragment {
    fragment(json!({}), options, json!({ "type": "date" }))
}

/// One of a fixed set of values.
pub fn enumeration(options: Value) -> RuleFragment {
    fragment(json!({ "values": [] }), options, json!({ "type": "enum" }))
}

/// Array value; element rule via the `items` option or nested composition.
pub fn array(options: Value) -> RuleFragment {
    fragment(json!({}), options, json!({ "type": "array" }))
}

/// Equality against a fixed `value` or a sibling `field`.
pub fn equal(options: Value) -> RuleFragment {
    fragment(json!({}), options, json!({ "type": "equal" }))
}

/// Structural instance-of check against a registered class.
pub fn instance(of: &ClassId, options: Value) -> RuleFragment {
    fragment(
        json!({}),
        options,
        json!({ "type": "class", "instanceOf": of.as_str() }),
    )
}

/// Currency-formatted string; dollar symbol unless overridden.
pub fn currency(options: Value) -> RuleFragment {
    fragment(
        json!({ "currencySymbol": "$" }),
        options,
        json!({ "type": "currency" }),
    )
}

/// Callable value. Document values are never callable, so this only
/// passes for optional absent fields.
pub fn func(options: Value) -> RuleFragment {
    fragment(json!({}), options, json!({ "type": "function" }))
}

/// Luhn-checksummed digit string (credit card numbers and the like).
pub fn luhn(options: Value) -> RuleFragment {
    fragment(json!({}), options, json!({ "type": "luhn" }))
}

/// IEEE 802 MAC address string.
pub fn mac(options: Value) -> RuleFragment {
    fragment(json!({}), options, json!({ "type": "mac" }))
}

/// HTTP(S) URL string.
pub fn url(options: Value) -> RuleFragment {
    fragment(json!({}), options, json!({ "type": "url" }))
}

/// Opaque synchronous check. The check receives the field value and the
/// shared error accumulator, and returns the sanitized value that replaces
/// the original in the instance.
pub fn custom<F>(options: Value, check: F) -> RuleFragment
where
    F: Fn(&Value, &mut Vec<CheckError>) -> Value + Send + Sync + 'static,
{
    let mut rule = fragment(json!({}), options, json!({ "type": "custom" }));
    rule.check = Some(CheckFn::Sync(Arc::new(check)));
    rule
}

/// Opaque asynchronous check; requires the class to be sealed with
/// `async: true`. The accumulator handle can be cloned into the future.
pub fn custom_async<F, Fut>(options: Value, check: F) -> RuleFragment
where
    F: Fn(Value, CheckErrors) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Value> + Send + 'static,
{
    let mut rule = fragment(json!({}), options, json!({ "type": "custom" }));
    rule.check = Some(CheckFn::Async(Arc::new(move |value, errors| {
        Box::pin(check(value, errors))
    })));
    rule
}

/// Explicit multi-rule: the value must satisfy at least one of the given
/// rules, tried in order.
pub fn multi(rules: Vec<RuleFragment>, options: Value) -> RuleFragment {
    let mut rule = fragment(json!({}), options, json!({ "type": "multi" }));
    rule.rules = Some(rules);
    rule
}
