//! Multi-Rule Tests
//!
//! Tests for rule stacking and any-of validation:
//! - A second declaration for the same field makes a tagged multi-rule
//! - Further declarations append, never nest
//! - The explicit multi constructor renders the same shape
//! - Validation passes when any alternative matches, in declaration order

use serde_json::json;
use validus::{rules, validate, Outcome, Registry, SchemaOptions, Validation};

fn outcome(validation: Validation<'_>) -> Outcome {
    match validation {
        Validation::Complete(outcome) => outcome,
        Validation::Pending(_) => panic!("expected a synchronous run"),
    }
}

// =============================================================================
// Accumulation Shape
// =============================================================================

/// Two declarations for one field stack into a multi-rule holding both, in
/// call order.
#[test]
fn test_second_declaration_builds_a_multi() {
    let registry = Registry::new();
    let test = registry
        .declare("Test")
        .unwrap()
        .field("prop", rules::string(json!({})))
        .field("prop", rules::number(json!({})))
        .seal(SchemaOptions::default())
        .unwrap();

    let schema = registry.resolved_schema(&test);
    let rule = &schema.fields["prop"];
    assert_eq!(rule.kind(), Some("multi"));

    let rules = rule.rules.as_ref().unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].kind(), Some("string"));
    assert_eq!(rules[1].kind(), Some("number"));
}

/// A third declaration appends to the existing multi instead of nesting a
/// multi inside a multi.
#[test]
fn test_further_declarations_append_flat() {
    let registry = Registry::new();
    let test = registry
        .declare("Test")
        .unwrap()
        .field("prop", rules::string(json!({})))
        .field("prop", rules::number(json!({})))
        .field("prop", rules::boolean(json!({})))
        .seal(SchemaOptions::default())
        .unwrap();

    let schema = registry.resolved_schema(&test);
    let rules = schema.fields["prop"].rules.as_ref().unwrap();
    assert_eq!(rules.len(), 3);
    assert!(rules.iter().all(|r| r.kind() != Some("multi")));
    assert_eq!(rules[2].kind(), Some("boolean"));
}

/// The explicit multi constructor is equivalent to stacked declarations.
#[test]
fn test_explicit_multi_matches_stacked_shape() {
    let registry = Registry::new();
    let stacked = registry
        .declare("Stacked")
        .unwrap()
        .field("prop", rules::string(json!({})))
        .field("prop", rules::number(json!({})))
        .seal(SchemaOptions::default())
        .unwrap();
    let explicit = registry
        .declare("Explicit")
        .unwrap()
        .field(
            "prop",
            rules::multi(
                vec![rules::string(json!({})), rules::number(json!({}))],
                json!({}),
            ),
        )
        .seal(SchemaOptions::default())
        .unwrap();

    assert_eq!(
        registry.resolved_schema(&stacked).to_value(),
        registry.resolved_schema(&explicit).to_value()
    );
}

// =============================================================================
// Any-Of Validation
// =============================================================================

/// A multi field passes when any single alternative accepts the value.
#[test]
fn test_any_matching_alternative_passes() {
    let registry = Registry::new();
    let test = registry
        .declare("Test")
        .unwrap()
        .field("prop", rules::string(json!({})))
        .field("prop", rules::boolean(json!({})))
        .seal(SchemaOptions::default())
        .unwrap();

    let mut as_string = test.instance();
    as_string.set("prop", json!("hello"));
    assert!(outcome(validate(&registry, &mut as_string).unwrap()).is_valid());

    let mut as_boolean = test.instance();
    as_boolean.set("prop", json!(true));
    assert!(outcome(validate(&registry, &mut as_boolean).unwrap()).is_valid());
}

/// When no alternative matches, every branch's errors are reported.
#[test]
fn test_no_matching_alternative_reports_all_branches() {
    let registry = Registry::new();
    let test = registry
        .declare("Test")
        .unwrap()
        .field("prop", rules::string(json!({})))
        .field("prop", rules::boolean(json!({})))
        .seal(SchemaOptions::default())
        .unwrap();

    let mut instance = test.instance();
    instance.set("prop", json!([1, 2]));

    let result = outcome(validate(&registry, &mut instance).unwrap());
    let kinds: Vec<&str> = result.errors().iter().map(|e| e.kind.as_str()).collect();
    assert_eq!(kinds, vec!["string", "boolean"]);
}

/// Only a matching branch's conversions are committed to the instance.
#[test]
fn test_matching_branch_conversion_is_committed() {
    let registry = Registry::new();
    let test = registry
        .declare("Test")
        .unwrap()
        .field("prop", rules::boolean(json!({})))
        .field("prop", rules::number(json!({})))
        .seal(SchemaOptions::default())
        .unwrap();

    let mut instance = test.instance();
    instance.set("prop", json!("21"));

    assert!(outcome(validate(&registry, &mut instance).unwrap()).is_valid());
    assert_eq!(instance.get("prop"), Some(&json!(21.0)));
}
