//! Schema Declaration Tests
//!
//! Tests for the declaration surface:
//! - Rule catalogue defaults and caller overrides in the rendered schema
//! - Nested and array-of-object composition
//! - Seal-time top-level options ($$strict always explicit, $$async only
//!   when supplied)
//! - Declaration uniqueness

use serde_json::json;
use validus::{rules, Registry, SchemaError, SchemaOptions, StrictMode};

// =============================================================================
// Rule Catalogue Rendering
// =============================================================================

/// Every catalogue constructor lands in the resolved schema with its
/// defaults applied and the caller's options merged over them.
#[test]
fn test_catalogue_defaults_render_in_schema() {
    let registry = Registry::new();
    let test = registry
        .declare("Test")
        .unwrap()
        .field("s", rules::string(json!({})))
        .field("n", rules::number(json!({})))
        .field("b", rules::boolean(json!({})))
        .field("e", rules::enumeration(json!({ "values": ["a", "b"] })))
        .field("c", rules::currency(json!({})))
        .seal(SchemaOptions::default())
        .unwrap();

    assert_eq!(
        registry.resolved_schema(&test).to_value(),
        json!({
            "s": { "type": "string", "empty": false },
            "n": { "type": "number", "convert": true },
            "b": { "type": "boolean" },
            "e": { "type": "enum", "values": ["a", "b"] },
            "c": { "type": "currency", "currencySymbol": "$" },
            "$$strict": false,
        })
    );
}

/// Caller options override defaults but never the type discriminator.
#[test]
fn test_caller_options_cannot_clobber_the_discriminator() {
    let registry = Registry::new();
    let test = registry
        .declare("Test")
        .unwrap()
        .field("s", rules::string(json!({ "type": "number", "empty": true })))
        .seal(SchemaOptions::default())
        .unwrap();

    let schema = registry.resolved_schema(&test);
    assert_eq!(schema.fields["s"].kind(), Some("string"));
    assert_eq!(schema.fields["s"].option("empty"), Some(&json!(true)));
}

/// The generic field constructor passes the discriminator through.
#[test]
fn test_generic_field_accepts_any_rule_shape() {
    let registry = Registry::new();
    let test = registry
        .declare("Test")
        .unwrap()
        .field("prop", rules::field(json!({ "type": "string", "min": 3 })))
        .seal(SchemaOptions::default())
        .unwrap();

    assert_eq!(
        registry.resolved_schema(&test).to_value(),
        json!({
            "prop": { "type": "string", "min": 3 },
            "$$strict": false,
        })
    );
}

// =============================================================================
// Nested Composition
// =============================================================================

/// A nested class splices in as an object rule carrying the referenced
/// schema's fields, with its strictness lifted into the rule.
#[test]
fn test_nested_class_becomes_object_rule() {
    let registry = Registry::new();
    let nested = registry
        .declare("NestedTest")
        .unwrap()
        .field("prop", rules::boolean(json!({})))
        .seal(SchemaOptions::strict(StrictMode::Strict))
        .unwrap();

    let test = registry
        .declare("Test")
        .unwrap()
        .field("prop", rules::boolean(json!({})))
        .nested("nested", &nested, json!({ "optional": true }))
        .seal(SchemaOptions::default())
        .unwrap();

    assert_eq!(
        registry.resolved_schema(&test).to_value(),
        json!({
            "prop": { "type": "boolean" },
            "nested": {
                "optional": true,
                "type": "object",
                "strict": true,
                "props": { "prop": { "type": "boolean" } },
            },
            "$$strict": false,
        })
    );
}

/// Array-of-object composition wraps the object rule as the array's items.
#[test]
fn test_nested_array_wraps_items() {
    let registry = Registry::new();
    let nested = registry
        .declare("NestedTest")
        .unwrap()
        .field("name", rules::string(json!({})))
        .seal(SchemaOptions::default())
        .unwrap();

    let test = registry
        .declare("Test")
        .unwrap()
        .nested_array("props", &nested, json!({ "min": 1 }))
        .seal(SchemaOptions::default())
        .unwrap();

    assert_eq!(
        registry.resolved_schema(&test).to_value(),
        json!({
            "props": {
                "min": 1,
                "type": "array",
                "items": {
                    "type": "object",
                    "strict": false,
                    "props": { "name": { "type": "string", "empty": false } },
                },
            },
            "$$strict": false,
        })
    );
}

/// Nesting copies the referenced schema; later edits to the referenced
/// class do not propagate into the parent.
#[test]
fn test_nested_snapshot_is_immune_to_later_edits() {
    let registry = Registry::new();
    let nested_builder = registry
        .declare("NestedTest")
        .unwrap()
        .field("prop", rules::boolean(json!({})));
    let nested = nested_builder.class().clone();

    let test = registry
        .declare("Test")
        .unwrap()
        .nested("nested", &nested, json!({}))
        .seal(SchemaOptions::default())
        .unwrap();

    // Edit the referenced class after the snapshot was taken.
    nested_builder
        .field("extra", rules::string(json!({})))
        .seal(SchemaOptions::default())
        .unwrap();

    let schema = registry.resolved_schema(&test);
    let props = schema.fields["nested"].props.as_ref().unwrap();
    assert!(props.contains_key("prop"));
    assert!(!props.contains_key("extra"));
}

// =============================================================================
// Seal-Time Options
// =============================================================================

/// $$strict is always rendered after sealing; $$async only when supplied.
#[test]
fn test_seal_flags() {
    let registry = Registry::new();

    let lax = registry
        .declare("Lax")
        .unwrap()
        .seal(SchemaOptions::default())
        .unwrap();
    assert_eq!(
        registry.resolved_schema(&lax).to_value(),
        json!({ "$$strict": false })
    );

    let strict = registry
        .declare("Strict")
        .unwrap()
        .seal(SchemaOptions::strict(StrictMode::Strict))
        .unwrap();
    assert_eq!(
        registry.resolved_schema(&strict).to_value(),
        json!({ "$$strict": true })
    );

    let remove = registry
        .declare("Remove")
        .unwrap()
        .seal(SchemaOptions::strict(StrictMode::Remove))
        .unwrap();
    assert_eq!(
        registry.resolved_schema(&remove).to_value(),
        json!({ "$$strict": "remove" })
    );

    let deferred = registry
        .declare("Deferred")
        .unwrap()
        .seal(SchemaOptions::default().asynchronous())
        .unwrap();
    assert_eq!(
        registry.resolved_schema(&deferred).to_value(),
        json!({ "$$strict": false, "$$async": true })
    );
}

// =============================================================================
// Declaration Uniqueness
// =============================================================================

/// Class names are unique per registry.
#[test]
fn test_duplicate_declaration_is_rejected() {
    let registry = Registry::new();
    let _first = registry.declare("Test").unwrap();
    assert!(matches!(
        registry.declare("Test"),
        Err(SchemaError::DuplicateClass(_))
    ));
}

/// Field declaration order is call order, preserved through sealing.
#[test]
fn test_field_order_is_declaration_order() {
    let registry = Registry::new();
    let test = registry
        .declare("Test")
        .unwrap()
        .field("zulu", rules::string(json!({})))
        .field("alpha", rules::number(json!({})))
        .field("mike", rules::boolean(json!({})))
        .seal(SchemaOptions::default())
        .unwrap();

    let schema = registry.resolved_schema(&test);
    let order: Vec<&str> = schema.fields.keys().map(String::as_str).collect();
    assert_eq!(order, vec!["zulu", "alpha", "mike"]);
}
