//! Async Validation Tests
//!
//! Tests for deferred validation runs:
//! - A schema sealed with the async flag always yields a pending run
//! - Awaiting the run applies sanitization and resolves the outcome
//! - Async check errors surface as ordinary error records
//! - An async check in a schema without the flag fails at seal time

use serde_json::json;
use validus::schema::SchemaError;
use validus::{
    rules, validate, validate_or_reject, CompileError, Registry, RejectError, SchemaOptions,
    ValidationError,
};

// =============================================================================
// Pending Runs
// =============================================================================

/// An async-flagged schema yields a pending run even when nothing actually
/// suspends, and awaiting it resolves the outcome.
#[tokio::test]
async fn test_async_schema_always_defers() {
    let registry = Registry::new();
    let test = registry
        .declare("Test")
        .unwrap()
        .field("prop", rules::string(json!({})))
        .seal(SchemaOptions::default().asynchronous())
        .unwrap();

    let mut instance = test.instance();
    instance.set("prop", json!("hello"));

    let validation = validate(&registry, &mut instance).unwrap();
    assert!(validation.is_pending());
    assert!(validation.outcome().await.is_valid());
}

/// An async check that suspends on a timer still completes, and its
/// sanitized value lands in the instance.
#[tokio::test]
async fn test_suspending_check_sanitizes_the_instance() {
    let registry = Registry::new();
    let test = registry
        .declare("Test")
        .unwrap()
        .field(
            "prop",
            rules::custom_async(json!({}), |_value, _errors| async {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                json!("sanitized")
            }),
        )
        .seal(SchemaOptions::default().asynchronous())
        .unwrap();

    let mut instance = test.instance();
    instance.set("prop", json!("raw"));

    let validation = validate(&registry, &mut instance).unwrap();
    assert!(validation.outcome().await.is_valid());
    assert_eq!(instance.get("prop"), Some(&json!("sanitized")));
}

// =============================================================================
// Async Check Errors
// =============================================================================

/// Errors pushed by an async check surface as ordinary records; a kind
/// with no template carries no message.
#[tokio::test]
async fn test_async_check_errors_surface_in_order() {
    let registry = Registry::new();
    let test = registry
        .declare("Test")
        .unwrap()
        .field(
            "prop",
            rules::custom_async(json!({}), |value, errors| async move {
                tokio::time::sleep(std::time::Duration::from_millis(1)).await;
                if value != json!(123) {
                    errors.push("not-123");
                }
                value
            }),
        )
        .seal(SchemaOptions::default().asynchronous())
        .unwrap();

    let mut valid = test.instance();
    valid.set("prop", json!(123));
    assert!(validate(&registry, &mut valid)
        .unwrap()
        .outcome()
        .await
        .is_valid());

    let mut invalid = test.instance();
    invalid.set("prop", json!(456));
    let outcome = validate(&registry, &mut invalid).unwrap().outcome().await;
    assert_eq!(
        outcome.errors(),
        &[ValidationError {
            kind: "not-123".to_string(),
            field: "prop".to_string(),
            message: None,
            actual: None,
        }]
    );
}

/// validate_or_reject drives pending runs to completion.
#[tokio::test]
async fn test_validate_or_reject_awaits_pending_runs() {
    let registry = Registry::new();
    let test = registry
        .declare("Test")
        .unwrap()
        .field(
            "prop",
            rules::custom_async(json!({}), |value, errors| async move {
                if !value.is_string() {
                    errors.push("not-a-string");
                }
                value
            }),
        )
        .seal(SchemaOptions::default().asynchronous())
        .unwrap();

    let mut instance = test.instance();
    instance.set("prop", json!(7));
    match validate_or_reject(&registry, &mut instance).await {
        Err(RejectError::Invalid(errors)) => assert_eq!(errors[0].kind, "not-a-string"),
        other => panic!("expected rejection, got {other:?}"),
    }
}

// =============================================================================
// Seal-Time Enforcement
// =============================================================================

/// An async check inside a schema not sealed with the async flag is a
/// compile error, not a runtime surprise.
#[test]
fn test_async_check_requires_the_async_flag() {
    let registry = Registry::new();
    let result = registry
        .declare("Test")
        .unwrap()
        .field(
            "prop",
            rules::custom_async(json!({}), |value, _errors| async move { value }),
        )
        .seal(SchemaOptions::default());

    assert!(matches!(
        result,
        Err(SchemaError::Compile(CompileError::AsyncCheckInSyncSchema { .. }))
    ));
}
