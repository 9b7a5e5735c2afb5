//! Tests for the `#[api]` attribute macro

use qapi::{api, Condition, Dispatcher, HandlerResult, Outcome, Registry, Rest, TypeTag};
use serde_json::json;
use std::sync::Arc;

/// Orders placed in the last few days
#[api(name = "recentOrders", hint(days = "近几天"))]
fn recent_orders(days: i32) -> HandlerResult {
    let mut condition = Condition::new();
    condition.insert("days".into(), json!(days));
    Ok(Outcome::new(condition, json!([])))
}

#[api(desc = "Average order value per tag")]
pub fn avg_by_tag(min_total: f64, Rest(tags): Rest<String>) -> HandlerResult {
    Ok(Outcome::new(
        Condition::new(),
        json!({ "min_total": min_total, "tags": tags }),
    ))
}

#[test]
fn test_generated_entry_metadata() {
    let entry = recent_orders_entry();
    assert_eq!(entry.name, "recentOrders");
    assert_eq!(entry.description, "Orders placed in the last few days");
    assert_eq!(entry.parameters.len(), 1);
    assert_eq!(entry.parameters[0].name, "days");
    assert_eq!(entry.parameters[0].tag, TypeTag::INT32);
    assert_eq!(entry.parameters[0].hint, "近几天");
}

#[test]
fn test_defaults_to_function_name() {
    let entry = avg_by_tag_entry();
    assert_eq!(entry.name, "avg_by_tag");
    assert_eq!(entry.description, "Average order value per tag");
    assert_eq!(entry.parameters[0].tag, TypeTag::FLOAT64);
    assert_eq!(entry.parameters[1].name, "tags");
    assert_eq!(entry.parameters[1].tag, TypeTag::STRING.variadic());
    assert!(entry.validate().is_ok());
}

#[test]
fn test_generated_entries_dispatch() {
    let registry = Registry::new();
    registry
        .register(recent_orders_entry())
        .expect("Failed to register");
    registry
        .register(avg_by_tag_entry())
        .expect("Failed to register");
    let dispatcher = Dispatcher::new(Arc::new(registry));

    let envelope = dispatcher
        .dispatch("", &["recentOrders"])
        .expect("Dispatch failed");
    assert_eq!(envelope.detail.condition["days"], json!(5));

    let envelope = dispatcher
        .dispatch("", &["avg_by_tag", "99.5", "vip", "new"])
        .expect("Dispatch failed");
    assert_eq!(
        envelope.detail.data,
        json!({ "min_total": 99.5, "tags": ["vip", "new"] })
    );

    // the function itself is still callable directly
    assert!(recent_orders(1).is_ok());
}
