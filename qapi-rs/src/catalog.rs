//! Handler catalog
//!
//! Describes registered handlers in a machine-readable form, so an upstream
//! planner (typically a language model turning a question into tokens) can pick
//! a handler and supply its positional arguments.
//!
//! Each handler becomes a [`ToolSpec`] whose input schema is a JSON Schema object
//! with one property per parameter, in declared order.

use crate::registry::{HandlerEntry, ParameterSpec};
use crate::value::ValueKind;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::Write;

/// Machine-readable description of one handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Handler name (first request token)
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON Schema for the positional arguments
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolSpec {
    /// Describe a handler entry
    pub fn from_entry(entry: &HandlerEntry) -> Self {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        let mut order = Vec::new();

        for param in &entry.parameters {
            properties.insert(param.name.clone(), param_schema(param));
            order.push(Value::String(param.name.clone()));
            if !param.tag.variadic {
                required.push(Value::String(param.name.clone()));
            }
        }

        ToolSpec {
            name: entry.name.clone(),
            description: entry.description.clone(),
            input_schema: json!({
                "type": "object",
                "properties": properties,
                "required": required,
                "x-positional-order": order,
            }),
        }
    }
}

fn scalar_schema(kind: ValueKind) -> Value {
    match kind {
        ValueKind::Int32 | ValueKind::Int64 => json!({ "type": "integer", "format": kind.as_str() }),
        ValueKind::Float32 | ValueKind::Float64 => json!({ "type": "number", "format": kind.as_str() }),
        ValueKind::Str => json!({ "type": "string" }),
        ValueKind::Timestamp => json!({
            "type": "string",
            "pattern": r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$",
        }),
    }
}

fn param_schema(param: &ParameterSpec) -> Value {
    let mut schema = if param.tag.variadic {
        json!({ "type": "array", "items": scalar_schema(param.tag.kind) })
    } else {
        scalar_schema(param.tag.kind)
    };

    if !param.hint.is_empty() {
        if let Some(obj) = schema.as_object_mut() {
            obj.insert("description".into(), Value::String(param.hint.clone()));
        }
    }
    schema
}

/// Plain-text listing of the catalog, one handler per block.
///
/// ```text
/// recentOrders(days: int32)
///     Orders placed recently
///     days: 近几天
/// ```
pub fn render_catalog(tools: &[ToolSpec]) -> String {
    let mut out = String::new();

    for tool in tools {
        let props = tool.input_schema["properties"].as_object();
        let order = tool.input_schema["x-positional-order"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        let mut params = Vec::new();
        let mut hints = Vec::new();
        for name in order.iter().filter_map(Value::as_str) {
            let schema = props.and_then(|p| p.get(name));
            params.push(format!("{}: {}", name, describe_type(schema)));
            if let Some(hint) = schema.and_then(|s| s["description"].as_str()) {
                hints.push(format!("{}: {}", name, hint));
            }
        }

        let _ = writeln!(out, "{}({})", tool.name, params.join(", "));
        if !tool.description.is_empty() {
            let _ = writeln!(out, "    {}", tool.description);
        }
        for hint in hints {
            let _ = writeln!(out, "    {}", hint);
        }
    }

    out
}

fn describe_type(schema: Option<&Value>) -> String {
    let Some(schema) = schema else {
        return "?".to_string();
    };
    if schema["type"] == "array" {
        return format!("...{}", describe_type(Some(&schema["items"])));
    }
    match (schema["format"].as_str(), schema["type"].as_str()) {
        (Some(format), _) => format.to_string(),
        (None, Some("string")) if schema.get("pattern").is_some() => "timestamp".to_string(),
        (None, Some(ty)) => ty.to_string(),
        (None, None) => "?".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{HandlerResult, Outcome, Rest};
    use crate::value::TypeTag;

    fn tagged(_limit: i64, _tags: Rest<String>) -> HandlerResult {
        Ok(Outcome::default())
    }

    fn entry() -> HandlerEntry {
        HandlerEntry::new(
            "tagged",
            "Orders by tag",
            vec![
                ParameterSpec::new("limit", TypeTag::INT64, "近几条"),
                ParameterSpec::new("tags", TypeTag::STRING.variadic(), ""),
            ],
            tagged,
        )
    }

    #[test]
    fn test_tool_schema() {
        let tool = ToolSpec::from_entry(&entry());
        assert_eq!(tool.name, "tagged");
        assert_eq!(tool.input_schema["required"], json!(["limit"]));
        assert_eq!(
            tool.input_schema["properties"]["limit"],
            json!({ "type": "integer", "format": "int64", "description": "近几条" })
        );
        assert_eq!(tool.input_schema["properties"]["tags"]["type"], "array");
    }

    #[test]
    fn test_tool_serializes_camel_case_schema() {
        let tool = ToolSpec::from_entry(&entry());
        let json = serde_json::to_value(&tool).unwrap();
        assert!(json.get("inputSchema").is_some());
    }

    #[test]
    fn test_render_catalog() {
        let text = render_catalog(&[ToolSpec::from_entry(&entry())]);
        assert!(text.starts_with("tagged(limit: int64, tags: ...string)\n"));
        assert!(text.contains("    Orders by tag\n"));
        assert!(text.contains("    limit: 近几条\n"));
    }

    #[test]
    fn test_timestamp_type_name() {
        let schema = scalar_schema(ValueKind::Timestamp);
        assert_eq!(describe_type(Some(&schema)), "timestamp");
    }
}
