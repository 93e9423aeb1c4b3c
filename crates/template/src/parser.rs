//! Document JSON parsing and data binding

use crate::{DocumentSpec, Result, TemplateError};

/// Parse a document description from a JSON string
pub fn parse_document(json: &str) -> Result<DocumentSpec> {
    serde_json::from_str(json).map_err(|e| TemplateError::ParseError(e.to_string()))
}

/// Resolve a JSONPath-like binding expression against data
///
/// Supports simple paths like:
/// - `$` - The data itself
/// - `$.field` - Root field
/// - `$.object.field` - Nested field
/// - `$.array[0]` - Array index
/// - `$.array[0].field` - Array element field
pub fn resolve_binding<'a>(
    path: &str,
    data: &'a serde_json::Value,
) -> Option<&'a serde_json::Value> {
    if path == "$" {
        return Some(data);
    }

    let path = path.strip_prefix("$.")?;
    let mut current = data;

    for segment in path.split('.') {
        if let Some(bracket_pos) = segment.find('[') {
            let field = &segment[..bracket_pos];
            let index_str = segment[bracket_pos + 1..].strip_suffix(']')?;
            let index: usize = index_str.parse().ok()?;

            if !field.is_empty() {
                current = current.get(field)?;
            }
            current = current.get(index)?;
        } else {
            current = current.get(segment)?;
        }
    }

    Some(current)
}

/// Convert a JSON value to string for rendering
pub fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => String::new(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => value.to_string(),
    }
}

/// Check if a JSON value is truthy
pub fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0) != 0.0,
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::Object(o) => !o.is_empty(),
    }
}
