//! Filter expression decoding.
//!
//! Filters arrive as JSON payloads attached to attribute path instances: an
//! array of objects (or one bare object) mapping canonical attribute paths
//! to match conditions. A condition is either a bare string, shorthand for a
//! regular-expression match, or an object naming its comparison type.

use serde_json::Value;
use tracing::debug;

use crate::error::{CompileError, Result};

/// Comparison kinds a filter condition can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Regexp,
    Numeric,
    Equals,
    NotEquals,
}

impl FilterKind {
    fn from_type_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "regexp" => Some(FilterKind::Regexp),
            "numeric" => Some(FilterKind::Numeric),
            "equals" => Some(FilterKind::Equals),
            "notequals" => Some(FilterKind::NotEquals),
            _ => None,
        }
    }
}

/// One decoded condition: how to compare, and the text to compare against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterExpression {
    pub kind: FilterKind,
    pub text: String,
}

impl FilterExpression {
    pub fn regexp(text: impl Into<String>) -> Self {
        Self {
            kind: FilterKind::Regexp,
            text: text.into(),
        }
    }
}

/// Decoded conditions keyed by canonical attribute path, in payload order.
pub type FilterMap = Vec<(String, FilterExpression)>;

/// Decodes a raw filter payload into its ordered condition list.
///
/// An absent or blank payload decodes to no conditions; anything that parses
/// but does not match the expected shape is a conversion failure.
pub fn decode(expression: Option<&str>) -> Result<FilterMap> {
    let Some(raw) = expression.map(str::trim).filter(|raw| !raw.is_empty()) else {
        debug!("no filter expression attached, skipping");
        return Ok(Vec::new());
    };

    let value: Value = serde_json::from_str(raw)
        .map_err(|e| CompileError::conversion(format!("filter payload is not valid JSON: {e}")))?;

    let mut conditions = Vec::new();
    match value {
        Value::Array(objects) => {
            for object in objects {
                decode_object(object, &mut conditions)?;
            }
        }
        object @ Value::Object(_) => decode_object(object, &mut conditions)?,
        other => {
            return Err(CompileError::conversion(format!(
                "filter payload must be an object or array of objects, got {other}"
            )));
        }
    }
    Ok(conditions)
}

fn decode_object(value: Value, conditions: &mut FilterMap) -> Result<()> {
    let Value::Object(entries) = value else {
        return Err(CompileError::conversion(format!(
            "filter entry must be an object, got {value}"
        )));
    };
    for (path, condition) in entries {
        let expression = decode_condition(&path, condition)?;
        conditions.push((path, expression));
    }
    Ok(())
}

fn decode_condition(path: &str, condition: Value) -> Result<FilterExpression> {
    match condition {
        Value::String(text) => Ok(FilterExpression::regexp(text)),
        Value::Object(fields) => {
            let type_name = fields
                .get("type")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    CompileError::conversion(format!(
                        "filter condition for '{path}' is missing its 'type' field"
                    ))
                })?;
            let kind = FilterKind::from_type_name(type_name).ok_or_else(|| {
                CompileError::conversion(format!(
                    "unknown filter condition type '{type_name}' for '{path}'"
                ))
            })?;
            let text = fields
                .get("expression")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    CompileError::conversion(format!(
                        "filter condition for '{path}' is missing its 'expression' field"
                    ))
                })?;
            Ok(FilterExpression {
                kind,
                text: text.to_string(),
            })
        }
        other => Err(CompileError::conversion(format!(
            "filter condition for '{path}' must be a string or object, got {other}"
        ))),
    }
}
