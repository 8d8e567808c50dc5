//! Type coercion from raw CRM JSON into column values

use casebridge_domain::{parse_crm_datetime, Result, SyncError};
use serde_json::Value;

use super::tables::FieldKind;

/// Coerce a top-level CRM field into its column representation.
///
/// `Ok(None)` means the source value is absent or null; the column is
/// simply omitted from that record's projection.
pub fn coerce_fixed(source: &str, kind: FieldKind, value: &Value) -> Result<Option<Value>> {
    if value.is_null() {
        return Ok(None);
    }

    match kind {
        FieldKind::Text => match value {
            Value::String(s) => Ok(Some(Value::String(s.clone()))),
            other => Err(mismatch(source, "string", other)),
        },
        FieldKind::Number => match value {
            Value::Number(_) => Ok(Some(value.clone())),
            // Monetary amounts occasionally arrive as quoted decimals.
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(|n| Some(Value::Number(n)))
                .ok_or_else(|| mismatch(source, "number", value)),
            other => Err(mismatch(source, "number", other)),
        },
        FieldKind::Date => match value {
            Value::String(s) => {
                parse_crm_datetime(s).map(|dt| Some(Value::String(dt.to_rfc3339())))
            }
            other => Err(mismatch(source, "date string", other)),
        },
        FieldKind::Bool => match value {
            Value::Bool(b) => Ok(Some(Value::Bool(*b))),
            other => Err(mismatch(source, "boolean", other)),
        },
        FieldKind::Reference => match value {
            Value::Object(map) => Ok(map
                .get("display_name")
                .and_then(Value::as_str)
                .map(|name| Value::String(name.to_string()))),
            other => Err(mismatch(source, "reference object", other)),
        },
    }
}

fn mismatch(source: &str, expected: &str, got: &Value) -> SyncError {
    SyncError::Mapping(format!("field '{source}': expected {expected}, got {got}"))
}
