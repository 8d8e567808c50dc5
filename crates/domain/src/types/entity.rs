//! Entity model: CRM records, custom-field values, and mapped projections

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{Result, SyncError};

/// Entity types synchronized from the CRM. Each syncs independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Contacts,
    Matters,
    Tasks,
}

impl EntityType {
    pub const ALL: [EntityType; 3] = [EntityType::Contacts, EntityType::Matters, EntityType::Tasks];

    /// Path segment of the CRM list endpoint.
    #[must_use]
    pub fn api_path(self) -> &'static str {
        match self {
            Self::Contacts => "contacts",
            Self::Matters => "matters",
            Self::Tasks => "tasks",
        }
    }

    /// Local table the entity syncs into.
    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            Self::Contacts => "contacts",
            Self::Matters => "exchanges",
            Self::Tasks => "tasks",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.api_path()
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contacts" => Ok(Self::Contacts),
            "matters" | "exchanges" => Ok(Self::Matters),
            "tasks" => Ok(Self::Tasks),
            other => Err(SyncError::Config(format!("unknown entity type: {other}"))),
        }
    }
}

/// One CRM record as returned by the API, retained verbatim.
///
/// Interpretation is deferred to the field mapper so a malformed record
/// fails on its own rather than aborting the page it arrived in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmRecord(pub Value);

impl CrmRecord {
    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// CRM primary key as a string. Numeric ids are rendered in decimal.
    pub fn external_id(&self) -> Result<String> {
        match self.0.get("id") {
            Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(SyncError::Mapping("record has no usable id".into())),
        }
    }

    /// Parsed custom-field entries, in the order the CRM returned them.
    /// Entries whose value has been cleared in the CRM are skipped.
    pub fn custom_fields(&self) -> Result<Vec<CustomField>> {
        match self.0.get("custom_field_values") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(entries)) => entries
                .iter()
                .map(CustomField::from_entry)
                .filter_map(Result::transpose)
                .collect(),
            Some(_) => Err(SyncError::Mapping("custom_field_values is not an array".into())),
        }
    }
}

/// Dynamically typed custom-field value, tagged per value type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CustomFieldValue {
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
    Bool(bool),
    Reference { display_name: String },
}

impl CustomFieldValue {
    /// Column representation of the value: dates as RFC 3339 strings,
    /// references as their display name.
    #[must_use]
    pub fn to_column_value(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(Value::Null, Value::Number),
            Self::Date(dt) => Value::String(dt.to_rfc3339()),
            Self::Bool(b) => Value::Bool(*b),
            Self::Reference { display_name } => Value::String(display_name.clone()),
        }
    }
}

/// One label/value pair from the CRM's custom-field list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    pub label: String,
    pub value: CustomFieldValue,
}

impl CustomField {
    /// Parse one `custom_field_values` entry from the CRM wire shape:
    /// `{ custom_field_ref: { label }, value_string | value_number |
    /// value_date_time | value_boolean, <entity>_ref: { display_name } }`.
    ///
    /// `Ok(None)` when the entry carries no value (cleared in the CRM).
    pub fn from_entry(entry: &Value) -> Result<Option<Self>> {
        let label = entry
            .pointer("/custom_field_ref/label")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SyncError::Mapping("custom field entry has no label".into()))?
            .to_string();

        match Self::parse_value(entry) {
            None => Ok(None),
            Some(Err(SyncError::Mapping(msg))) => {
                Err(SyncError::Mapping(format!("custom field '{label}': {msg}")))
            }
            Some(Err(err)) => Err(err),
            Some(Ok(value)) => Ok(Some(Self { label, value })),
        }
    }

    /// `None` when no typed value key is present; `Some(Err)` when a value
    /// key is present but malformed.
    fn parse_value(entry: &Value) -> Option<Result<CustomFieldValue>> {
        if let Some(s) = entry.get("value_string").and_then(Value::as_str) {
            return Some(Ok(CustomFieldValue::Text(s.to_string())));
        }
        if let Some(n) = entry.get("value_number").and_then(Value::as_f64) {
            return Some(Ok(CustomFieldValue::Number(n)));
        }
        if let Some(raw) = entry.get("value_date_time").and_then(Value::as_str) {
            return Some(parse_crm_datetime(raw).map(CustomFieldValue::Date));
        }
        if let Some(b) = entry.get("value_boolean").and_then(Value::as_bool) {
            return Some(Ok(CustomFieldValue::Bool(b)));
        }
        // Reference-typed fields carry a nested `*_ref` object instead of a
        // value_* key.
        entry.as_object().and_then(|map| {
            map.iter().find_map(|(key, value)| {
                if key == "custom_field_ref" || !key.ends_with("_ref") {
                    return None;
                }
                value.get("display_name").and_then(Value::as_str).map(|name| {
                    Ok(CustomFieldValue::Reference { display_name: name.to_string() })
                })
            })
        })
    }
}

/// Parse an RFC 3339 timestamp or bare `YYYY-MM-DD` date from the CRM.
pub fn parse_crm_datetime(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| SyncError::Mapping(format!("invalid date value '{raw}'")))
}

/// Flat projection of one CRM record into local column names.
#[derive(Debug, Clone)]
pub struct MappedRecord {
    pub external_id: String,
    /// Fixed-field columns; the CRM is canonical for these.
    pub columns: Map<String, Value>,
    /// Custom-field columns, written only into empty local columns.
    pub guarded_columns: Map<String, Value>,
    /// Verbatim CRM payload, persisted alongside the structured columns.
    pub raw: Value,
}
