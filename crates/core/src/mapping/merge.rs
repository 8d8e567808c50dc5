//! First-write-wins retention merge
//!
//! Builds the update set for one upsert from a mapped projection and the
//! currently persisted row. Kept separate from the projection so each step
//! is testable on its own.

use casebridge_domain::constants::{
    COLUMN_EXTERNAL_ID, COLUMN_LAST_SYNCED_AT, COLUMN_RAW_PAYLOAD,
};
use casebridge_domain::MappedRecord;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::sync::ports::StoreRecord;

/// Retention rules applied when a projection meets an existing row.
///
/// Fixed columns always take the CRM value (the CRM is canonical for them).
/// Guarded columns only fill local columns that are null, absent, or empty,
/// so manual edits survive a sync. The raw payload and sync timestamp are
/// always refreshed.
pub struct MergePolicy;

impl MergePolicy {
    #[must_use]
    pub fn build_update_set(
        existing: Option<&StoreRecord>,
        mapped: &MappedRecord,
        now: DateTime<Utc>,
    ) -> StoreRecord {
        let mut record = StoreRecord::new();
        record.insert(
            COLUMN_EXTERNAL_ID.to_string(),
            Value::String(mapped.external_id.clone()),
        );

        for (column, value) in &mapped.columns {
            record.insert(column.clone(), value.clone());
        }

        for (column, value) in &mapped.guarded_columns {
            if column_is_empty(existing, column) {
                record.insert(column.clone(), value.clone());
            }
        }

        record.insert(COLUMN_RAW_PAYLOAD.to_string(), mapped.raw.clone());
        record.insert(COLUMN_LAST_SYNCED_AT.to_string(), Value::String(now.to_rfc3339()));
        record
    }
}

fn column_is_empty(existing: Option<&StoreRecord>, column: &str) -> bool {
    match existing.and_then(|row| row.get(column)) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}
