//! Two-phase projection of CRM records into local column names

use casebridge_domain::{CrmRecord, EntityType, MappedRecord, Result};
use serde_json::Map;
use tracing::debug;

use super::{coerce, tables};

/// Projects a CRM record into the flat column layout for its entity type.
///
/// Phase one copies known top-level fields through the fixed-field table;
/// phase two maps label-keyed custom fields through the label table into
/// guarded columns. Labels without a configured mapping are dropped from the
/// structured columns but survive in the retained raw payload, so they can
/// be remapped later without a network refetch.
pub struct FieldMapper;

impl FieldMapper {
    pub fn map_entity(entity: EntityType, record: &CrmRecord) -> Result<MappedRecord> {
        let external_id = record.external_id()?;

        let mut columns = Map::new();
        for rule in tables::fixed_fields(entity) {
            let Some(value) = record.raw().get(rule.source) else {
                continue;
            };
            if let Some(coerced) = coerce::coerce_fixed(rule.source, rule.kind, value)? {
                columns.insert(rule.column.to_string(), coerced);
            }
        }

        let mut guarded_columns = Map::new();
        for field in record.custom_fields()? {
            match tables::custom_fields(entity).iter().find(|rule| rule.label == field.label) {
                Some(rule) => {
                    // First occurrence of a label wins when the CRM repeats it.
                    if !guarded_columns.contains_key(rule.column) {
                        guarded_columns
                            .insert(rule.column.to_string(), field.value.to_column_value());
                    }
                }
                None => {
                    debug!(
                        entity = %entity,
                        external_id = %external_id,
                        label = %field.label,
                        "unmapped custom field retained in raw payload"
                    );
                }
            }
        }

        Ok(MappedRecord { external_id, columns, guarded_columns, raw: record.raw().clone() })
    }
}

#[cfg(test)]
mod tests {
    use casebridge_domain::SyncError;
    use serde_json::json;

    use super::*;

    fn matter_record() -> CrmRecord {
        CrmRecord(json!({
            "id": 3301,
            "display_number": "EX-2026-0042",
            "description": "Hartley relinquished sale",
            "status": "Open",
            "open_date": "2026-01-10",
            "client_ref": {"id": 12, "display_name": "Hartley Family Trust"},
            "custom_field_values": [
                {"custom_field_ref": {"label": "45 Day Deadline"}, "value_date_time": "2026-02-24T00:00:00Z"},
                {"custom_field_ref": {"label": "Relinquished Sale Price"}, "value_number": 850000.0},
                {"custom_field_ref": {"label": "Wire Instructions Confirmed"}, "value_boolean": true},
            ]
        }))
    }

    #[test]
    fn fixed_fields_project_into_columns() {
        let mapped = FieldMapper::map_entity(EntityType::Matters, &matter_record()).unwrap();

        assert_eq!(mapped.external_id, "3301");
        assert_eq!(mapped.columns["exchange_number"], json!("EX-2026-0042"));
        assert_eq!(mapped.columns["status"], json!("Open"));
        assert_eq!(mapped.columns["client_name"], json!("Hartley Family Trust"));
        assert_eq!(mapped.columns["open_date"], json!("2026-01-10T00:00:00+00:00"));
    }

    #[test]
    fn mapped_custom_fields_land_in_guarded_columns() {
        let mapped = FieldMapper::map_entity(EntityType::Matters, &matter_record()).unwrap();

        assert_eq!(mapped.guarded_columns["deadline_45_day"], json!("2026-02-24T00:00:00+00:00"));
        assert_eq!(mapped.guarded_columns["relinquished_sale_price"], json!(850_000.0));
    }

    #[test]
    fn unmapped_labels_survive_only_in_raw_payload() {
        let mapped = FieldMapper::map_entity(EntityType::Matters, &matter_record()).unwrap();

        // "Wire Instructions Confirmed" has no configured column...
        assert!(!mapped.guarded_columns.values().any(|v| v == &json!(true)));
        // ...but the verbatim payload still carries it.
        let labels: Vec<&str> = mapped.raw["custom_field_values"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|e| e.pointer("/custom_field_ref/label").and_then(|l| l.as_str()))
            .collect();
        assert!(labels.contains(&"Wire Instructions Confirmed"));
    }

    #[test]
    fn absent_custom_field_omits_the_column() {
        let record = CrmRecord(json!({"id": 7, "display_number": "EX-2026-0001"}));
        let mapped = FieldMapper::map_entity(EntityType::Matters, &record).unwrap();

        assert!(!mapped.guarded_columns.contains_key("deadline_45_day"));
        assert!(mapped.columns.contains_key("exchange_number"));
    }

    #[test]
    fn repeated_label_keeps_first_occurrence() {
        let record = CrmRecord(json!({
            "id": 8,
            "custom_field_values": [
                {"custom_field_ref": {"label": "Escrow Number"}, "value_string": "ESC-1"},
                {"custom_field_ref": {"label": "Escrow Number"}, "value_string": "ESC-2"},
            ]
        }));
        let mapped = FieldMapper::map_entity(EntityType::Matters, &record).unwrap();

        assert_eq!(mapped.guarded_columns["escrow_number"], json!("ESC-1"));
    }

    #[test]
    fn record_without_id_fails_mapping() {
        let record = CrmRecord(json!({"display_number": "EX-2026-0002"}));
        let err = FieldMapper::map_entity(EntityType::Matters, &record).unwrap_err();
        assert!(matches!(err, SyncError::Mapping(_)));
    }
}
