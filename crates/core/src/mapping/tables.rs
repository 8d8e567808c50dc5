//! Declarative field-mapping tables
//!
//! Each entity type carries two static tables: fixed-field rules projecting
//! known top-level CRM fields into local columns, and custom-field rules
//! mapping CRM custom-field labels onto local columns. These tables are the
//! only place the CRM's shape is tied to the local schema, which keeps the
//! mapping auditable and versionable without touching mapper code.

use casebridge_domain::EntityType;

/// How a fixed field's JSON value is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain string value.
    Text,
    /// Numeric value (monetary amounts, counts).
    Number,
    /// RFC 3339 timestamp or bare `YYYY-MM-DD` date, normalized to RFC 3339.
    Date,
    /// Boolean flag.
    Bool,
    /// Nested reference object; its `display_name` is projected.
    Reference,
}

/// Projects one top-level CRM field into a local column.
#[derive(Debug, Clone, Copy)]
pub struct FixedFieldRule {
    pub source: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
}

/// Maps one CRM custom-field label onto a local column.
#[derive(Debug, Clone, Copy)]
pub struct CustomFieldRule {
    pub label: &'static str,
    pub column: &'static str,
}

const CONTACT_FIXED_FIELDS: &[FixedFieldRule] = &[
    FixedFieldRule { source: "name", column: "name", kind: FieldKind::Text },
    FixedFieldRule { source: "first_name", column: "first_name", kind: FieldKind::Text },
    FixedFieldRule { source: "last_name", column: "last_name", kind: FieldKind::Text },
    FixedFieldRule { source: "primary_email_address", column: "email", kind: FieldKind::Text },
    FixedFieldRule { source: "primary_phone_number", column: "phone", kind: FieldKind::Text },
    FixedFieldRule { source: "type", column: "contact_type", kind: FieldKind::Text },
    FixedFieldRule { source: "title", column: "title", kind: FieldKind::Text },
    FixedFieldRule { source: "company_ref", column: "company_name", kind: FieldKind::Reference },
    FixedFieldRule { source: "created_at", column: "crm_created_at", kind: FieldKind::Date },
    FixedFieldRule { source: "updated_at", column: "crm_updated_at", kind: FieldKind::Date },
];

const CONTACT_CUSTOM_FIELDS: &[CustomFieldRule] = &[
    CustomFieldRule { label: "Spouse Name", column: "spouse_name" },
    CustomFieldRule { label: "Entity Name", column: "entity_name" },
    CustomFieldRule { label: "Tax ID", column: "tax_id" },
    CustomFieldRule { label: "Preferred Contact Method", column: "preferred_contact_method" },
    CustomFieldRule { label: "Accommodator", column: "accommodator_name" },
];

const MATTER_FIXED_FIELDS: &[FixedFieldRule] = &[
    FixedFieldRule { source: "display_number", column: "exchange_number", kind: FieldKind::Text },
    FixedFieldRule { source: "description", column: "description", kind: FieldKind::Text },
    FixedFieldRule { source: "status", column: "status", kind: FieldKind::Text },
    FixedFieldRule { source: "billable", column: "billable", kind: FieldKind::Bool },
    FixedFieldRule { source: "open_date", column: "open_date", kind: FieldKind::Date },
    FixedFieldRule { source: "close_date", column: "close_date", kind: FieldKind::Date },
    FixedFieldRule { source: "client_ref", column: "client_name", kind: FieldKind::Reference },
    FixedFieldRule {
        source: "responsible_attorney_ref",
        column: "coordinator_name",
        kind: FieldKind::Reference,
    },
    FixedFieldRule { source: "updated_at", column: "crm_updated_at", kind: FieldKind::Date },
];

const MATTER_CUSTOM_FIELDS: &[CustomFieldRule] = &[
    CustomFieldRule { label: "45 Day Deadline", column: "deadline_45_day" },
    CustomFieldRule { label: "180 Day Deadline", column: "deadline_180_day" },
    CustomFieldRule {
        label: "Relinquished Property Address",
        column: "relinquished_property_address",
    },
    CustomFieldRule { label: "Relinquished Sale Price", column: "relinquished_sale_price" },
    CustomFieldRule {
        label: "Replacement Property Address",
        column: "replacement_property_address",
    },
    CustomFieldRule { label: "Replacement Purchase Price", column: "replacement_purchase_price" },
    CustomFieldRule { label: "Exchange Type", column: "exchange_type" },
    CustomFieldRule { label: "Qualified Intermediary", column: "qualified_intermediary" },
    CustomFieldRule { label: "Escrow Number", column: "escrow_number" },
    CustomFieldRule { label: "Proceeds Received", column: "proceeds_received" },
];

const TASK_FIXED_FIELDS: &[FixedFieldRule] = &[
    FixedFieldRule { source: "name", column: "name", kind: FieldKind::Text },
    FixedFieldRule { source: "description", column: "description", kind: FieldKind::Text },
    FixedFieldRule { source: "status", column: "status", kind: FieldKind::Text },
    FixedFieldRule { source: "priority", column: "priority", kind: FieldKind::Text },
    FixedFieldRule { source: "due_at", column: "due_at", kind: FieldKind::Date },
    FixedFieldRule { source: "completed_at", column: "completed_at", kind: FieldKind::Date },
    FixedFieldRule { source: "assignee_ref", column: "assignee_name", kind: FieldKind::Reference },
    FixedFieldRule { source: "matter_ref", column: "exchange_name", kind: FieldKind::Reference },
    FixedFieldRule { source: "updated_at", column: "crm_updated_at", kind: FieldKind::Date },
];

const TASK_CUSTOM_FIELDS: &[CustomFieldRule] = &[
    CustomFieldRule { label: "Reminder Date", column: "reminder_date" },
    CustomFieldRule { label: "Completion Notes", column: "completion_notes" },
];

/// Fixed-field projection rules for `entity`.
#[must_use]
pub fn fixed_fields(entity: EntityType) -> &'static [FixedFieldRule] {
    match entity {
        EntityType::Contacts => CONTACT_FIXED_FIELDS,
        EntityType::Matters => MATTER_FIXED_FIELDS,
        EntityType::Tasks => TASK_FIXED_FIELDS,
    }
}

/// Custom-field label rules for `entity`.
#[must_use]
pub fn custom_fields(entity: EntityType) -> &'static [CustomFieldRule] {
    match entity {
        EntityType::Contacts => CONTACT_CUSTOM_FIELDS,
        EntityType::Matters => MATTER_CUSTOM_FIELDS,
        EntityType::Tasks => TASK_CUSTOM_FIELDS,
    }
}

/// Column holding the record's display name, used for best-effort secondary
/// matching when no row carries the external id yet.
#[must_use]
pub fn name_column(entity: EntityType) -> &'static str {
    match entity {
        EntityType::Contacts | EntityType::Tasks => "name",
        EntityType::Matters => "exchange_number",
    }
}
