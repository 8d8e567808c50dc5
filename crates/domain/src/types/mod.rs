//! Domain data types for the sync engine

pub mod credential;
pub mod entity;
pub mod run;

pub use credential::OAuthCredential;
pub use entity::{
    parse_crm_datetime, CrmRecord, CustomField, CustomFieldValue, EntityType, MappedRecord,
};
pub use run::{StrategyHint, SyncAction, SyncDetail, SyncRun, SyncRunError, SyncRunStatus, SyncStrategy};
