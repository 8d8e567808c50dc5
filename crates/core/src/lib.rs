//! # CaseBridge Core
//!
//! Pure business logic layer for the sync engine - no infrastructure
//! dependencies.
//!
//! This crate contains:
//! - The field mapper: projection of CRM records into local columns and the
//!   first-write-wins retention merge
//! - The sync engine and sync service (triggering surface)
//! - Port/adapter interfaces (traits) for the CRM, local store, and audit log
//!
//! ## Architecture Principles
//! - Only depends on `casebridge-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod mapping;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use mapping::{FieldMapper, MergePolicy};
pub use sync::ports::{
    AuditLog, CrmDataSource, EntityPage, LocalStore, MatchKey, PageRequest, QueryFilter,
    StoreRecord, UpsertOutcome,
};
pub use sync::{normalize_name, SyncEngine, SyncService};
