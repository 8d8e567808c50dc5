//! Sync orchestration: engine, service, and port interfaces

pub mod engine;
pub mod ports;
pub mod service;

pub use engine::{normalize_name, SyncEngine};
pub use service::SyncService;
