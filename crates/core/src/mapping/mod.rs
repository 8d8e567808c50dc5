//! Field mapping: projection of CRM records into local columns plus the
//! first-write-wins retention merge

pub mod coerce;
pub mod merge;
pub mod tables;

mod mapper;

pub use mapper::FieldMapper;
pub use merge::MergePolicy;
