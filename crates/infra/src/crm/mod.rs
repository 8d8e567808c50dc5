//! CRM REST adapter: the paginated, rate-limited `CrmDataSource`

mod client;
mod types;

pub use client::CrmClient;
