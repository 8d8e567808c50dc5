//! Wire types for the CRM REST API

use serde::Deserialize;
use serde_json::Value;

/// Page envelope returned by the CRM list endpoints:
/// `{ data: [...], total_count, has_more }`.
#[derive(Debug, Deserialize)]
pub(crate) struct CrmPageEnvelope {
    #[serde(default)]
    pub data: Vec<Value>,
    pub total_count: Option<u64>,
    #[serde(default)]
    pub has_more: bool,
}
