//! Transport-to-domain error mapping

use casebridge_domain::SyncError;

/// True for transport failures worth retrying with backoff: timeouts,
/// connection resets, and request-level failures before a response arrived.
pub(crate) fn is_transient_transport(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// Map a non-transient transport error into the domain taxonomy.
pub(crate) fn fetch_error(context: &str, err: &reqwest::Error) -> SyncError {
    SyncError::Fetch(format!("{context}: {err}"))
}
