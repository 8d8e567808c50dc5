//! Resilience patterns for fault-tolerant outbound calls
//!
//! - **Exponential backoff**: deterministic doubling schedule for retrying
//!   transient failures
//! - **Token bucket**: request budget enforcement against per-account rate
//!   limits
//!
//! Both are clock-parameterized where they depend on time, so tests control
//! time explicitly instead of sleeping.

pub mod backoff;
pub mod clock;
pub mod rate_limiter;

pub use backoff::ExponentialBackoff;
pub use clock::{Clock, MockClock, SystemClock};
pub use rate_limiter::{TokenBucket, TokenBucketConfig};
