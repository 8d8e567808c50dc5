//! # CaseBridge Common
//!
//! Generic, domain-agnostic primitives shared across the workspace.
//!
//! This crate contains resilience patterns for outbound calls: an
//! exponential backoff schedule, a token-bucket rate limiter, and a clock
//! abstraction so time-dependent behavior is testable without sleeping.
//!
//! ## Architecture
//! - No dependencies on other CaseBridge crates
//! - No domain knowledge; everything here could serve any integration

pub mod resilience;

pub use resilience::{Clock, ExponentialBackoff, MockClock, SystemClock, TokenBucket};
