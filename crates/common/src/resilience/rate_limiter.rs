//! Token-bucket rate limiter for outbound request budgets

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::debug;

use super::clock::{Clock, SystemClock};

/// Configuration for the token bucket.
#[derive(Debug, Clone)]
pub struct TokenBucketConfig {
    /// Maximum number of tokens the bucket can hold (burst ceiling).
    pub capacity: u64,
    /// Tokens added per refill interval.
    pub refill_amount: u64,
    /// Refill cadence.
    pub refill_interval: Duration,
}

impl TokenBucketConfig {
    /// # Errors
    /// Returns a message when any field is zero.
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be greater than 0".to_string());
        }
        if self.refill_amount == 0 {
            return Err("refill_amount must be greater than 0".to_string());
        }
        if self.refill_interval.is_zero() {
            return Err("refill_interval must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Token-bucket rate limiter.
///
/// Allows bursts up to the capacity, then refills at a fixed rate. Clones
/// share the same bucket, so one limiter can gate several callers against a
/// single per-account budget.
pub struct TokenBucket<C: Clock = SystemClock> {
    config: TokenBucketConfig,
    tokens: Arc<AtomicU64>,
    last_refill: Arc<RwLock<Instant>>,
    clock: Arc<C>,
}

impl TokenBucket<SystemClock> {
    /// Create a token bucket driven by the system clock.
    ///
    /// # Errors
    /// Returns a message when the configuration is invalid.
    pub fn new(
        capacity: u64,
        refill_amount: u64,
        refill_interval: Duration,
    ) -> Result<Self, String> {
        Self::with_clock(capacity, refill_amount, refill_interval, SystemClock)
    }
}

impl<C: Clock> TokenBucket<C> {
    /// Create a token bucket with a caller-supplied clock.
    ///
    /// # Errors
    /// Returns a message when the configuration is invalid.
    pub fn with_clock(
        capacity: u64,
        refill_amount: u64,
        refill_interval: Duration,
        clock: C,
    ) -> Result<Self, String> {
        let config = TokenBucketConfig { capacity, refill_amount, refill_interval };
        config.validate()?;

        Ok(Self {
            tokens: Arc::new(AtomicU64::new(capacity)),
            last_refill: Arc::new(RwLock::new(clock.now())),
            clock: Arc::new(clock),
            config,
        })
    }

    /// Credit tokens for the intervals elapsed since the last refill.
    fn refill(&self) {
        let now = self.clock.now();
        let last_refill =
            *self.last_refill.read().unwrap_or_else(PoisonError::into_inner);

        let elapsed = now.duration_since(last_refill);
        let refills = elapsed.as_millis() / self.config.refill_interval.as_millis().max(1);
        if refills == 0 {
            return;
        }

        let tokens_to_add = (refills as u64).saturating_mul(self.config.refill_amount);
        let current = self.tokens.load(Ordering::Acquire);
        let new_tokens = current.saturating_add(tokens_to_add).min(self.config.capacity);
        self.tokens.store(new_tokens, Ordering::Release);

        let mut guard = self.last_refill.write().unwrap_or_else(PoisonError::into_inner);
        *guard = now;

        debug!(added = tokens_to_add, available = new_tokens, "refilled rate-limit tokens");
    }

    /// Try to take one token. Returns `false` when the budget is spent.
    pub fn try_acquire(&self) -> bool {
        self.refill();

        let mut current = self.tokens.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return false;
            }
            match self.tokens.compare_exchange_weak(
                current,
                current - 1,
                Ordering::Release,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Time until the next refill tick credits tokens. Callers denied by
    /// [`try_acquire`] can sleep this long before trying again.
    #[must_use]
    pub fn next_refill_in(&self) -> Duration {
        let last_refill =
            *self.last_refill.read().unwrap_or_else(PoisonError::into_inner);
        let elapsed = self.clock.now().duration_since(last_refill);
        self.config.refill_interval.saturating_sub(elapsed).max(Duration::from_millis(1))
    }

    /// Currently available tokens, after crediting elapsed refills.
    pub fn available_tokens(&self) -> u64 {
        self.refill();
        self.tokens.load(Ordering::Acquire)
    }
}

impl<C: Clock> Clone for TokenBucket<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            tokens: Arc::clone(&self.tokens),
            last_refill: Arc::clone(&self.last_refill),
            clock: Arc::clone(&self.clock),
        }
    }
}
