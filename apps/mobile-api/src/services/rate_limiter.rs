//! Per-principal sliding-window rate limiting.
//!
//! A fixed 60-second trailing window, not a token bucket: a client can
//! spend its whole budget at the end of one window and again at the start
//! of the next.

use std::sync::Arc;
use std::time::Duration;

use crate::error::AppError;
use crate::store::EphemeralStore;

pub const WINDOW: Duration = Duration::from_secs(60);

const KEY_PREFIX: &str = "ratelimit:";

pub struct RateLimiter {
    store: Arc<dyn EphemeralStore>,
    /// Configured requests per minute; 0 disables limiting.
    limit_per_minute: u32,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn EphemeralStore>, limit_per_minute: u32) -> Self {
        Self {
            store,
            limit_per_minute,
        }
    }

    pub fn limit_per_minute(&self) -> u32 {
        self.limit_per_minute
    }

    /// Admit against the configured limit.
    pub async fn admit(&self, principal_id: &str) -> Result<bool, AppError> {
        self.admit_with_limit(principal_id, i64::from(self.limit_per_minute))
            .await
    }

    /// Admit against an explicit limit; any limit `<= 0` always admits.
    pub async fn admit_with_limit(
        &self,
        principal_id: &str,
        limit_per_minute: i64,
    ) -> Result<bool, AppError> {
        if limit_per_minute <= 0 {
            return Ok(true);
        }
        let limit = u32::try_from(limit_per_minute).unwrap_or(u32::MAX);
        self.store
            .admit(&format!("{KEY_PREFIX}{principal_id}"), limit, WINDOW)
            .await
    }
}
