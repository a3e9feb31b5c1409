//! Short-lived keyed state shared across requests.
//!
//! The token blacklist and the rate-limit windows both live behind
//! [`EphemeralStore`], so a deployment can swap the in-memory map for an
//! external cache without touching the services that use it.

pub mod memory;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppError;

pub use memory::MemoryStore;

#[async_trait]
pub trait EphemeralStore: Send + Sync {
    /// Whether `key` is present and not yet expired.
    async fn exists(&self, key: &str) -> Result<bool, AppError>;

    /// Record `key` for `ttl`. A zero ttl records nothing.
    async fn put(&self, key: &str, ttl: Duration) -> Result<(), AppError>;

    /// Atomic sliding-window admission: prune hits older than `window`,
    /// reject when `limit` hits remain, otherwise record a hit and admit.
    async fn admit(&self, key: &str, limit: u32, window: Duration) -> Result<bool, AppError>;

    /// Drop everything that has expired; returns the number of keys removed.
    async fn purge_expired(&self) -> Result<usize, AppError>;
}
