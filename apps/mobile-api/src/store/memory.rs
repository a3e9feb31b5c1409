//! In-process [`EphemeralStore`] backed by `dashmap`.
//!
//! Each mutation runs under the shard lock of its key's entry, which is
//! what makes `admit` a single check-and-append rather than a racy
//! read-then-write.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;

use super::EphemeralStore;
use crate::auth::clock::Clock;
use crate::error::AppError;

#[derive(Debug)]
struct Window {
    hits: VecDeque<OffsetDateTime>,
    /// The whole window is dropped once idle this long.
    expires_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct MemoryStore {
    clock: Arc<dyn Clock>,
    flags: DashMap<String, OffsetDateTime>,
    windows: DashMap<String, Window>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            flags: DashMap::new(),
            windows: DashMap::new(),
        }
    }

    /// Number of hits currently recorded for `key`, after pruning.
    pub fn window_len(&self, key: &str, window: Duration) -> usize {
        let now = self.clock.now();
        self.windows
            .get_mut(key)
            .map(|mut w| {
                if let Ok(cutoff) = shift_back(now, window) {
                    prune(&mut w.hits, cutoff);
                }
                w.hits.len()
            })
            .unwrap_or(0)
    }
}

fn shift_forward(now: OffsetDateTime, span: Duration) -> Result<OffsetDateTime, AppError> {
    time::Duration::try_from(span)
        .ok()
        .and_then(|span| now.checked_add(span))
        .ok_or_else(|| {
            AppError::internal(format!("{}s past {now} overflows the clock", span.as_secs()))
        })
}

fn shift_back(now: OffsetDateTime, span: Duration) -> Result<OffsetDateTime, AppError> {
    time::Duration::try_from(span)
        .ok()
        .and_then(|span| now.checked_sub(span))
        .ok_or_else(|| {
            AppError::internal(format!("{}s before {now} overflows the clock", span.as_secs()))
        })
}

fn prune(hits: &mut VecDeque<OffsetDateTime>, cutoff: OffsetDateTime) {
    while hits.front().is_some_and(|t| *t <= cutoff) {
        hits.pop_front();
    }
}

#[async_trait]
impl EphemeralStore for MemoryStore {
    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        let now = self.clock.now();
        let expired = match self.flags.get(key) {
            None => return Ok(false),
            Some(expires_at) => *expires_at <= now,
        };
        if expired {
            self.flags.remove_if(key, |_, expires_at| *expires_at <= now);
            return Ok(false);
        }
        Ok(true)
    }

    async fn put(&self, key: &str, ttl: Duration) -> Result<(), AppError> {
        if ttl.is_zero() {
            return Ok(());
        }
        let expires_at = shift_forward(self.clock.now(), ttl)?;
        self.flags
            .entry(key.to_string())
            .and_modify(|current| {
                if *current < expires_at {
                    *current = expires_at;
                }
            })
            .or_insert(expires_at);
        Ok(())
    }

    async fn admit(&self, key: &str, limit: u32, window: Duration) -> Result<bool, AppError> {
        let now = self.clock.now();
        let expires_at = shift_forward(now, window)?;
        let cutoff = shift_back(now, window)?;
        let mut entry = self.windows.entry(key.to_string()).or_insert_with(|| Window {
            hits: VecDeque::new(),
            expires_at,
        });

        prune(&mut entry.hits, cutoff);
        if entry.hits.len() >= limit as usize {
            return Ok(false);
        }

        entry.hits.push_back(now);
        entry.expires_at = expires_at;
        Ok(true)
    }

    async fn purge_expired(&self) -> Result<usize, AppError> {
        let now = self.clock.now();
        let before = self.flags.len() + self.windows.len();
        self.flags.retain(|_, expires_at| *expires_at > now);
        self.windows.retain(|_, w| w.expires_at > now);
        Ok(before.saturating_sub(self.flags.len() + self.windows.len()))
    }
}
