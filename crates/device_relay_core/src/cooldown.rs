//! Per-key cooldown tracking for outbound calls.
//!
//! The in-memory store only serializes attempts inside one process. Sharing
//! a cooldown across concurrently running instances needs a store backed by
//! an external atomic compare-and-swap, implemented behind the same trait.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::error::RelayError;

pub const DEFAULT_COOLDOWN_SECS: u64 = 60;

pub trait CooldownStore: Send + Sync {
    /// Record an attempt for `key` at `now` unless the previous attempt is
    /// still inside the window. Blocked attempts leave the record unchanged.
    fn try_acquire(&self, key: &str, now: DateTime<Utc>) -> Result<(), RelayError>;

    fn last_attempt(&self, key: &str) -> Option<DateTime<Utc>>;

    fn reset(&self);
}

/// Entries are never evicted; the map grows with each distinct key.
#[derive(Debug)]
pub struct InMemoryCooldownStore {
    window: Duration,
    last_attempts: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl Default for InMemoryCooldownStore {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_SECS)
    }
}

impl InMemoryCooldownStore {
    pub fn new(window_secs: u64) -> Self {
        Self {
            window: Duration::seconds(window_secs.min(u64::from(u32::MAX)) as i64),
            last_attempts: Mutex::new(HashMap::new()),
        }
    }

    pub fn window_secs(&self) -> i64 {
        self.window.num_seconds()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.last_attempts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CooldownStore for InMemoryCooldownStore {
    fn try_acquire(&self, key: &str, now: DateTime<Utc>) -> Result<(), RelayError> {
        let mut entries = self.entries();
        if let Some(last) = entries.get(key) {
            let elapsed = now - *last;
            if elapsed <= self.window {
                let remaining = (self.window - elapsed).num_seconds().max(1);
                return Err(RelayError::RateLimited {
                    phone: key.to_string(),
                    retry_after_secs: u64::try_from(remaining).unwrap_or(1),
                });
            }
        }
        entries.insert(key.to_string(), now);
        Ok(())
    }

    fn last_attempt(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries().get(key).copied()
    }

    fn reset(&self) {
        self.entries().clear();
    }
}
