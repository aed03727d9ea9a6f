use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, MutexGuard};

use crate::WeatherSnapshot;

/// The last successful snapshot and when it was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub snapshot: WeatherSnapshot,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now - self.stored_at < window
    }
}

/// Holds at most one entry. Writes replace the entry wholesale.
#[derive(Debug, Default)]
pub struct CacheSlot {
    entry: Option<CacheEntry>,
}

impl CacheSlot {
    /// The entry, whatever its age.
    pub fn entry(&self) -> Option<&CacheEntry> {
        self.entry.as_ref()
    }

    pub fn fresh(&self, now: DateTime<Utc>, window: Duration) -> Option<&CacheEntry> {
        self.entry.as_ref().filter(|e| e.is_fresh(now, window))
    }

    pub fn replace(&mut self, snapshot: WeatherSnapshot, stored_at: DateTime<Utc>) {
        self.entry = Some(CacheEntry { snapshot, stored_at });
    }
}

/// Process-wide weather cache, owned by whoever builds the aggregator.
///
/// Holding the guard across the whole check-refresh-store sequence means
/// concurrent requests wait for an in-flight refresh instead of starting
/// their own.
#[derive(Debug, Default)]
pub struct WeatherCache {
    slot: Mutex<CacheSlot>,
}

impl WeatherCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self) -> MutexGuard<'_, CacheSlot> {
        self.slot.lock().await
    }

    /// Copy of the current entry.
    pub async fn peek(&self) -> Option<CacheEntry> {
        self.slot.lock().await.entry().cloned()
    }
}
