//! In-memory, time-expiring cache for geocoding responses
//!
//! Keys are upstream URLs used verbatim. Two queries that differ only in
//! parameter order or whitespace are separate entries; that imprecision is
//! accepted.

use bytes::Bytes;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use crate::utils::{Clock, SystemClock};

#[derive(Debug, Clone)]
struct CacheEntry {
    body: Bytes,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Point-in-time counters for the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub writes: u64,
    pub sweeps: u64,
    pub hits: u64,
    pub misses: u64,
}

/// Geocoding response cache shared by every request handler
pub struct GeoCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Sweep expired entries every N writes, 0 disables
    sweep_every: u64,
    writes: AtomicU64,
    sweeps: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl GeoCache {
    pub fn new(sweep_every: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            sweep_every,
            writes: AtomicU64::new(0),
            sweeps: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            clock,
        }
    }

    pub fn with_system_clock(sweep_every: u64) -> Self {
        Self::new(sweep_every, Arc::new(SystemClock))
    }

    /// Cached body for `key`, if present and not yet expired
    pub async fn lookup(&self, key: &str) -> Option<Bytes> {
        let now = self.clock.now();
        let found = {
            let entries = self.entries.read().await;
            entries
                .get(key)
                .filter(|entry| entry.is_live(now))
                .map(|entry| entry.body.clone())
        };

        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Geo cache hit: {}", key);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("Geo cache miss: {}", key);
        }
        found
    }

    /// Insert or overwrite `key`, expiring `ttl` from now.
    pub async fn store(&self, key: impl Into<String>, body: Bytes, ttl: Duration) {
        let now = self.clock.now();
        let expires_at = ChronoDuration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let write_number = {
            let mut entries = self.entries.write().await;
            entries.insert(key.into(), CacheEntry { body, expires_at });
            self.writes.fetch_add(1, Ordering::SeqCst) + 1
        };

        // The installing guard is gone; the sweep takes its own.
        if self.sweep_every > 0 && write_number % self.sweep_every == 0 {
            self.sweep_expired().await;
        }
    }

    /// Drop every expired entry, returning how many were removed
    pub async fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let removed = before - entries.len();
        drop(entries);

        self.sweeps.fetch_add(1, Ordering::SeqCst);
        debug!("Geo cache sweep removed {} expired entries", removed);
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len().await,
            writes: self.writes.load(Ordering::SeqCst),
            sweeps: self.sweeps.load(Ordering::SeqCst),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
