//! Named Cache Module
//!
//! A single versioned store of request→response pairs. Entries are keyed by
//! exact request and are only ever inserted or overwritten whole.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::cache::{CacheStats, MAX_KEY_LENGTH};
use crate::error::{OfflineError, Result};
use crate::models::{FetchResponse, RequestKey};

// == Named Cache ==
/// Request→response storage for one cache name.
#[derive(Debug, Default)]
pub struct NamedCache {
    /// Stored responses by exact request key
    entries: HashMap<RequestKey, FetchResponse>,
    /// Lookups that found an entry
    hits: AtomicU64,
    /// Lookups that found nothing
    misses: AtomicU64,
    /// Inserts and overwrites
    writes: u64,
    /// Sum of `size_bytes` over all entries
    bytes: usize,
}

impl NamedCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    // == Match ==
    /// Returns a copy of the response stored under `key`, recording a hit
    /// or a miss.
    ///
    /// Takes `&self` so lookups can share a read lock.
    pub fn match_exact(&self, key: &RequestKey) -> Option<FetchResponse> {
        let found = self.entries.get(key).cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    // == Validate ==
    /// Checks that `key` can be stored.
    pub fn validate_key(key: &RequestKey) -> Result<()> {
        if key.url.len() > MAX_KEY_LENGTH {
            return Err(OfflineError::InvalidRequest(format!(
                "URL exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        if key.method != "GET" {
            return Err(OfflineError::InvalidRequest(format!(
                "Only GET requests can be cached, got {}",
                key.method
            )));
        }
        Ok(())
    }

    /// Size change that storing `response` under `key` would cause.
    pub fn growth(&self, key: &RequestKey, response: &FetchResponse) -> isize {
        let old = self.entries.get(key).map(FetchResponse::size_bytes).unwrap_or(0);
        response.size_bytes() as isize - old as isize
    }

    // == Insert ==
    /// Stores `response` under `key`, replacing any previous entry.
    ///
    /// Callers validate the key and enforce quota first.
    pub fn insert(&mut self, key: RequestKey, response: FetchResponse) {
        let added = response.size_bytes();
        if let Some(old) = self.entries.insert(key, response) {
            self.bytes -= old.size_bytes();
        }
        self.bytes += added;
        self.writes += 1;
    }

    /// Returns every stored key in sorted order.
    pub fn keys(&self) -> Vec<RequestKey> {
        let mut keys: Vec<RequestKey> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes,
            ..CacheStats::default()
        };
        stats.set_footprint(self.entries.len(), self.bytes);
        stats
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
