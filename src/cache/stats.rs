//! Cache Statistics Module
//!
//! Snapshot of per-store lookup and write counters.

use serde::Serialize;

// == Cache Stats ==
/// Tracks counters for a single named cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of exact-match lookups that found an entry
    pub hits: u64,
    /// Number of exact-match lookups that found nothing
    pub misses: u64,
    /// Number of entries written (inserts and overwrites)
    pub writes: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Current storage footprint in bytes
    pub total_bytes: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Update Footprint ==
    /// Updates the entry count and byte footprint.
    pub fn set_footprint(&mut self, entries: usize, bytes: usize) {
        self.total_entries = entries;
        self.total_bytes = bytes;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.writes, 0);
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.total_bytes, 0);
    }

    #[test]
    fn test_hit_rate_no_lookups() {
        assert_eq!(CacheStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..CacheStats::default()
        };
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_set_footprint() {
        let mut stats = CacheStats {
            writes: 1,
            ..CacheStats::default()
        };
        stats.set_footprint(4, 2048);
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.total_entries, 4);
        assert_eq!(stats.total_bytes, 2048);
    }
}
