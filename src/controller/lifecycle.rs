//! Lifecycle phases and fetch counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Phase ==
/// Lifecycle phase of the offline controller.
///
/// ```text
/// Parsed --install--> Installing --ok--> Installed --activate--> Activating --> Activated
///                         |
///                         +--err--> Parsed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Registered but not (successfully) installed
    Parsed,
    Installing,
    /// Precache complete, waiting to activate
    Installed,
    Activating,
    /// Controlling clients
    Activated,
}

impl Phase {
    pub fn can_install(self) -> bool {
        !matches!(self, Phase::Installing | Phase::Activating)
    }

    pub fn can_activate(self) -> bool {
        matches!(self, Phase::Installed | Phase::Activated)
    }
}

// == Fetch Stats ==
/// Snapshot of the controller's fetch counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchStats {
    pub network_fetches: u64,
    pub network_failures: u64,
    /// Responses served from the current cache
    pub cache_hits: u64,
    /// Offline navigations answered with the shell document
    pub shell_fallbacks: u64,
    pub cache_writes: u64,
    /// Opportunistic writes that the storage refused
    pub write_failures: u64,
}

/// Live counters shared between concurrent fetch handlings.
#[derive(Debug, Default)]
pub(crate) struct FetchCounters {
    pub network_fetches: AtomicU64,
    pub network_failures: AtomicU64,
    pub cache_hits: AtomicU64,
    pub shell_fallbacks: AtomicU64,
    pub cache_writes: AtomicU64,
    pub write_failures: AtomicU64,
}

impl FetchCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FetchStats {
        FetchStats {
            network_fetches: self.network_fetches.load(Ordering::Relaxed),
            network_failures: self.network_failures.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            shell_fallbacks: self.shell_fallbacks.load(Ordering::Relaxed),
            cache_writes: self.cache_writes.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}
