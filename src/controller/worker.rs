//! Offline Controller
//!
//! Arbitrates every intercepted request between the current cache store and
//! the network:
//! - navigations go to the network first and fall back to the cache, then
//!   to the shell document
//! - assets are served from the cache first and populate it on a miss
//!
//! Each handling is strictly sequential (classify, cache, network, store,
//! respond); separate handlings run concurrently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::try_join_all;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use super::lifecycle::{FetchCounters, FetchStats, Phase};
use super::manifest::{self, PRECACHE_MANIFEST};
use crate::cache::{CacheStats, CacheStorage};
use crate::config::Config;
use crate::error::{OfflineError, Result};
use crate::models::{FetchRequest, FetchResponse, RequestKey, RequestKind, RequestMode};
use crate::network::Network;

// == Offline Controller ==
pub struct OfflineController {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    /// Current versioned cache name; other names are never read
    cache_name: String,
    origin: Url,
    /// Absolute URLs precached on install
    manifest: Vec<Url>,
    /// Document served to navigations that fail offline
    shell: Url,
    purge_stale_caches: bool,
    phase: RwLock<Phase>,
    skip_waiting: AtomicBool,
    clients_claimed: AtomicBool,
    counters: FetchCounters,
}

impl OfflineController {
    // == Constructor ==
    /// Creates a controller precaching the default manifest, with
    /// `/index.html` as the shell document.
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        origin: Url,
        cache_name: impl Into<String>,
    ) -> Result<Self> {
        let manifest = manifest::resolve(&origin, PRECACHE_MANIFEST)?;
        let shell = join(&origin, "/index.html")?;
        Ok(Self {
            storage,
            network,
            cache_name: cache_name.into(),
            origin,
            manifest,
            shell,
            purge_stale_caches: false,
            phase: RwLock::new(Phase::Parsed),
            skip_waiting: AtomicBool::new(false),
            clients_claimed: AtomicBool::new(false),
            counters: FetchCounters::default(),
        })
    }

    /// Creates a controller from configuration.
    pub fn from_config(
        config: &Config,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Result<Self> {
        Ok(
            Self::new(storage, network, config.origin.clone(), config.cache_name.clone())?
                .with_shell_path(&config.shell_path)?
                .with_purge_stale_caches(config.purge_stale_caches),
        )
    }

    /// Replaces the precache manifest.
    pub fn with_manifest(mut self, paths: &[&str]) -> Result<Self> {
        self.manifest = manifest::resolve(&self.origin, paths)?;
        Ok(self)
    }

    /// Replaces the shell document path.
    pub fn with_shell_path(mut self, path: &str) -> Result<Self> {
        self.shell = join(&self.origin, path)?;
        Ok(self)
    }

    /// Deletes caches under other names on activation.
    pub fn with_purge_stale_caches(mut self, purge: bool) -> Self {
        self.purge_stale_caches = purge;
        self
    }

    // == Accessors ==
    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn manifest(&self) -> &[Url] {
        &self.manifest
    }

    pub async fn phase(&self) -> Phase {
        *self.phase.read().await
    }

    /// True once activation has claimed clients; requests are intercepted
    /// from then on.
    pub fn controls_clients(&self) -> bool {
        self.clients_claimed.load(Ordering::Acquire)
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> FetchStats {
        self.counters.snapshot()
    }

    /// Statistics of the current cache, `None` before it is first opened.
    pub async fn cache_stats(&self) -> Option<CacheStats> {
        self.storage.stats(&self.cache_name).await.ok()
    }

    // == Install ==
    /// Opens the current cache and precaches every manifest resource.
    ///
    /// All resources are fetched before anything is written; one failed or
    /// non-ok fetch aborts the attempt and leaves the store untouched. On
    /// success skip-waiting is requested.
    pub async fn on_install(&self) -> Result<()> {
        let previous = {
            let mut phase = self.phase.write().await;
            if !phase.can_install() {
                return Err(OfflineError::InvalidState(format!(
                    "cannot install while {:?}",
                    *phase
                )));
            }
            std::mem::replace(&mut *phase, Phase::Installing)
        };
        info!("Installing cache '{}'", self.cache_name);

        match self.precache().await {
            Ok(count) => {
                self.skip_waiting.store(true, Ordering::Release);
                // Reinstalling under an active controller refreshes the store
                // without dropping control
                let next = if previous == Phase::Activated {
                    Phase::Activated
                } else {
                    Phase::Installed
                };
                *self.phase.write().await = next;
                info!("Installed cache '{}' with {} resources", self.cache_name, count);
                Ok(())
            }
            Err(err) => {
                *self.phase.write().await = previous;
                warn!("Install of cache '{}' failed: {}", self.cache_name, err);
                Err(err)
            }
        }
    }

    async fn precache(&self) -> Result<usize> {
        self.storage.open(&self.cache_name).await?;

        let fetches = self.manifest.iter().map(|url| self.precache_one(url));
        let entries = try_join_all(fetches).await?;
        let count = entries.len();

        self.storage.add_all(&self.cache_name, entries).await?;
        Ok(count)
    }

    async fn precache_one(&self, url: &Url) -> Result<(RequestKey, FetchResponse)> {
        let request = FetchRequest::new("GET", url.clone(), RequestMode::SameOrigin);
        let response = self
            .network
            .fetch(&request)
            .await
            .map_err(|err| OfflineError::PrecacheFailed {
                url: url.to_string(),
                reason: err.to_string(),
            })?;

        if !response.ok() {
            return Err(OfflineError::PrecacheFailed {
                url: url.to_string(),
                reason: format!("status {}", response.status),
            });
        }
        debug!("Precached {}", url);
        Ok((request.key(), response))
    }

    // == Activate ==
    /// Claims clients so that requests are intercepted without a reload.
    ///
    /// Only allowed after a successful install; a second call is a no-op.
    pub async fn on_activate(&self) -> Result<()> {
        {
            let mut phase = self.phase.write().await;
            let current = *phase;
            match current {
                Phase::Activated => return Ok(()),
                p if p.can_activate() => *phase = Phase::Activating,
                p => {
                    return Err(OfflineError::InvalidState(format!(
                        "cannot activate while {:?}",
                        p
                    )))
                }
            }
        }

        if self.purge_stale_caches {
            self.purge_stale().await;
        }

        self.clients_claimed.store(true, Ordering::Release);
        *self.phase.write().await = Phase::Activated;
        info!("Activated cache '{}', clients claimed", self.cache_name);
        Ok(())
    }

    async fn purge_stale(&self) -> usize {
        let mut removed = 0;
        for name in self.storage.cache_names().await {
            if name != self.cache_name && self.storage.delete(&name).await {
                info!("Deleted stale cache '{}'", name);
                removed += 1;
            }
        }
        removed
    }

    // == Fetch ==
    /// Handles one intercepted request.
    pub async fn on_fetch(&self, request: FetchRequest) -> Result<FetchResponse> {
        match request.kind() {
            RequestKind::Navigation => self.handle_navigation(&request).await,
            RequestKind::Asset => self.handle_asset(&request).await,
        }
    }

    /// Network first; offline falls back to the exact cached page, then to
    /// the shell document.
    async fn handle_navigation(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let err = match self.fetch_network(request).await {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };
        debug!("Navigation to {} failed: {}", request.url, err);

        if let Some(cached) = self.lookup(&request.key()).await {
            return Ok(cached);
        }

        match self.lookup(&RequestKey::get(&self.shell)).await {
            Some(shell) => {
                FetchCounters::bump(&self.counters.shell_fallbacks);
                debug!("Serving shell {} for {}", self.shell, request.url);
                Ok(shell)
            }
            None => {
                warn!("Offline navigation to {} with no cached shell", request.url);
                Err(OfflineError::ShellUnavailable(request.url.to_string()))
            }
        }
    }

    /// Cache first; a miss goes to the network and stores a copy of a
    /// cacheable response. A failed write still returns the response.
    async fn handle_asset(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let key = request.key();
        let cacheable_method = key.method == "GET";

        if cacheable_method {
            if let Some(cached) = self.lookup(&key).await {
                return Ok(cached);
            }
        }

        let response = self.fetch_network(request).await?;

        if cacheable_method && response.is_cacheable() {
            match self
                .storage
                .put(&self.cache_name, key, response.clone())
                .await
            {
                Ok(()) => FetchCounters::bump(&self.counters.cache_writes),
                Err(err) => {
                    FetchCounters::bump(&self.counters.write_failures);
                    warn!("Could not cache {}: {}", request.url, err);
                }
            }
        }

        Ok(response)
    }

    async fn fetch_network(&self, request: &FetchRequest) -> Result<FetchResponse> {
        FetchCounters::bump(&self.counters.network_fetches);
        let result = self.network.fetch(request).await;
        if result.is_err() {
            FetchCounters::bump(&self.counters.network_failures);
        }
        result
    }

    /// Exact match in the current cache. Storage errors count as a miss.
    async fn lookup(&self, key: &RequestKey) -> Option<FetchResponse> {
        match self.storage.match_exact(&self.cache_name, key).await {
            Ok(Some(response)) => {
                FetchCounters::bump(&self.counters.cache_hits);
                Some(response)
            }
            Ok(None) => None,
            Err(err) => {
                warn!("Cache lookup for {} failed: {}", key, err);
                None
            }
        }
    }
}

fn join(origin: &Url, path: &str) -> Result<Url> {
    origin
        .join(path)
        .map_err(|e| OfflineError::InvalidRequest(format!("{}: {}", path, e)))
}
