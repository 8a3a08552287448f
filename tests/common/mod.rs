//! Shared test fixtures: a scriptable origin standing in for the network.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tafsir_shell::cache::MemoryCacheStorage;
use tafsir_shell::controller::{OfflineController, PRECACHE_MANIFEST};
use tafsir_shell::error::{OfflineError, Result};
use tafsir_shell::models::{FetchRequest, FetchResponse, ResponseType};
use tafsir_shell::network::Network;
use url::Url;

pub const ORIGIN: &str = "http://app.test";
pub const CACHE_NAME: &str = "finding-tafsir-v3";

/// In-memory origin. Unknown paths answer 404; `set_online(false)` makes
/// every fetch reject. Every fetch is recorded, online or not.
#[derive(Default)]
pub struct FakeNetwork {
    routes: Mutex<HashMap<String, (u16, String)>>,
    offline: AtomicBool,
    calls: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
}

impl FakeNetwork {
    /// Origin serving every precache manifest path.
    pub fn with_app_shell() -> Arc<Self> {
        let network = Arc::new(Self::default());
        for path in PRECACHE_MANIFEST {
            network.serve(path, 200, &shell_body(path));
        }
        network
    }

    pub fn serve(&self, path: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
    }

    pub fn set_online(&self, online: bool) {
        self.offline.store(!online, Ordering::SeqCst);
    }

    /// Delays every fetch, letting concurrent handlings interleave.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        self.calls.lock().unwrap().push(request.url.to_string());

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(OfflineError::Network("network unreachable".into()));
        }

        let (status, body) = self
            .routes
            .lock()
            .unwrap()
            .get(request.url.path())
            .cloned()
            .unwrap_or((404, "not found".to_string()));

        Ok(
            FetchResponse::new(status, body, ResponseType::Basic, request.url.as_str())
                .with_header("content-type", "text/plain"),
        )
    }
}

pub fn shell_body(path: &str) -> String {
    format!("precached {}", path)
}

pub fn app_url(path: &str) -> String {
    format!("{}{}", ORIGIN, path)
}

/// Controller over fresh in-memory storage.
pub fn controller(network: Arc<FakeNetwork>) -> (Arc<OfflineController>, Arc<MemoryCacheStorage>) {
    let storage = Arc::new(MemoryCacheStorage::new(10 * 1024 * 1024));
    let controller = OfflineController::new(
        storage.clone(),
        network,
        Url::parse(ORIGIN).unwrap(),
        CACHE_NAME,
    )
    .unwrap();
    (Arc::new(controller), storage)
}

/// Controller that has installed and activated successfully.
pub async fn active_controller(
    network: Arc<FakeNetwork>,
) -> (Arc<OfflineController>, Arc<MemoryCacheStorage>) {
    let (controller, storage) = controller(network);
    controller.on_install().await.unwrap();
    controller.on_activate().await.unwrap();
    (controller, storage)
}
