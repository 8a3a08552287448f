//! Install Task
//!
//! Background task that keeps attempting install and activation until both
//! succeed. A failed precache is never retried within one attempt; the next
//! attempt starts from scratch after the retry interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::controller::OfflineController;

/// Spawns a task that runs `on_install` then `on_activate`, retrying every
/// `retry_interval_secs` until the controller is active.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown. The task ends on its own once activation
/// succeeds.
///
/// # Example
/// ```ignore
/// let handle = spawn_install_task(controller.clone(), 30);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_install_task(
    controller: Arc<OfflineController>,
    retry_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(retry_interval_secs);

    tokio::spawn(async move {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            let result = match controller.on_install().await {
                Ok(()) => controller.on_activate().await,
                Err(err) => Err(err),
            };

            match result {
                Ok(()) => {
                    info!(
                        "Offline controller active after {} attempt(s)",
                        attempt
                    );
                    return;
                }
                Err(err) => {
                    warn!(
                        "Install attempt {} failed: {}; retrying in {} seconds",
                        attempt, err, retry_interval_secs
                    );
                }
            }

            tokio::time::sleep(interval).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStorage;
    use crate::controller::Phase;
    use crate::error::{OfflineError, Result};
    use crate::models::{FetchRequest, FetchResponse, ResponseType};
    use crate::network::Network;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    /// Fails every fetch until `fail_first` fetches have been attempted.
    struct FlakyNetwork {
        calls: AtomicUsize,
        fail_first: usize,
    }

    #[async_trait]
    impl Network for FlakyNetwork {
        async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                return Err(OfflineError::Network("connection refused".into()));
            }
            Ok(FetchResponse::new(200, "ok", ResponseType::Basic, request.url.as_str()))
        }
    }

    fn controller(fail_first: usize) -> Arc<OfflineController> {
        let network = Arc::new(FlakyNetwork {
            calls: AtomicUsize::new(0),
            fail_first,
        });
        let storage = Arc::new(MemoryCacheStorage::new(1024 * 1024));
        let origin = Url::parse("http://app.test").unwrap();
        Arc::new(OfflineController::new(storage, network, origin, "finding-tafsir-v3").unwrap())
    }

    #[tokio::test]
    async fn test_install_task_activates() {
        let controller = controller(0);

        let handle = spawn_install_task(controller.clone(), 1);
        handle.await.unwrap();

        assert_eq!(controller.phase().await, Phase::Activated);
        assert!(controller.controls_clients());
    }

    #[tokio::test]
    async fn test_install_task_retries_after_failure() {
        // The first attempt aborts on its first failed fetch
        let controller = controller(1);

        let handle = spawn_install_task(controller.clone(), 1);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(controller.phase().await, Phase::Parsed);

        tokio::time::timeout(Duration::from_secs(3), handle)
            .await
            .expect("install task should finish")
            .unwrap();
        assert_eq!(controller.phase().await, Phase::Activated);
    }

    #[tokio::test]
    async fn test_install_task_can_be_aborted() {
        let controller = controller(usize::MAX);

        let handle = spawn_install_task(controller, 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
