//! Advisory polling of upstream indexing progress.
//! 上游索引进度的轮询（仅作提示）。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, Instrument};
use tv_core::ports::IndexingStatusPort;
use tv_core::{CollectionId, IndexingStatus};

/// Reports indexing completion per collection without ever blocking a load.
///
/// Failures are swallowed: the last status seen for the collection is
/// returned instead, or `Completed` when nothing was ever seen.
pub struct IndexingStatusPoller {
    port: Arc<dyn IndexingStatusPort>,
    last_known: Mutex<HashMap<CollectionId, IndexingStatus>>,
}

impl IndexingStatusPoller {
    pub fn new(port: Arc<dyn IndexingStatusPort>) -> Self {
        Self {
            port,
            last_known: Mutex::new(HashMap::new()),
        }
    }

    fn known(&self) -> MutexGuard<'_, HashMap<CollectionId, IndexingStatus>> {
        self.last_known
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn last_known(&self, collection: &CollectionId) -> IndexingStatus {
        self.known().get(collection).copied().unwrap_or_default()
    }

    pub async fn poll(&self, collection: &CollectionId) -> IndexingStatus {
        match self.port.fetch_indexing_status(collection).await {
            Ok(status) => {
                self.known().insert(collection.clone(), status);
                debug!(%collection, ?status, "indexing status polled");
                status
            }
            Err(err) => {
                debug!(%collection, error = %err, "indexing poll failed, keeping last known status");
                self.last_known(collection)
            }
        }
    }

    /// Polls once, then every `interval` while indexing is incomplete.
    ///
    /// The receiver starts at the last-known status. Polling stops when the
    /// collection reports `Completed`, when `interval` is `None` after the
    /// first poll, or when `cancel` fires.
    pub fn watch(
        self: &Arc<Self>,
        collection: CollectionId,
        interval: Option<Duration>,
        cancel: CancellationToken,
    ) -> watch::Receiver<IndexingStatus> {
        let (tx, rx) = watch::channel(self.last_known(&collection));
        let this = Arc::clone(self);
        let span = info_span!("usecase.indexing_poller.watch", %collection);

        tokio::spawn(
            async move {
                loop {
                    let status = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        status = this.poll(&collection) => status,
                    };
                    tx.send_replace(status);

                    let Some(interval) = interval else { break };
                    if status.is_completed() {
                        break;
                    }
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(interval) => {}
                    }
                }
                debug!("indexing watch stopped");
            }
            .instrument(span),
        );
        rx
    }
}
