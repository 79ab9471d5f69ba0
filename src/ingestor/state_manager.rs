use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::CommittedState;

/// Holder of the published snapshot
///
/// A commit swaps the whole `Arc`; readers clone the `Arc` they find, so a
/// reader holds either the previous complete snapshot or the new one and
/// never a partially merged set.
#[derive(Clone, Default)]
pub struct StateStore {
    current: Arc<RwLock<Option<Arc<CommittedState>>>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest committed snapshot, if any sync has completed
    pub async fn current(&self) -> Option<Arc<CommittedState>> {
        self.current.read().await.clone()
    }

    /// Publish a new snapshot, replacing the previous one
    pub async fn commit(&self, state: CommittedState) -> Arc<CommittedState> {
        let snapshot = Arc::new(state);
        let previous = self.current.write().await.replace(snapshot.clone());

        debug!(
            "Committed {} entries (previous snapshot: {})",
            snapshot.entries.len(),
            previous
                .map(|p| p.entries.len().to_string())
                .unwrap_or_else(|| "none".to_string())
        );

        snapshot
    }
}
