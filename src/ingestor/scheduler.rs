use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, trace};

use super::source_list::SourceListStore;
use super::sync::SyncOrchestrator;
use crate::errors::AppResult;
use crate::models::CommittedState;

/// Re-runs the sync on a fixed interval against the persisted source list
pub struct SyncScheduler {
    orchestrator: Arc<SyncOrchestrator>,
    sources: SourceListStore,
    period: Duration,
}

impl SyncScheduler {
    pub fn new(orchestrator: Arc<SyncOrchestrator>, sources: SourceListStore, period: Duration) -> Self {
        Self {
            orchestrator,
            sources,
            period,
        }
    }

    /// Reload the source list and sync once
    pub async fn run_once(&self) -> AppResult<Arc<CommittedState>> {
        let sources = self.sources.load().await?;
        self.orchestrator.sync(&sources).await
    }

    /// Sync immediately, then every period, until `shutdown` resolves
    ///
    /// `on_commit` sees each newly committed snapshot. A failed run is logged
    /// and the previously committed snapshot stays published.
    pub async fn run_until<F, C, Fut>(&self, shutdown: F, mut on_commit: C)
    where
        F: Future<Output = ()>,
        C: FnMut(Arc<CommittedState>) -> Fut,
        Fut: Future<Output = ()>,
    {
        info!(
            "Starting sync scheduler (every {})",
            humantime::format_duration(self.period)
        );

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    trace!("Scheduler tick");
                    match self.run_once().await {
                        Ok(state) => on_commit(state).await,
                        Err(e) => error!("Scheduled sync failed, keeping previous snapshot: {}", e),
                    }
                }
                _ = &mut shutdown => {
                    info!("Sync scheduler stopping");
                    break;
                }
            }
        }
    }
}
