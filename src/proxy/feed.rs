use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::generator::{render_m3u, render_xmltv};
use crate::errors::{AppError, AppResult};
use crate::ingestor::StateStore;
use crate::models::CommittedState;

/// Read side of the committed snapshot: answers feed requests without
/// resyncing
#[derive(Clone)]
pub struct FeedService {
    state: StateStore,
}

impl FeedService {
    pub fn new(state: StateStore) -> Self {
        Self { state }
    }

    /// The current snapshot; `NothingAvailable` before the first sync
    pub async fn current_state(&self) -> AppResult<Arc<CommittedState>> {
        self.state.current().await.ok_or(AppError::NothingAvailable)
    }

    /// The current snapshot as M3U; `NothingAvailable` when there is no
    /// snapshot or it has no entries
    pub async fn current_feed(&self) -> AppResult<String> {
        let state = self.populated_state().await?;
        debug!("Rendering feed of {} entries", state.entries.len());
        Ok(render_m3u(&state))
    }

    /// The schedules of the current snapshot as XMLTV
    pub async fn current_guide(&self) -> AppResult<String> {
        let state = self.populated_state().await?;
        Ok(render_xmltv(&state))
    }

    /// Write the current feed to `path`
    ///
    /// Fails with `NothingAvailable` and leaves `path` untouched when there is
    /// nothing to publish.
    pub async fn write_feed(&self, path: &Path) -> AppResult<usize> {
        let state = self.populated_state().await?;
        tokio::fs::write(path, render_m3u(&state)).await?;
        info!("Wrote {} entries to {}", state.entries.len(), path.display());
        Ok(state.entries.len())
    }

    /// Write the current guide to `path`, under the same rule as `write_feed`
    pub async fn write_guide(&self, path: &Path) -> AppResult<()> {
        let guide = self.current_guide().await?;
        tokio::fs::write(path, guide).await?;
        info!("Wrote guide to {}", path.display());
        Ok(())
    }

    async fn populated_state(&self) -> AppResult<Arc<CommittedState>> {
        let state = self.current_state().await?;
        if state.is_empty() {
            return Err(AppError::NothingAvailable);
        }
        Ok(state)
    }
}
