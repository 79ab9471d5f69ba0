//! XMLTV schedule source
//!
//! Fetches one XMLTV guide and indexes its programmes by channel id. Schedule
//! enrichment is best-effort: any fetch or parse failure yields an empty
//! index and the sync carries on.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::errors::{AppError, AppResult};
use crate::models::ScheduleIndex;
use crate::utils::HttpFetcher;
use crate::utils::url::UrlUtils;
use crate::utils::xmltv_parser::parse_schedule;

pub struct ScheduleFetcher {
    http_client: Arc<dyn HttpFetcher>,
    url: String,
    timeout: Duration,
}

impl ScheduleFetcher {
    pub fn new<U: Into<String>>(http_client: Arc<dyn HttpFetcher>, url: U, timeout: Duration) -> Self {
        Self {
            http_client,
            url: url.into(),
            timeout,
        }
    }

    /// Fetch and index the guide, or an empty index on any failure
    pub async fn fetch_schedule(&self) -> ScheduleIndex {
        match self.try_fetch_schedule().await {
            Ok(index) => {
                info!(
                    "Loaded schedules for {} channels from {}",
                    index.len(),
                    UrlUtils::obfuscate_credentials(&self.url)
                );
                index
            }
            Err(e) => {
                warn!("Schedule unavailable, continuing without it: {}", e);
                ScheduleIndex::new()
            }
        }
    }

    pub async fn try_fetch_schedule(&self) -> AppResult<ScheduleIndex> {
        if self.url.trim().is_empty() {
            debug!("No schedule URL configured");
            return Ok(ScheduleIndex::new());
        }

        let response = self.http_client.get(&self.url, &[], self.timeout).await?;
        if !response.is_success() {
            return Err(AppError::http_status(
                response.status,
                format!(
                    "schedule fetch from {}",
                    UrlUtils::obfuscate_credentials(&self.url)
                ),
            ));
        }

        parse_schedule(&response.body)
    }
}
