//! Stream liveness probing
//!
//! A HEAD request against the stream URL. Only `200 OK` and
//! `206 Partial Content` count as live; every other status and every
//! transport failure counts as offline.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::models::LiveStatus;
use crate::utils::HttpFetcher;
use crate::utils::url::UrlUtils;

const LIVE_STATUSES: [u16; 2] = [200, 206];

pub struct LivenessProber {
    http_client: Arc<dyn HttpFetcher>,
    timeout: Duration,
}

impl LivenessProber {
    pub fn new(http_client: Arc<dyn HttpFetcher>, timeout: Duration) -> Self {
        Self {
            http_client,
            timeout,
        }
    }

    /// Whether the stream answered with a success-class status in time
    pub async fn probe(&self, url: &str) -> bool {
        match self.http_client.head(url, self.timeout).await {
            Ok(status) => {
                let reachable = LIVE_STATUSES.contains(&status);
                debug!(
                    "Probe {} -> {} ({})",
                    UrlUtils::obfuscate_credentials(url),
                    status,
                    if reachable { "live" } else { "offline" }
                );
                reachable
            }
            Err(e) => {
                debug!("Probe {} failed: {}", UrlUtils::obfuscate_credentials(url), e);
                false
            }
        }
    }

    pub async fn live_status(&self, url: &str) -> LiveStatus {
        LiveStatus::from_reachable(self.probe(url).await)
    }
}
