//! Sync orchestration
//!
//! One run fetches every source, parses and concatenates the entries, gates
//! and classifies them, resolves display name collisions, enriches the
//! survivors with liveness, artwork and schedule data, and publishes the
//! result as a single snapshot.
//!
//! Every fan-out uses `buffered`, so results come back in input order no
//! matter which request completes first and are joined to their entry by
//! position.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::state_manager::StateStore;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::{CommittedState, Entry, SyncStats};
use crate::observability::SyncMetrics;
use crate::services::{ArtworkResolver, CategoryClassifier, CompletionClient, LivenessProber};
use crate::sources::{ScheduleFetcher, parse_m3u};
use crate::utils::HttpFetcher;
use crate::utils::url::UrlUtils;

/// Collaborators the orchestrator drives
pub struct SyncServices {
    pub http_client: Arc<dyn HttpFetcher>,
    pub classifier: CategoryClassifier,
    pub prober: LivenessProber,
    pub artwork: ArtworkResolver,
    pub schedule: ScheduleFetcher,
}

pub struct SyncOrchestrator {
    services: SyncServices,
    state: StateStore,
    metrics: SyncMetrics,
    source_timeout: Duration,
    max_concurrency: usize,
}

impl SyncOrchestrator {
    pub fn new(
        services: SyncServices,
        state: StateStore,
        source_timeout: Duration,
        max_concurrency: usize,
    ) -> Self {
        Self {
            services,
            state,
            metrics: SyncMetrics::from_global(),
            source_timeout,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Wire every service from configuration around the given capabilities
    pub fn from_config(
        config: &Config,
        http_client: Arc<dyn HttpFetcher>,
        completion: Arc<dyn CompletionClient>,
        state: StateStore,
    ) -> Self {
        let services = SyncServices {
            classifier: CategoryClassifier::new(completion, config.classifier.max_tokens),
            prober: LivenessProber::new(http_client.clone(), config.sync.probe_timeout),
            artwork: ArtworkResolver::new(
                http_client.clone(),
                config.artwork.search_endpoint.clone(),
                config.artwork.logo_base_url.clone(),
                config.sync.lookup_timeout,
            ),
            schedule: ScheduleFetcher::new(
                http_client.clone(),
                config.schedule.url.clone(),
                config.schedule.timeout,
            ),
            http_client,
        };

        Self::new(
            services,
            state,
            config.sync.source_timeout,
            config.sync.max_concurrency,
        )
    }

    pub fn with_metrics(mut self, metrics: SyncMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    /// Run a full sync over `sources` and publish the result
    ///
    /// Fails only when there is nothing to sync from. Unreachable sources and
    /// failed enrichment calls are absorbed; the snapshot is committed even
    /// when it ends up empty.
    pub async fn sync(&self, sources: &[String]) -> AppResult<Arc<CommittedState>> {
        if sources.is_empty() {
            warn!("Sync requested with no sources configured");
            self.metrics.record_rejected("no_sources");
            return Err(AppError::NoSourcesConfigured);
        }

        let started = Instant::now();
        info!("Starting sync of {} sources", sources.len());

        let mut stats = SyncStats {
            sources_total: sources.len(),
            ..SyncStats::default()
        };

        let bodies: Vec<Option<String>> = stream::iter(sources)
            .map(|url| self.fetch_source(url))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let mut entries = Vec::new();
        for body in bodies {
            match body {
                Some(body) => entries.extend(parse_m3u(&body)),
                None => stats.sources_failed += 1,
            }
        }
        stats.entries_parsed = entries.len();

        let candidates = self.classify_entries(entries).await;
        stats.entries_filtered = stats.entries_parsed - candidates.len();

        let (entries, renamed) = deduplicate_names(candidates);
        stats.entries_renamed = renamed;

        let entries = self.enrich_entries(entries).await;

        let committed = self
            .state
            .commit(CommittedState {
                entries,
                synced_at: Utc::now(),
                stats,
            })
            .await;

        let elapsed = started.elapsed();
        self.metrics
            .record_sync(&committed.stats, committed.entries.len(), elapsed);

        info!(
            "Sync completed in {}: {} entries committed ({} parsed, {} filtered, {} renamed, {}/{} sources failed)",
            humantime::format_duration(Duration::from_millis(elapsed.as_millis() as u64)),
            committed.entries.len(),
            committed.stats.entries_parsed,
            committed.stats.entries_filtered,
            committed.stats.entries_renamed,
            committed.stats.sources_failed,
            committed.stats.sources_total
        );

        Ok(committed)
    }

    async fn fetch_source(&self, url: &str) -> Option<String> {
        let display_url = UrlUtils::obfuscate_credentials(url);

        match self
            .services
            .http_client
            .get(url, &[], self.source_timeout)
            .await
        {
            Ok(response) if response.is_success() => {
                debug!("Fetched {} ({} bytes)", display_url, response.body.len());
                Some(response.body)
            }
            Ok(response) => {
                warn!(
                    "Source {} returned status {}, skipping",
                    display_url, response.status
                );
                None
            }
            Err(e) => {
                warn!("Failed to fetch source {}: {}", display_url, e);
                None
            }
        }
    }

    /// Keep English entries with a known category, labelled with it
    async fn classify_entries(&self, entries: Vec<Entry>) -> Vec<Entry> {
        let verdicts: Vec<_> = stream::iter(&entries)
            .map(|entry| self.services.classifier.admit(&entry.display_name))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        entries
            .into_iter()
            .zip(verdicts)
            .filter_map(|(mut entry, verdict)| {
                let category = verdict?;
                entry.category = category.to_string();
                Some(entry)
            })
            .collect()
    }

    /// Attach liveness, artwork and schedule data
    async fn enrich_entries(&self, entries: Vec<Entry>) -> Vec<Entry> {
        let (schedule, statuses, logos) = tokio::join!(
            self.services.schedule.fetch_schedule(),
            stream::iter(&entries)
                .map(|entry| self.services.prober.live_status(&entry.stream_url))
                .buffered(self.max_concurrency)
                .collect::<Vec<_>>(),
            stream::iter(&entries)
                .map(|entry| {
                    self.services
                        .artwork
                        .resolve_logo(&entry.display_name, &entry.id)
                })
                .buffered(self.max_concurrency)
                .collect::<Vec<_>>(),
        );

        entries
            .into_iter()
            .zip(statuses)
            .zip(logos)
            .map(|((mut entry, status), logo_url)| {
                entry.live_status = Some(status);
                entry.logo_url = logo_url;
                if !entry.id.is_empty() {
                    entry.schedule = schedule.get(&entry.id).cloned().unwrap_or_default();
                }
                entry
            })
            .collect()
    }
}

/// Make display names unique, keeping order
///
/// The k-th occurrence of a name becomes `"<name> k"`. If that name is
/// already taken the counter keeps climbing until it is free. Returns the
/// entries and how many were renamed.
pub fn deduplicate_names(entries: Vec<Entry>) -> (Vec<Entry>, usize) {
    let mut occurrences: HashMap<String, usize> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::with_capacity(entries.len());
    let mut renamed = 0;
    let mut result = Vec::with_capacity(entries.len());

    for mut entry in entries {
        let count = occurrences.entry(entry.display_name.clone()).or_insert(0);
        *count += 1;

        let mut candidate = if *count == 1 {
            entry.display_name.clone()
        } else {
            format!("{} {}", entry.display_name, count)
        };
        while taken.contains(&candidate) {
            *count += 1;
            candidate = format!("{} {}", entry.display_name, count);
        }

        if candidate != entry.display_name {
            debug!("Renaming duplicate '{}' to '{}'", entry.display_name, candidate);
            entry.display_name = candidate.clone();
            renamed += 1;
        }

        taken.insert(candidate);
        result.push(entry);
    }

    (result, renamed)
}
