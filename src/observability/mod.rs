use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram, Meter, MeterProvider},
};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use std::time::Duration;
use tracing::info;

use crate::models::SyncStats;

/// Metrics instruments recorded by each sync run
#[derive(Clone)]
pub struct SyncMetrics {
    pub meter: Meter,

    pub sync_runs: Counter<u64>,
    pub sync_duration: Histogram<f64>,
    pub sources_failed: Counter<u64>,
    pub entries_parsed: Counter<u64>,
    pub entries_filtered: Counter<u64>,
    pub entries_renamed: Counter<u64>,
    pub entries_committed: Counter<u64>,
}

impl std::fmt::Debug for SyncMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncMetrics").finish_non_exhaustive()
    }
}

impl SyncMetrics {
    /// Install a local SDK meter provider as the global provider and build
    /// instruments from it
    pub fn init(service_name: &'static str) -> Self {
        let provider = SdkMeterProvider::builder().build();
        global::set_meter_provider(provider.clone());

        let meter = provider.meter(service_name);
        info!("OpenTelemetry configured: local metrics for {}", service_name);
        Self::build_with_instruments(meter)
    }

    /// Instruments from whatever global provider is installed; no-ops if none
    pub fn from_global() -> Self {
        Self::build_with_instruments(global::meter("playlist-sync"))
    }

    fn build_with_instruments(meter: Meter) -> Self {
        let sync_runs = meter
            .u64_counter("sync_runs_total")
            .with_description("Sync runs by outcome")
            .build();
        let sync_duration = meter
            .f64_histogram("sync_duration_seconds")
            .with_description("Time taken by a complete sync run")
            .build();
        let sources_failed = meter
            .u64_counter("sources_failed_total")
            .with_description("Source playlists that could not be fetched")
            .build();
        let entries_parsed = meter
            .u64_counter("entries_parsed_total")
            .with_description("Entries parsed from source playlists")
            .build();
        let entries_filtered = meter
            .u64_counter("entries_filtered_total")
            .with_description("Entries excluded by the language gate or classifier")
            .build();
        let entries_renamed = meter
            .u64_counter("entries_renamed_total")
            .with_description("Entries renamed to resolve display name collisions")
            .build();
        let entries_committed = meter
            .u64_counter("entries_committed_total")
            .with_description("Entries published in committed snapshots")
            .build();

        Self {
            meter,
            sync_runs,
            sync_duration,
            sources_failed,
            entries_parsed,
            entries_filtered,
            entries_renamed,
            entries_committed,
        }
    }

    pub fn record_sync(&self, stats: &SyncStats, committed: usize, elapsed: Duration) {
        self.sync_runs
            .add(1, &[KeyValue::new("outcome", "committed")]);
        self.sync_duration.record(elapsed.as_secs_f64(), &[]);
        self.sources_failed.add(stats.sources_failed as u64, &[]);
        self.entries_parsed.add(stats.entries_parsed as u64, &[]);
        self.entries_filtered.add(stats.entries_filtered as u64, &[]);
        self.entries_renamed.add(stats.entries_renamed as u64, &[]);
        self.entries_committed.add(committed as u64, &[]);
    }

    pub fn record_rejected(&self, reason: &'static str) {
        self.sync_runs
            .add(1, &[KeyValue::new("outcome", reason)]);
    }
}
