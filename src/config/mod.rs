use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub mod defaults;
pub mod duration_serde;

use defaults::*;
use duration_serde::{duration, option_duration};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub artwork: ArtworkConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Fan-out and timeout settings for a sync run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Per-request timeout when fetching a source playlist
    #[serde(with = "duration", default = "default_source_timeout")]
    pub source_timeout: Duration,
    /// Timeout for the liveness HEAD request
    #[serde(with = "duration", default = "default_probe_timeout")]
    pub probe_timeout: Duration,
    /// Timeout for each knowledge-base lookup hop
    #[serde(with = "duration", default = "default_lookup_timeout")]
    pub lookup_timeout: Duration,
    /// Maximum in-flight calls per fan-out stage
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Resync period for `watch` mode
    #[serde(
        with = "option_duration",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub interval: Option<Duration>,
    /// JSON file holding the ordered source URL list
    #[serde(default = "default_sources_file")]
    pub sources_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// OpenAI-compatible chat completions endpoint
    #[serde(default = "default_classifier_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_classifier_model")]
    pub model: String,
    /// Empty means "read OPENAI_API_KEY"
    #[serde(default)]
    pub api_key: String,
    #[serde(with = "duration", default = "default_classifier_timeout")]
    pub timeout: Duration,
    #[serde(default = "default_classifier_max_tokens")]
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtworkConfig {
    /// MediaWiki-style API used for the search/images/imageinfo hops
    #[serde(default = "default_artwork_search_endpoint")]
    pub search_endpoint: String,
    /// Prefix for the `<id>.png` fallback logo
    #[serde(default = "default_logo_base_url")]
    pub logo_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// XMLTV document to merge schedules from
    #[serde(default = "default_schedule_url")]
    pub url: String,
    #[serde(with = "duration", default = "default_schedule_timeout")]
    pub timeout: Duration,
}

fn parse_default_duration(value: &str) -> Duration {
    humantime::parse_duration(value).unwrap_or(Duration::from_secs(10))
}

fn default_source_timeout() -> Duration {
    parse_default_duration(DEFAULT_SOURCE_TIMEOUT)
}

fn default_probe_timeout() -> Duration {
    parse_default_duration(DEFAULT_PROBE_TIMEOUT)
}

fn default_lookup_timeout() -> Duration {
    parse_default_duration(DEFAULT_LOOKUP_TIMEOUT)
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_sources_file() -> PathBuf {
    PathBuf::from(DEFAULT_SOURCES_FILE)
}

fn default_classifier_endpoint() -> String {
    DEFAULT_CLASSIFIER_ENDPOINT.to_string()
}

fn default_classifier_model() -> String {
    DEFAULT_CLASSIFIER_MODEL.to_string()
}

fn default_classifier_timeout() -> Duration {
    parse_default_duration(DEFAULT_CLASSIFIER_TIMEOUT)
}

fn default_classifier_max_tokens() -> u32 {
    DEFAULT_CLASSIFIER_MAX_TOKENS
}

fn default_artwork_search_endpoint() -> String {
    DEFAULT_ARTWORK_SEARCH_ENDPOINT.to_string()
}

fn default_logo_base_url() -> String {
    DEFAULT_LOGO_BASE_URL.to_string()
}

fn default_schedule_url() -> String {
    DEFAULT_SCHEDULE_URL.to_string()
}

fn default_schedule_timeout() -> Duration {
    parse_default_duration(DEFAULT_SCHEDULE_TIMEOUT)
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source_timeout: default_source_timeout(),
            probe_timeout: default_probe_timeout(),
            lookup_timeout: default_lookup_timeout(),
            max_concurrency: default_max_concurrency(),
            interval: None,
            sources_file: default_sources_file(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: default_classifier_endpoint(),
            model: default_classifier_model(),
            api_key: String::new(),
            timeout: default_classifier_timeout(),
            max_tokens: default_classifier_max_tokens(),
        }
    }
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        Self {
            search_endpoint: default_artwork_search_endpoint(),
            logo_base_url: default_logo_base_url(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            url: default_schedule_url(),
            timeout: default_schedule_timeout(),
        }
    }
}

impl ClassifierConfig {
    /// API key from the file, falling back to the environment
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.api_key.is_empty() {
            return Some(self.api_key.clone());
        }
        std::env::var(CLASSIFIER_API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    pub fn load_from_file<P: AsRef<Path>>(config_file: P) -> Result<Self> {
        let path = config_file.as_ref();
        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(path, contents)?;
            info!("Created default config file: {}", path.display());
            default_config
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sync.max_concurrency == 0 {
            anyhow::bail!("sync.max_concurrency must be at least 1");
        }
        if self.classifier.max_tokens == 0 {
            anyhow::bail!("classifier.max_tokens must be at least 1");
        }
        if let Some(interval) = self.sync.interval {
            if interval < Duration::from_secs(60) {
                warn!(
                    "sync.interval of {} is very short; every run re-probes all entries",
                    humantime::format_duration(interval)
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.sync.source_timeout, Duration::from_secs(10));
        assert_eq!(config.sync.probe_timeout, Duration::from_secs(5));
        assert_eq!(config.sync.max_concurrency, DEFAULT_MAX_CONCURRENCY);
        assert!(config.sync.interval.is_none());
        assert_eq!(config.classifier.max_tokens, DEFAULT_CLASSIFIER_MAX_TOKENS);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [sync]
            source_timeout = "3s"
            interval = "1h"

            [artwork]
            logo_base_url = "https://logos.example.com/"
            "#,
        )
        .unwrap();

        assert_eq!(config.sync.source_timeout, Duration::from_secs(3));
        assert_eq!(config.sync.interval, Some(Duration::from_secs(3600)));
        assert_eq!(config.sync.probe_timeout, Duration::from_secs(5));
        assert_eq!(config.artwork.logo_base_url, "https://logos.example.com/");
        assert_eq!(config.artwork.search_endpoint, DEFAULT_ARTWORK_SEARCH_ENDPOINT);
        assert_eq!(config.schedule.url, DEFAULT_SCHEDULE_URL);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let created = Config::load_from_file(&path).unwrap();
        assert!(path.exists());

        let reloaded = Config::load_from_file(&path).unwrap();
        assert_eq!(reloaded.sync.source_timeout, created.sync.source_timeout);
        assert_eq!(reloaded.classifier.model, created.classifier.model);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = Config::default();
        config.sync.max_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let config = ClassifierConfig {
            api_key: "sk-test".to_string(),
            ..ClassifierConfig::default()
        };
        assert_eq!(config.resolved_api_key().as_deref(), Some("sk-test"));
    }
}
