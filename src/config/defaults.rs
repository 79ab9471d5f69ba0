/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Sync defaults
pub const DEFAULT_SOURCE_TIMEOUT: &str = "10s";
pub const DEFAULT_PROBE_TIMEOUT: &str = "5s";
pub const DEFAULT_LOOKUP_TIMEOUT: &str = "10s";
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;
pub const DEFAULT_SOURCES_FILE: &str = "./sources.json";

// Classifier defaults
pub const DEFAULT_CLASSIFIER_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_CLASSIFIER_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_CLASSIFIER_TIMEOUT: &str = "15s";
pub const DEFAULT_CLASSIFIER_MAX_TOKENS: u32 = 10;

// Artwork defaults
pub const DEFAULT_ARTWORK_SEARCH_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_LOGO_BASE_URL: &str = "https://iptv-org.github.io/logos/";

// Schedule defaults
pub const DEFAULT_SCHEDULE_URL: &str = "https://iptv-org.github.io/epg/guide.xml";
pub const DEFAULT_SCHEDULE_TIMEOUT: &str = "30s";

// Environment overrides
pub const CONFIG_FILE_ENV: &str = "PLAYLIST_SYNC_CONFIG";
pub const CLASSIFIER_API_KEY_ENV: &str = "OPENAI_API_KEY";
