use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Category assigned at parse time before classification has run
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// One playlist item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Source-declared identifier (`tvg-id`), may be empty
    pub id: String,
    pub display_name: String,
    /// `tvg-name` hint from the metadata line
    pub name_hint: String,
    pub logo_url: String,
    pub category: String,
    pub stream_url: String,
    pub live_status: Option<LiveStatus>,
    pub schedule: Vec<ScheduleSlot>,
}

impl Entry {
    /// Create a freshly parsed entry with no enrichment applied
    pub fn new<N: Into<String>, U: Into<String>>(display_name: N, stream_url: U) -> Self {
        Self {
            id: String::new(),
            display_name: display_name.into(),
            name_hint: String::new(),
            logo_url: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            stream_url: stream_url.into(),
            live_status: None,
            schedule: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiveStatus {
    Live,
    Offline,
}

impl LiveStatus {
    pub fn from_reachable(reachable: bool) -> Self {
        if reachable {
            LiveStatus::Live
        } else {
            LiveStatus::Offline
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LiveStatus::Live => "Live",
            LiveStatus::Offline => "Offline",
        }
    }
}

impl std::fmt::Display for LiveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed label set the classifier may answer with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Sports,
    Music,
    News,
    Entertainment,
    Kids,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Sports,
        Category::Music,
        Category::News,
        Category::Entertainment,
        Category::Kids,
        Category::Other,
    ];

    /// Map a raw classifier answer onto the label set; anything outside the
    /// set collapses to `Other`
    pub fn from_label(label: &str) -> Self {
        let cleaned = label
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c.is_whitespace());

        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(cleaned))
            .unwrap_or(Category::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Sports => "Sports",
            Category::Music => "Music",
            Category::News => "News",
            Category::Entertainment => "Entertainment",
            Category::Kids => "Kids",
            Category::Other => "Other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One programme slot from the schedule document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub start: String,
    pub stop: String,
    pub title: String,
}

/// Schedule slots indexed by entry id
pub type ScheduleIndex = HashMap<String, Vec<ScheduleSlot>>;

/// Counters describing how a sync run arrived at its entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    pub sources_total: usize,
    pub sources_failed: usize,
    pub entries_parsed: usize,
    pub entries_filtered: usize,
    pub entries_renamed: usize,
}

/// The single published snapshot of enriched entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommittedState {
    pub entries: Vec<Entry>,
    pub synced_at: DateTime<Utc>,
    #[serde(default)]
    pub stats: SyncStats,
}

impl CommittedState {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_label() {
        assert_eq!(Category::from_label("News"), Category::News);
        assert_eq!(Category::from_label(" sports.\n"), Category::Sports);
        assert_eq!(Category::from_label("\"Kids\""), Category::Kids);
        assert_eq!(Category::from_label("Documentary"), Category::Other);
        assert_eq!(Category::from_label(""), Category::Other);
    }

    #[test]
    fn test_new_entry_defaults() {
        let entry = Entry::new("News24", "http://example.com/n24.m3u8");
        assert_eq!(entry.category, DEFAULT_CATEGORY);
        assert!(entry.id.is_empty());
        assert!(entry.live_status.is_none());
        assert!(entry.schedule.is_empty());
    }

    #[test]
    fn test_live_status_from_reachable() {
        assert_eq!(LiveStatus::from_reachable(true), LiveStatus::Live);
        assert_eq!(LiveStatus::from_reachable(false).to_string(), "Offline");
    }
}
