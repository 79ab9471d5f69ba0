//! M3U playlist parsing
//!
//! Parses extended M3U text (`#EXTM3U` / `#EXTINF`) into [`Entry`] records.
//! Parsing is total: malformed input produces fewer entries, never an error.
//!
//! A metadata line opens a pending entry; the next line that is neither blank
//! nor a `#` comment is that entry's stream URL and completes it. A pending
//! entry with no URL before end of input is discarded, as is a URL line with
//! no pending entry.
//!
//! A trailing ` (Live)` or ` (Offline)` on a label is the status marker our
//! own rendered feeds carry, and is not part of the display name.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, trace};

use crate::models::{DEFAULT_CATEGORY, Entry, LiveStatus};

const EXTINF_PREFIX: &str = "#EXTINF:";

static ATTRIBUTE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"([A-Za-z0-9_-]+)\s*=\s*"([^"]*)""#).ok());

/// Partial entry built from a metadata line, waiting for its URL line
#[derive(Debug)]
struct PendingEntry {
    id: String,
    display_name: String,
    name_hint: String,
    logo_url: String,
    category: String,
}

impl PendingEntry {
    fn complete(self, stream_url: &str) -> Entry {
        Entry {
            id: self.id,
            display_name: self.display_name,
            name_hint: self.name_hint,
            logo_url: self.logo_url,
            category: self.category,
            stream_url: stream_url.to_string(),
            live_status: None,
            schedule: Vec::new(),
        }
    }
}

/// Parse playlist text into entries, in document order
pub fn parse_m3u(content: &str) -> Vec<Entry> {
    let mut entries = Vec::new();
    let mut pending: Option<PendingEntry> = None;
    let mut malformed = 0usize;
    let mut orphan_urls = 0usize;

    for (line_num, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();

        if line.is_empty() {
            continue;
        }

        if line.starts_with(EXTINF_PREFIX) {
            if pending.is_some() {
                trace!("Metadata at line {} replaces an entry with no URL", line_num + 1);
            }
            pending = parse_extinf_line(line);
            if pending.is_none() {
                malformed += 1;
                debug!("Ignoring malformed EXTINF at line {}", line_num + 1);
            }
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        match pending.take() {
            Some(partial) => entries.push(partial.complete(line)),
            None => {
                orphan_urls += 1;
                trace!("Dropping URL without metadata at line {}", line_num + 1);
            }
        }
    }

    if pending.is_some() {
        debug!("Dropping trailing metadata line with no URL");
    }

    debug!(
        "Parsed {} entries ({} malformed metadata lines, {} orphan URLs)",
        entries.len(),
        malformed,
        orphan_urls
    );

    entries
}

/// Parse one `#EXTINF:<duration> key="value" ...,<label>` line
///
/// Returns `None` when the line has no label separator or no usable name.
fn parse_extinf_line(line: &str) -> Option<PendingEntry> {
    let content = line.strip_prefix(EXTINF_PREFIX)?;
    let separator = find_label_separator(content)?;
    let (attrs_part, label) = content.split_at(separator);
    let label = strip_status_suffix(label.trim_start_matches(',').trim());

    let attributes = parse_extinf_attributes(attrs_part);
    let attribute = |key: &str| attributes.get(key).cloned().unwrap_or_default();

    let name_hint = attribute("tvg-name");
    let display_name = if label.is_empty() {
        name_hint.trim().to_string()
    } else {
        label.to_string()
    };

    if display_name.is_empty() {
        return None;
    }

    let category = match attributes.get("group-title") {
        Some(group) if !group.trim().is_empty() => group.clone(),
        _ => DEFAULT_CATEGORY.to_string(),
    };

    Some(PendingEntry {
        id: attribute("tvg-id"),
        display_name,
        name_hint,
        logo_url: attribute("tvg-logo"),
        category,
    })
}

/// Drop the ` (Live)` / ` (Offline)` marker rendered feeds append to labels
fn strip_status_suffix(label: &str) -> &str {
    [LiveStatus::Live, LiveStatus::Offline]
        .iter()
        .find_map(|status| {
            label
                .strip_suffix(')')
                .and_then(|rest| rest.strip_suffix(status.as_str()))
                .and_then(|rest| rest.strip_suffix(" ("))
        })
        .map(str::trim_end)
        .filter(|name| !name.is_empty())
        .unwrap_or(label)
}

/// Byte offset of the first comma that is not inside a quoted value
fn find_label_separator(content: &str) -> Option<usize> {
    let mut in_quotes = false;
    for (offset, ch) in content.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => return Some(offset),
            _ => {}
        }
    }
    None
}

/// Collect `key="value"` pairs; first occurrence of a key wins
fn parse_extinf_attributes(attrs_part: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    let Some(re) = ATTRIBUTE.as_ref() else {
        return attributes;
    };

    for captures in re.captures_iter(attrs_part) {
        if let (Some(key), Some(value)) = (captures.get(1), captures.get(2)) {
            attributes
                .entry(key.as_str().to_ascii_lowercase())
                .or_insert_with(|| value.as_str().to_string());
        }
    }

    attributes
}
