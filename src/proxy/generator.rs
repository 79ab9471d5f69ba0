//! Output rendering for a committed snapshot
//!
//! Both renderers are pure functions of [`CommittedState`].

use quick_xml::escape::escape;
use std::collections::HashSet;
use std::fmt::Write as _;

use crate::models::CommittedState;

/// Render the snapshot as an extended M3U playlist
///
/// `tvg-name` carries the source's own name hint. The label after the comma
/// is the display name plus the live status when one was probed; parsing
/// strips that status again.
pub fn render_m3u(state: &CommittedState) -> String {
    let mut m3u = String::from("#EXTM3U\n");

    for entry in &state.entries {
        let label = match entry.live_status {
            Some(status) => format!("{} ({})", entry.display_name, status),
            None => entry.display_name.clone(),
        };

        let _ = writeln!(
            m3u,
            "#EXTINF:-1 tvg-id=\"{}\" tvg-name=\"{}\" tvg-logo=\"{}\" group-title=\"{}\",{}",
            attribute_value(&entry.id),
            attribute_value(&entry.name_hint),
            attribute_value(&entry.logo_url),
            attribute_value(&entry.category),
            single_line(&label)
        );
        let _ = writeln!(m3u, "{}", entry.stream_url);
    }

    m3u
}

/// Render the schedules carried by the snapshot as an XMLTV guide
///
/// Only entries with an id are listed; each id appears once.
pub fn render_xmltv(state: &CommittedState) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<tv generator-info-name=\"playlist-sync\">\n");

    let mut seen = HashSet::new();
    let channels: Vec<_> = state
        .entries
        .iter()
        .filter(|entry| !entry.id.is_empty() && seen.insert(entry.id.as_str()))
        .collect();

    for entry in &channels {
        let _ = writeln!(xml, "  <channel id=\"{}\">", escape(entry.id.as_str()));
        let _ = writeln!(
            xml,
            "    <display-name>{}</display-name>",
            escape(entry.display_name.as_str())
        );
        if !entry.logo_url.is_empty() {
            let _ = writeln!(xml, "    <icon src=\"{}\"/>", escape(entry.logo_url.as_str()));
        }
        xml.push_str("  </channel>\n");
    }

    for entry in &channels {
        for slot in &entry.schedule {
            let _ = writeln!(
                xml,
                "  <programme start=\"{}\" stop=\"{}\" channel=\"{}\">",
                escape(slot.start.as_str()),
                escape(slot.stop.as_str()),
                escape(entry.id.as_str())
            );
            let _ = writeln!(xml, "    <title>{}</title>", escape(slot.title.as_str()));
            xml.push_str("  </programme>\n");
        }
    }

    xml.push_str("</tv>\n");
    xml
}

fn attribute_value(value: &str) -> String {
    single_line(value).replace('"', "'")
}

fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}
