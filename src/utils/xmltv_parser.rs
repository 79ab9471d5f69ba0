//! Quick-XML based XMLTV parser
//!
//! Only the fields the schedule merge uses are deserialized: channel ids and,
//! per programme, its channel, start, stop and first title. Everything else
//! in the document is skipped.

use serde::Deserialize;
use std::collections::HashSet;

use crate::errors::{AppError, AppResult};
use crate::models::{ScheduleIndex, ScheduleSlot};

#[derive(Debug, Deserialize)]
#[serde(rename = "tv")]
struct XmltvDocument {
    #[serde(rename = "channel", default)]
    channels: Vec<XmltvChannel>,
    #[serde(rename = "programme", default)]
    programmes: Vec<XmltvProgramme>,
}

#[derive(Debug, Deserialize)]
struct XmltvChannel {
    #[serde(rename = "@id", default)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct XmltvProgramme {
    #[serde(rename = "@channel", default)]
    channel: String,
    #[serde(rename = "@start", default)]
    start: String,
    #[serde(rename = "@stop", default)]
    stop: String,
    #[serde(rename = "title", default)]
    titles: Vec<XmltvText>,
}

#[derive(Debug, Deserialize)]
struct XmltvText {
    #[serde(rename = "$text", default)]
    value: String,
}

/// Parse an XMLTV document into schedule slots keyed by channel id
///
/// Programmes whose channel is not declared by a `<channel id="...">`
/// element are discarded. Slots keep document order.
pub fn parse_schedule(content: &str) -> AppResult<ScheduleIndex> {
    let document: XmltvDocument = quick_xml::de::from_str(content)
        .map_err(|e| AppError::parse_error("xmltv", format!("XML parsing error: {e}")))?;

    let channel_ids: HashSet<&str> = document
        .channels
        .iter()
        .map(|channel| channel.id.trim())
        .filter(|id| !id.is_empty())
        .collect();

    let mut index = ScheduleIndex::new();
    for programme in &document.programmes {
        let channel = programme.channel.trim();
        if !channel_ids.contains(channel) {
            continue;
        }

        let title = programme
            .titles
            .first()
            .map(|title| title.value.trim().to_string())
            .unwrap_or_default();

        index
            .entry(channel.to_string())
            .or_default()
            .push(ScheduleSlot {
                start: programme.start.clone(),
                stop: programme.stop.clone(),
                title,
            });
    }

    Ok(index)
}
