//! Durations in config files: whole seconds (`10`) or humantime text (`"1h30m"`)
//!
//! Both forms are read back; durations are always written as text.

use serde::{Deserialize, Deserializer, Serializer, de};
use std::time::Duration;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(u64),
    Text(String),
}

impl RawDuration {
    fn into_duration<E: de::Error>(self) -> Result<Duration, E> {
        match self {
            Self::Seconds(seconds) => Ok(Duration::from_secs(seconds)),
            Self::Text(text) => humantime::parse_duration(&text)
                .map_err(|e| E::custom(format!("Invalid duration '{text}': {e}"))),
        }
    }
}

fn format(duration: &Duration) -> String {
    humantime::format_duration(*duration).to_string()
}

pub mod duration {
    use super::*;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        RawDuration::deserialize(deserializer)
            .map_err(|_| {
                <D::Error as de::Error>::custom(
                    "expected seconds or a duration such as \"5s\" or \"1h30m\"",
                )
            })?
            .into_duration()
    }
}

/// Same forms as [`duration`]; an absent value stays `None`
pub mod option_duration {
    use super::*;

    pub fn serialize<S: Serializer>(
        duration: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match duration {
            Some(duration) => serializer.serialize_some(&format(duration)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<RawDuration>::deserialize(deserializer)?
            .map(RawDuration::into_duration)
            .transpose()
    }
}
