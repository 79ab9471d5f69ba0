//! Source handlers
//!
//! Turning fetched documents into domain data: M3U playlists into entries,
//! XMLTV guides into schedule slots.

pub mod m3u;
pub mod xmltv;

pub use m3u::parse_m3u;
pub use xmltv::ScheduleFetcher;
