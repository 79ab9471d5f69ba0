//! Output side: rendering committed snapshots and serving the current one

pub mod feed;
pub mod generator;

pub use feed::FeedService;
pub use generator::{render_m3u, render_xmltv};
