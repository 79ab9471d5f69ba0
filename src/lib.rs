//! Playlist synchronization engine
//!
//! Aggregates remote M3U playlists into one deduplicated, classified and
//! enriched feed, published as an atomically replaced snapshot.

pub mod config;
pub mod errors;
pub mod ingestor;
pub mod models;
pub mod observability;
pub mod proxy;
pub mod services;
pub mod sources;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;
