//! Utility modules shared by the sync services
//!
//! HTTP access, content decompression, XMLTV parsing and URL helpers.

pub mod decompression;
pub mod http_client;
pub mod url;
pub mod xmltv_parser;

pub use decompression::{CompressionFormat, DecompressionService};
pub use http_client::{FetchResponse, HttpFetcher, StandardHttpClient};
