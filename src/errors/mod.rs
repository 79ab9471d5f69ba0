//! Centralized error handling for the playlist sync engine
//!
//! # Error Categories
//!
//! - **Precondition Errors**: sync with no sources, feed requested before a sync
//! - **Source Errors**: a single external fetch or parse failed
//! - **Configuration Errors**: invalid or unreadable configuration
//!
//! # Usage
//!
//! ```rust
//! use playlist_sync::errors::{AppError, AppResult};
//!
//! fn require_sources(sources: &[String]) -> AppResult<()> {
//!     if sources.is_empty() {
//!         return Err(AppError::NoSourcesConfigured);
//!     }
//!     Ok(())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;
