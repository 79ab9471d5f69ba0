//! Enrichment services
//!
//! Each service wraps one external capability and folds its failures into a
//! documented fallback value, so callers never see an enrichment error:
//!
//! - [`LivenessProber`]: unreachable streams are `Offline`
//! - [`CategoryClassifier`]: failed calls exclude the entry
//! - [`ArtworkResolver`]: failed lookups use the id-based fallback logo

pub mod artwork;
pub mod classifier;
pub mod liveness;

pub use artwork::{ArtworkResolver, fallback_logo_url};
pub use classifier::{CategoryClassifier, CompletionClient, OpenAiCompletionClient};
pub use liveness::LivenessProber;
