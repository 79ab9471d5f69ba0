//! Sync pipeline: orchestration, snapshot storage, the persisted source list
//! and periodic resync

pub mod scheduler;
pub mod source_list;
pub mod state_manager;
pub mod sync;

pub use scheduler::SyncScheduler;
pub use source_list::SourceListStore;
pub use state_manager::StateStore;
pub use sync::{SyncOrchestrator, SyncServices, deduplicate_names};
