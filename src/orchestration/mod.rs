//! Orchestration layer for publish profile management
//!
//! This module provides the high-level components coordinating the target
//! store, history aggregation, status polling, and action dispatch.

pub mod history;
pub mod publisher;
pub mod status_poller;
pub mod target_store;

// Re-export main types for convenience
pub use history::{HistoryCache, aggregate};
pub use publisher::PublishOrchestrator;
pub use status_poller::{PollUpdate, PollerOptions, StatusPoller};
pub use target_store::TargetStore;
