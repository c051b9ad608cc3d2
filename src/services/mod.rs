//! Service contracts consumed by the orchestration layer
//!
//! This module defines the abstract boundaries to the remote publish and
//! settings services, plus the HTTP adapters implementing them.

pub mod http;
pub mod traits;

// Re-export main types for convenience
pub use http::{HttpPublishService, HttpSettingsService};
pub use traits::{AutoConfirm, ConfirmPrompt, PublishService, SettingsService};
