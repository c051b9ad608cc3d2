//! Abstract contracts for the consumed remote services
//!
//! The orchestrator never talks to a concrete API; it holds trait objects for
//! the publish service, the settings service, and the confirmation prompt.
//! Production wiring uses the HTTP adapters in [`super::http`]; tests swap in
//! in-memory fakes.

use crate::core::types::{
    ProjectSettings, PublishHistoryRecord, PublishRequest, PublishTarget, PublishType,
};
use crate::security::SecretBundle;
use async_trait::async_trait;

/// Remote publish service boundary
///
/// History sequences are returned newest-first; `fetch_publish_status`
/// returns the freshest record for a target so the caller can fold it into
/// its history cache.
#[async_trait]
pub trait PublishService: Send + Sync {
    /// Load the registered publish types for a project
    async fn load_publish_target_types(&self, project_id: &str)
    -> anyhow::Result<Vec<PublishType>>;

    /// Load the publish history of one target, newest-first
    async fn load_publish_history(
        &self,
        project_id: &str,
        target: &PublishTarget,
    ) -> anyhow::Result<Vec<PublishHistoryRecord>>;

    /// Fetch the freshest status record for one target
    async fn fetch_publish_status(
        &self,
        project_id: &str,
        target: &PublishTarget,
    ) -> anyhow::Result<PublishHistoryRecord>;

    /// Start a publish to a target, returning the new (usually pending) record
    async fn publish_to_target(
        &self,
        project_id: &str,
        target: &PublishTarget,
        request: &PublishRequest,
        secrets: &SecretBundle,
    ) -> anyhow::Result<PublishHistoryRecord>;

    /// Roll a target back to a prior successful version
    async fn rollback_to_version(
        &self,
        project_id: &str,
        target: &PublishTarget,
        version_id: &str,
        secrets: &SecretBundle,
    ) -> anyhow::Result<()>;
}

/// Remote settings service boundary
///
/// The settings document is saved whole; the caller owns read-modify-write
/// ordering (last write wins).
#[async_trait]
pub trait SettingsService: Send + Sync {
    /// Load the project settings document
    async fn load_settings(
        &self,
        project_id: &str,
        bot_name: &str,
    ) -> anyhow::Result<ProjectSettings>;

    /// Persist the full project settings document
    async fn save_settings(
        &self,
        project_id: &str,
        bot_name: &str,
        settings: &ProjectSettings,
    ) -> anyhow::Result<()>;
}

/// Blocking yes/no confirmation, resolved asynchronously
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    async fn confirm(&self, message: &str) -> anyhow::Result<bool>;
}

/// Prompt that answers every confirmation with a fixed value
///
/// Used by non-interactive callers (`--yes`) and tests.
pub struct AutoConfirm(pub bool);

#[async_trait]
impl ConfirmPrompt for AutoConfirm {
    async fn confirm(&self, _message: &str) -> anyhow::Result<bool> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_auto_confirm_answers_fixed_value() {
        assert!(AutoConfirm(true).confirm("continue?").await.unwrap());
        assert!(!AutoConfirm(false).confirm("continue?").await.unwrap());
    }

    #[test]
    fn test_traits_are_object_safe() {
        fn assert_usable(_: &dyn ConfirmPrompt) {}
        assert_usable(&AutoConfirm(true));
    }
}
