//! Target store - the publish profile list inside the project settings
//!
//! The settings document is the single source of truth for target identity.
//! Every mutation builds the next document, round-trips it through the
//! settings service, and only then replaces the in-memory copy; a failed save
//! leaves the store unchanged. Mutations take `&mut self`, so a second
//! mutation cannot start while one is outstanding.

use crate::core::error::ProfileError;
use crate::core::types::{ProjectSettings, PublishTarget};
use crate::services::traits::{ConfirmPrompt, SettingsService};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Confirmation message shown before a profile is deleted
const DELETE_CONFIRM_MESSAGE: &str = "This will delete the profile. Do you wish to continue?";

/// In-memory view of the configured publish targets, persisted remotely
pub struct TargetStore {
    project_id: String,
    bot_name: String,
    settings: ProjectSettings,
    service: Arc<dyn SettingsService>,
}

impl TargetStore {
    /// Create an empty store bound to a project and settings service
    pub fn new(
        project_id: impl Into<String>,
        bot_name: impl Into<String>,
        service: Arc<dyn SettingsService>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            bot_name: bot_name.into(),
            settings: ProjectSettings::default(),
            service,
        }
    }

    /// Refresh the in-memory settings document from the remote service
    pub async fn load(&mut self) -> Result<(), ProfileError> {
        self.settings = self
            .service
            .load_settings(&self.project_id, &self.bot_name)
            .await
            .map_err(|e| ProfileError::remote("settings", e))?;
        Ok(())
    }

    /// Current target list, in settings-document order
    pub fn targets(&self) -> &[PublishTarget] {
        &self.settings.publish_targets
    }

    /// The full settings document (targets plus unmodeled keys)
    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    /// Find a target by name
    pub fn find(&self, name: &str) -> Option<&PublishTarget> {
        self.settings.publish_targets.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.settings.publish_targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.publish_targets.is_empty()
    }

    /// Append a new target and persist the settings document
    ///
    /// Rejected with `DuplicateName` when a target with the same name already
    /// exists; the list is unchanged and nothing is saved.
    pub async fn add_target(
        &mut self,
        name: &str,
        type_name: &str,
        configuration: &str,
    ) -> Result<PublishTarget, ProfileError> {
        if self.settings.find_target(name).is_some() {
            return Err(ProfileError::DuplicateName {
                name: name.to_string(),
            });
        }

        let target = PublishTarget::new(name, type_name, configuration);
        let mut next = self.settings.clone();
        next.publish_targets.push(target.clone());

        self.persist(next).await?;
        Ok(target)
    }

    /// Replace the target at `index` with a new record and persist
    ///
    /// The edited slot may keep its own name; colliding with any other
    /// target's name is a `DuplicateName` error.
    pub async fn update_target(
        &mut self,
        index: usize,
        name: &str,
        type_name: &str,
        configuration: &str,
    ) -> Result<PublishTarget, ProfileError> {
        let len = self.settings.publish_targets.len();
        if index >= len {
            return Err(ProfileError::IndexOutOfRange { index, len });
        }

        let collision = self
            .settings
            .publish_targets
            .iter()
            .enumerate()
            .any(|(i, t)| i != index && t.name == name);
        if collision {
            return Err(ProfileError::DuplicateName {
                name: name.to_string(),
            });
        }

        let target = PublishTarget::new(name, type_name, configuration);
        let mut next = self.settings.clone();
        next.publish_targets[index] = target.clone();

        self.persist(next).await?;
        Ok(target)
    }

    /// Delete the target at `index` after user confirmation
    ///
    /// Returns `Ok(false)` without touching anything when the confirmation is
    /// declined (or the prompt fails); `Ok(true)` once the shortened list has
    /// been persisted.
    pub async fn delete_target(
        &mut self,
        index: usize,
        prompt: &dyn ConfirmPrompt,
    ) -> Result<bool, ProfileError> {
        let len = self.settings.publish_targets.len();
        if index >= len {
            return Err(ProfileError::IndexOutOfRange { index, len });
        }

        let confirmed = prompt
            .confirm(DELETE_CONFIRM_MESSAGE)
            .await
            .unwrap_or(false);
        if !confirmed {
            return Ok(false);
        }

        let mut next = self.settings.clone();
        next.publish_targets.remove(index);

        self.persist(next).await?;
        Ok(true)
    }

    /// Stamp a target's `lastPublished` timestamp and persist
    ///
    /// Called after a successful publish. Unknown names are a no-op.
    pub async fn stamp_last_published(
        &mut self,
        name: &str,
        time: DateTime<Utc>,
    ) -> Result<(), ProfileError> {
        if self.settings.find_target(name).is_none() {
            return Ok(());
        }

        let mut next = self.settings.clone();
        for target in &mut next.publish_targets {
            if target.name == name {
                target.last_published = Some(time);
            }
        }

        self.persist(next).await
    }

    /// Save the next settings document, committing it in memory on success
    async fn persist(&mut self, next: ProjectSettings) -> Result<(), ProfileError> {
        self.service
            .save_settings(&self.project_id, &self.bot_name, &next)
            .await
            .map_err(|e| ProfileError::remote("settings", e))?;

        self.settings = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::traits::AutoConfirm;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Settings service fake recording every save
    #[derive(Default)]
    struct FakeSettings {
        stored: Mutex<ProjectSettings>,
        saves: Mutex<Vec<ProjectSettings>>,
        fail_saves: AtomicBool,
    }

    impl FakeSettings {
        fn with_targets(targets: Vec<PublishTarget>) -> Self {
            Self {
                stored: Mutex::new(ProjectSettings {
                    publish_targets: targets,
                    extra: Default::default(),
                }),
                ..Default::default()
            }
        }

        fn save_count(&self) -> usize {
            self.saves.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SettingsService for FakeSettings {
        async fn load_settings(
            &self,
            _project_id: &str,
            _bot_name: &str,
        ) -> anyhow::Result<ProjectSettings> {
            Ok(self.stored.lock().unwrap().clone())
        }

        async fn save_settings(
            &self,
            _project_id: &str,
            _bot_name: &str,
            settings: &ProjectSettings,
        ) -> anyhow::Result<()> {
            if self.fail_saves.load(Ordering::SeqCst) {
                anyhow::bail!("ECONNREFUSED");
            }
            self.saves.lock().unwrap().push(settings.clone());
            *self.stored.lock().unwrap() = settings.clone();
            Ok(())
        }
    }

    async fn store_with(targets: Vec<PublishTarget>) -> (Arc<FakeSettings>, TargetStore) {
        let service = Arc::new(FakeSettings::with_targets(targets));
        let mut store = TargetStore::new("123", "echo-bot", service.clone());
        store.load().await.unwrap();
        (service, store)
    }

    #[tokio::test]
    async fn test_load_pulls_settings() {
        let (_service, store) =
            store_with(vec![PublishTarget::new("dev", "azurePublish", "{}")]).await;

        assert_eq!(store.len(), 1);
        assert!(store.find("dev").is_some());
    }

    #[tokio::test]
    async fn test_add_target_appends_and_persists() {
        let (service, mut store) = store_with(vec![]).await;

        let target = store.add_target("dev", "azurePublish", "{}").await.unwrap();

        assert_eq!(target.name, "dev");
        assert_eq!(store.len(), 1);
        assert_eq!(service.save_count(), 1);
        assert_eq!(
            service.saves.lock().unwrap()[0].publish_targets[0].name,
            "dev"
        );
    }

    #[tokio::test]
    async fn test_add_duplicate_name_is_rejected_without_save() {
        let (service, mut store) =
            store_with(vec![PublishTarget::new("dev", "azurePublish", "{}")]).await;

        let result = store.add_target("dev", "localPublish", "{}").await;

        assert!(matches!(result, Err(ProfileError::DuplicateName { .. })));
        assert_eq!(store.len(), 1);
        assert_eq!(service.save_count(), 0);
    }

    #[tokio::test]
    async fn test_add_failure_leaves_store_unchanged() {
        let (service, mut store) = store_with(vec![]).await;
        service.fail_saves.store(true, Ordering::SeqCst);

        let result = store.add_target("dev", "azurePublish", "{}").await;

        assert!(matches!(result, Err(ProfileError::RemoteCall { .. })));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_update_target_replaces_record() {
        let (service, mut store) = store_with(vec![
            PublishTarget::new("dev", "azurePublish", "{}"),
            PublishTarget::new("prod", "azurePublish", "{}"),
        ])
        .await;

        let updated = store
            .update_target(1, "production", "azurePublish", "{\"region\": \"westus\"}")
            .await
            .unwrap();

        assert_eq!(updated.name, "production");
        assert_eq!(store.targets()[1].name, "production");
        assert_eq!(service.save_count(), 1);
    }

    #[tokio::test]
    async fn test_update_with_stale_index_fails() {
        let (_service, mut store) =
            store_with(vec![PublishTarget::new("dev", "azurePublish", "{}")]).await;

        let result = store.update_target(3, "dev", "azurePublish", "{}").await;

        assert!(matches!(
            result,
            Err(ProfileError::IndexOutOfRange { index: 3, len: 1 })
        ));
    }

    #[tokio::test]
    async fn test_update_may_keep_own_name() {
        let (_service, mut store) =
            store_with(vec![PublishTarget::new("dev", "azurePublish", "{}")]).await;

        let result = store.update_target(0, "dev", "localPublish", "{}").await;

        assert!(result.is_ok());
        assert_eq!(store.targets()[0].type_name, "localPublish");
    }

    #[tokio::test]
    async fn test_update_colliding_with_other_target_fails() {
        let (_service, mut store) = store_with(vec![
            PublishTarget::new("dev", "azurePublish", "{}"),
            PublishTarget::new("prod", "azurePublish", "{}"),
        ])
        .await;

        let result = store.update_target(1, "dev", "azurePublish", "{}").await;

        assert!(matches!(result, Err(ProfileError::DuplicateName { .. })));
    }

    #[tokio::test]
    async fn test_delete_declined_is_a_no_op() {
        let (service, mut store) =
            store_with(vec![PublishTarget::new("dev", "azurePublish", "{}")]).await;

        let deleted = store.delete_target(0, &AutoConfirm(false)).await.unwrap();

        assert!(!deleted);
        assert_eq!(store.len(), 1);
        assert_eq!(service.save_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_confirmed_removes_and_persists() {
        let (service, mut store) = store_with(vec![
            PublishTarget::new("dev", "azurePublish", "{}"),
            PublishTarget::new("prod", "azurePublish", "{}"),
        ])
        .await;

        let deleted = store.delete_target(0, &AutoConfirm(true)).await.unwrap();

        assert!(deleted);
        assert_eq!(store.len(), 1);
        assert_eq!(store.targets()[0].name, "prod");
        assert_eq!(service.save_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_with_stale_index_fails_before_prompting() {
        let (_service, mut store) =
            store_with(vec![PublishTarget::new("dev", "azurePublish", "{}")]).await;

        let result = store.delete_target(9, &AutoConfirm(true)).await;

        assert!(matches!(result, Err(ProfileError::IndexOutOfRange { .. })));
    }

    #[tokio::test]
    async fn test_stamp_last_published_sets_and_persists() {
        let (service, mut store) =
            store_with(vec![PublishTarget::new("dev", "azurePublish", "{}")]).await;

        let now = Utc::now();
        store.stamp_last_published("dev", now).await.unwrap();

        assert_eq!(store.find("dev").unwrap().last_published, Some(now));
        assert_eq!(service.save_count(), 1);
    }

    #[tokio::test]
    async fn test_stamp_unknown_target_is_a_no_op() {
        let (service, mut store) = store_with(vec![]).await;

        store.stamp_last_published("ghost", Utc::now()).await.unwrap();

        assert_eq!(service.save_count(), 0);
    }

    #[tokio::test]
    async fn test_mutations_preserve_unmodeled_settings_keys() {
        let service = Arc::new(FakeSettings::default());
        service
            .stored
            .lock()
            .unwrap()
            .extra
            .insert("luis".to_string(), serde_json::json!({"region": "westus"}));

        let mut store = TargetStore::new("123", "echo-bot", service.clone());
        store.load().await.unwrap();
        store.add_target("dev", "azurePublish", "{}").await.unwrap();

        let saved = &service.saves.lock().unwrap()[0];
        assert!(saved.extra.contains_key("luis"));
    }
}
