//! Publish orchestrator - selection, history, polling, and actions
//!
//! Manages the complete publish profile workflow including:
//! - Target selection with the reserved "all" sentinel
//! - History loading and grouped aggregation
//! - Pending-status polling with cancellation on re-selection
//! - Publish and rollback dispatch with per-target in-flight guards
//!
//! The orchestrator is single-threaded and event-driven: every state change
//! happens inside one of its `&mut self` methods, reacting to user input,
//! remote-call completion, or a poll update.

use crate::core::error::ProfileError;
use crate::core::types::{
    HistoryView, PublishHistoryRecord, PublishRequest, PublishTarget, PublishType, Selection,
};
use crate::orchestration::history::{self, HistoryCache};
use crate::orchestration::status_poller::{PollUpdate, PollerOptions, StatusPoller};
use crate::orchestration::target_store::TargetStore;
use crate::security::SecretStore;
use crate::services::traits::{ConfirmPrompt, PublishService, SettingsService};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Orchestrator for one project's publish profiles
pub struct PublishOrchestrator {
    project_id: String,
    bot_name: String,
    store: TargetStore,
    publish_service: Arc<dyn PublishService>,
    secrets: SecretStore,
    poller: StatusPoller,
    updates: UnboundedReceiver<PollUpdate>,
    cache: HistoryCache,
    publish_types: Vec<PublishType>,
    selection: Option<Selection>,
    selected_version: Option<PublishHistoryRecord>,
    in_flight: HashSet<String>,
}

impl PublishOrchestrator {
    /// Create an orchestrator bound to a project's services
    pub fn new(
        project_id: impl Into<String>,
        bot_name: impl Into<String>,
        publish_service: Arc<dyn PublishService>,
        settings_service: Arc<dyn SettingsService>,
        secrets: SecretStore,
        poller_options: PollerOptions,
    ) -> Self {
        let project_id = project_id.into();
        let bot_name = bot_name.into();
        let (poller, updates) = StatusPoller::new(
            project_id.clone(),
            Arc::clone(&publish_service),
            poller_options,
        );

        Self {
            store: TargetStore::new(project_id.clone(), bot_name.clone(), settings_service),
            project_id,
            bot_name,
            publish_service,
            secrets,
            poller,
            updates,
            cache: HistoryCache::new(),
            publish_types: Vec::new(),
            selection: None,
            selected_version: None,
            in_flight: HashSet::new(),
        }
    }

    /// Load the settings document and the publish type registry
    pub async fn initialize(&mut self) -> Result<(), ProfileError> {
        self.store.load().await?;

        self.publish_types = self
            .publish_service
            .load_publish_target_types(&self.project_id)
            .await
            .map_err(|e| ProfileError::remote("publish", e))?;

        self.selected_version = None;
        Ok(())
    }

    /// Registered publish types
    pub fn publish_types(&self) -> &[PublishType] {
        &self.publish_types
    }

    /// Configured targets, in settings-document order
    pub fn targets(&self) -> &[PublishTarget] {
        self.store.targets()
    }

    /// Target names, for list rendering
    pub fn target_names(&self) -> Vec<String> {
        self.store.targets().iter().map(|t| t.name.clone()).collect()
    }

    /// Current selection, if any
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// The resolved selected target
    ///
    /// Always `None` while the "all" sentinel is selected, upholding the
    /// selection invariant.
    pub fn selected_target(&self) -> Option<&PublishTarget> {
        self.selection
            .as_ref()
            .and_then(|s| s.target_name())
            .and_then(|name| self.store.find(name))
    }

    /// The version picked from the history list, if any
    pub fn selected_version(&self) -> Option<&PublishHistoryRecord> {
        self.selected_version.as_ref()
    }

    /// Log text of the selected version
    pub fn version_log(&self) -> Option<&str> {
        self.selected_version.as_ref().map(|v| v.log.as_str())
    }

    /// Whether a publish or rollback is outstanding for a target
    pub fn busy(&self, target_name: &str) -> bool {
        self.in_flight.contains(target_name)
    }

    /// Whether the selected target is being watched for a pending publish
    pub fn polling(&self) -> bool {
        self.selected_target()
            .map(|t| self.poller.is_watching(&t.name))
            .unwrap_or(false)
    }

    /// Navigate to a target by name (`"all"` selects the aggregated view)
    ///
    /// Loads (or refreshes) the relevant history caches, clears the version
    /// selection, and reconciles the status poller. For the aggregated view a
    /// failed per-target history fetch is logged and that target simply
    /// contributes nothing; for a single target the failure is surfaced.
    pub async fn select_target(&mut self, name: &str) -> Result<(), ProfileError> {
        let selection = Selection::parse(name);
        self.selection = Some(selection.clone());
        self.selected_version = None;

        match &selection {
            Selection::All => {
                let targets: Vec<PublishTarget> = self.store.targets().to_vec();
                for target in &targets {
                    match self
                        .publish_service
                        .load_publish_history(&self.project_id, target)
                        .await
                    {
                        Ok(records) => self.cache.insert(target.name.clone(), records),
                        Err(error) => {
                            tracing::warn!(profile = %target.name, %error, "history load failed");
                        }
                    }
                }
            }
            Selection::Target(target_name) => {
                if let Some(target) = self.store.find(target_name).cloned() {
                    let records = self
                        .publish_service
                        .load_publish_history(&self.project_id, &target)
                        .await
                        .map_err(|e| ProfileError::remote("history", e))?;
                    self.cache.insert(target.name.clone(), records);
                }
            }
        }

        self.sync_poller();
        Ok(())
    }

    /// The flattened, grouped history view for the current selection
    pub fn history_view(&self) -> HistoryView {
        match &self.selection {
            Some(selection) => history::aggregate(selection, self.store.targets(), &self.cache),
            None => HistoryView::default(),
        }
    }

    /// Pick a version from the current view by id
    pub fn select_version(&mut self, id: &str) -> Option<&PublishHistoryRecord> {
        let view = self.history_view();
        self.selected_version = view.items.into_iter().find(|r| r.id == id);
        self.selected_version.as_ref()
    }

    /// Create a new profile and navigate to it
    pub async fn add_target(
        &mut self,
        name: &str,
        type_name: &str,
        configuration: &str,
    ) -> Result<(), ProfileError> {
        let target = self.store.add_target(name, type_name, configuration).await?;
        self.select_target(&target.name).await
    }

    /// Replace the profile at `index` and navigate to its (new) name
    pub async fn update_target(
        &mut self,
        index: usize,
        name: &str,
        type_name: &str,
        configuration: &str,
    ) -> Result<(), ProfileError> {
        let target = self
            .store
            .update_target(index, name, type_name, configuration)
            .await?;
        self.select_target(&target.name).await
    }

    /// Delete the profile at `index` after confirmation
    ///
    /// Declined confirmation is a no-op. On deletion the target's cached
    /// history is dropped and the selection resets to the aggregated view.
    pub async fn delete_target(
        &mut self,
        index: usize,
        prompt: &dyn ConfirmPrompt,
    ) -> Result<bool, ProfileError> {
        let name = self
            .store
            .targets()
            .get(index)
            .map(|t| t.name.clone())
            .ok_or(ProfileError::IndexOutOfRange {
                index,
                len: self.store.len(),
            })?;

        let deleted = self.store.delete_target(index, prompt).await?;
        if !deleted {
            return Ok(false);
        }

        self.cache.remove(&name);
        self.poller.cancel(&name);
        self.select_target(crate::core::types::ALL_TARGETS).await?;
        Ok(true)
    }

    /// Whether the rollback affordance is enabled for a version
    ///
    /// True iff a target is selected, the version completed with status 200,
    /// carries an id, and the target's registered type declares the rollback
    /// feature.
    pub fn rollback_supported(&self, version: &PublishHistoryRecord) -> bool {
        if version.id.is_empty() || !version.is_success() {
            return false;
        }
        let Some(target) = self.selected_target() else {
            return false;
        };
        self.publish_types
            .iter()
            .find(|t| t.name == target.type_name)
            .map(|t| t.features.rollback)
            .unwrap_or(false)
    }

    /// Publish the selected target
    ///
    /// Sends the comment plus the bot's locally stored sensitive settings to
    /// the publish endpoint. On success the target's `lastPublished` is
    /// stamped and persisted and the returned (usually pending) record enters
    /// the history cache, which starts the status poller.
    pub async fn publish(
        &mut self,
        comment: Option<String>,
    ) -> Result<PublishHistoryRecord, ProfileError> {
        let target = self
            .selected_target()
            .cloned()
            .ok_or(ProfileError::NoTargetSelected)?;

        self.begin_operation(&target.name)?;
        let result = self.dispatch_publish(&target, comment).await;
        self.in_flight.remove(&target.name);
        result
    }

    async fn dispatch_publish(
        &mut self,
        target: &PublishTarget,
        comment: Option<String>,
    ) -> Result<PublishHistoryRecord, ProfileError> {
        let secrets = self.secrets.read(&self.bot_name);
        let request = PublishRequest { comment };

        let record = self
            .publish_service
            .publish_to_target(&self.project_id, target, &request, &secrets)
            .await
            .map_err(|e| {
                ProfileError::remote(
                    "publish",
                    self.secrets.mask_secrets_in_string(&e.to_string(), &secrets),
                )
            })?;

        self.store
            .stamp_last_published(&target.name, Utc::now())
            .await?;

        self.cache.apply_status(&target.name, record.clone());
        self.sync_poller();

        tracing::info!(profile = %target.name, version = %record.id, "publish accepted");
        Ok(record)
    }

    /// Roll the selected target back to a prior successful version
    ///
    /// Only legal when the rollback affordance is enabled for that version.
    pub async fn rollback(&mut self, version_id: &str) -> Result<(), ProfileError> {
        let target = self
            .selected_target()
            .cloned()
            .ok_or(ProfileError::NoTargetSelected)?;

        let version = self
            .cache
            .get(&target.name)
            .and_then(|records| records.iter().find(|r| r.id == version_id))
            .cloned();

        let supported = version
            .as_ref()
            .map(|v| self.rollback_supported(v))
            .unwrap_or(false);
        if !supported {
            return Err(ProfileError::RollbackNotSupported {
                target: target.name.clone(),
            });
        }

        self.begin_operation(&target.name)?;
        let result = self.dispatch_rollback(&target, version_id).await;
        self.in_flight.remove(&target.name);
        result
    }

    async fn dispatch_rollback(
        &mut self,
        target: &PublishTarget,
        version_id: &str,
    ) -> Result<(), ProfileError> {
        let secrets = self.secrets.read(&self.bot_name);

        self.publish_service
            .rollback_to_version(&self.project_id, target, version_id, &secrets)
            .await
            .map_err(|e| {
                ProfileError::remote(
                    "rollback",
                    self.secrets.mask_secrets_in_string(&e.to_string(), &secrets),
                )
            })?;

        tracing::info!(profile = %target.name, version = %version_id, "rollback requested");
        Ok(())
    }

    /// Wait for the next poll update
    pub async fn recv_update(&mut self) -> Option<PollUpdate> {
        self.updates.recv().await
    }

    /// Apply a poll update, discarding it when stale
    ///
    /// An update is applied only if its generation still matches the live
    /// watch and its target is still the selected one; anything else arrived
    /// after a cancellation or re-selection and must not touch state.
    /// Returns whether the view changed.
    pub fn apply_update(&mut self, update: PollUpdate) -> bool {
        if !self.poller.is_current(&update) {
            tracing::debug!(profile = %update.target, "discarding stale poll update");
            return false;
        }

        let selected = self
            .selection
            .as_ref()
            .and_then(|s| s.target_name())
            .map(|n| n == update.target)
            .unwrap_or(false);
        if !selected {
            tracing::debug!(profile = %update.target, "discarding poll update for unselected target");
            return false;
        }

        match update.outcome {
            Ok(record) => {
                self.cache.apply_status(&update.target, record);
                self.sync_poller();
                true
            }
            Err(_) => false,
        }
    }

    fn begin_operation(&mut self, target_name: &str) -> Result<(), ProfileError> {
        if !self.in_flight.insert(target_name.to_string()) {
            return Err(ProfileError::OperationInFlight {
                target: target_name.to_string(),
            });
        }
        Ok(())
    }

    fn sync_poller(&mut self) {
        let target = self.selected_target().cloned();
        let history = target
            .as_ref()
            .and_then(|t| self.cache.get(&t.name))
            .unwrap_or(&[]);
        self.poller.sync(target.as_ref(), history);
    }
}
