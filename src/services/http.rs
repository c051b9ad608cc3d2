//! HTTP adapters for the publish and settings service contracts
//!
//! Thin reqwest-backed implementations speaking the authoring server's REST
//! surface. Every mutating call carries a correlation id so the server logs
//! can be matched against a client interaction.

use crate::core::types::{
    ProjectSettings, PublishHistoryRecord, PublishRequest, PublishTarget, PublishType,
};
use crate::security::SecretBundle;
use crate::services::traits::{PublishService, SettingsService};
use async_trait::async_trait;
use serde_json::json;

/// HTTP adapter for [`PublishService`]
pub struct HttpPublishService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPublishService {
    /// Create an adapter against a base URL (no trailing slash required)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            client: reqwest::Client::new(),
        }
    }

    fn publish_url(&self, project_id: &str, target_name: &str) -> String {
        format!(
            "{}/projects/{}/publish/{}",
            self.base_url, project_id, target_name
        )
    }
}

#[async_trait]
impl PublishService for HttpPublishService {
    async fn load_publish_target_types(
        &self,
        project_id: &str,
    ) -> anyhow::Result<Vec<PublishType>> {
        let url = format!("{}/projects/{}/publish/types", self.base_url, project_id);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            anyhow::bail!(
                "公開タイプの取得に失敗しました（HTTP {}）",
                response.status()
            );
        }

        Ok(response.json::<Vec<PublishType>>().await?)
    }

    async fn load_publish_history(
        &self,
        project_id: &str,
        target: &PublishTarget,
    ) -> anyhow::Result<Vec<PublishHistoryRecord>> {
        let url = format!("{}/history", self.publish_url(project_id, &target.name));
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            anyhow::bail!(
                "[{}] 公開履歴の取得に失敗しました（HTTP {}）",
                target.name,
                response.status()
            );
        }

        Ok(response.json::<Vec<PublishHistoryRecord>>().await?)
    }

    async fn fetch_publish_status(
        &self,
        project_id: &str,
        target: &PublishTarget,
    ) -> anyhow::Result<PublishHistoryRecord> {
        let url = format!("{}/status", self.publish_url(project_id, &target.name));
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            anyhow::bail!(
                "[{}] 公開ステータスの取得に失敗しました（HTTP {}）",
                target.name,
                response.status()
            );
        }

        Ok(response.json::<PublishHistoryRecord>().await?)
    }

    async fn publish_to_target(
        &self,
        project_id: &str,
        target: &PublishTarget,
        request: &PublishRequest,
        secrets: &SecretBundle,
    ) -> anyhow::Result<PublishHistoryRecord> {
        let url = self.publish_url(project_id, &target.name);
        let body = json!({
            "type": target.type_name,
            "configuration": target.configuration,
            "comment": request.comment,
            "sensitiveSettings": secrets.expose_json(),
            "correlationId": uuid::Uuid::new_v4().to_string(),
        });

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            anyhow::bail!(
                "[{}] 公開リクエストに失敗しました（HTTP {}）",
                target.name,
                response.status()
            );
        }

        Ok(response.json::<PublishHistoryRecord>().await?)
    }

    async fn rollback_to_version(
        &self,
        project_id: &str,
        target: &PublishTarget,
        version_id: &str,
        secrets: &SecretBundle,
    ) -> anyhow::Result<()> {
        let url = format!(
            "{}/rollback/{}",
            self.publish_url(project_id, &target.name),
            version_id
        );
        let body = json!({
            "sensitiveSettings": secrets.expose_json(),
            "correlationId": uuid::Uuid::new_v4().to_string(),
        });

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            anyhow::bail!(
                "[{}] バージョン {} へのロールバックに失敗しました（HTTP {}）",
                target.name,
                version_id,
                response.status()
            );
        }

        Ok(())
    }
}

/// HTTP adapter for [`SettingsService`]
pub struct HttpSettingsService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSettingsService {
    /// Create an adapter against a base URL (no trailing slash required)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            client: reqwest::Client::new(),
        }
    }

    fn settings_url(&self, project_id: &str, bot_name: &str) -> String {
        format!(
            "{}/projects/{}/bots/{}/settings",
            self.base_url, project_id, bot_name
        )
    }
}

#[async_trait]
impl SettingsService for HttpSettingsService {
    async fn load_settings(
        &self,
        project_id: &str,
        bot_name: &str,
    ) -> anyhow::Result<ProjectSettings> {
        let url = self.settings_url(project_id, bot_name);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("設定の取得に失敗しました（HTTP {}）", response.status());
        }

        Ok(response.json::<ProjectSettings>().await?)
    }

    async fn save_settings(
        &self,
        project_id: &str,
        bot_name: &str,
        settings: &ProjectSettings,
    ) -> anyhow::Result<()> {
        let url = self.settings_url(project_id, bot_name);
        let response = self.client.post(&url).json(settings).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("設定の保存に失敗しました（HTTP {}）", response.status());
        }

        Ok(())
    }
}

fn normalize_base_url(mut base_url: String) -> String {
    while base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}
