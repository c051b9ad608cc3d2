//! Configuration file loader for profile-publisher
//!
//! This module provides configuration loading and merging capabilities.

use super::config::*;
use crate::core::error::ProfileError;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Configuration file name
const CONFIG_FILENAME: &str = ".profile-publisher.yaml";

lazy_static! {
    /// Environment variable pattern (${VAR_NAME})
    static ref ENV_VAR_PATTERN: Regex = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
}

/// Configuration load options
#[derive(Debug, Clone)]
pub struct ConfigLoadOptions {
    /// Project path to load config from
    pub project_path: PathBuf,

    /// Environment variables used for `${VAR}` expansion
    pub env: HashMap<String, String>,
}

impl ConfigLoadOptions {
    /// Options for a project path with the process environment
    pub fn for_path<P: Into<PathBuf>>(project_path: P) -> Self {
        Self {
            project_path: project_path.into(),
            env: env::vars().collect(),
        }
    }
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. Project config (./.profile-publisher.yaml)
    /// 2. Global config (~/.profile-publisher.yaml)
    /// 3. Default values
    pub async fn load(options: ConfigLoadOptions) -> Result<PublisherConfig, ProfileError> {
        let mut config = PublisherConfig::default();

        if let Some(global_config) = Self::load_global_config().await? {
            config = Self::merge(config, global_config);
        }

        if let Some(project_config) = Self::load_project_config(&options.project_path).await? {
            config = Self::merge(config, project_config);
        }

        Ok(Self::expand_env_vars(config, &options.env))
    }

    /// Load global configuration from ~/.profile-publisher.yaml
    async fn load_global_config() -> Result<Option<PublisherConfig>, ProfileError> {
        let Ok(home_dir) = env::var("HOME") else {
            return Ok(None);
        };
        let global_config_path = PathBuf::from(home_dir).join(CONFIG_FILENAME);

        Self::load_config_file(&global_config_path).await
    }

    /// Load project configuration from ./.profile-publisher.yaml
    async fn load_project_config(
        project_path: &Path,
    ) -> Result<Option<PublisherConfig>, ProfileError> {
        let project_config_path = project_path.join(CONFIG_FILENAME);

        Self::load_config_file(&project_config_path).await
    }

    /// Load configuration from a YAML file
    async fn load_config_file(file_path: &Path) -> Result<Option<PublisherConfig>, ProfileError> {
        if fs::metadata(file_path).await.is_err() {
            return Ok(None);
        }

        let content = fs::read_to_string(file_path)
            .await
            .map_err(|e| ProfileError::Settings {
                message: format!("{}: {}", file_path.display(), e),
            })?;

        let config: PublisherConfig =
            serde_yaml::from_str(&content).map_err(|e| ProfileError::Settings {
                message: format!("{}: {}", file_path.display(), e),
            })?;

        Ok(Some(config))
    }

    /// Merge two configurations (overlay takes priority per section)
    fn merge(base: PublisherConfig, overlay: PublisherConfig) -> PublisherConfig {
        PublisherConfig {
            version: overlay.version,
            project: overlay.project.or(base.project),
            service: overlay.service.or(base.service),
            poller: overlay.poller.or(base.poller),
            secrets: overlay.secrets.or(base.secrets),
        }
    }

    /// Expand `${VAR}` references in string-valued settings
    fn expand_env_vars(
        mut config: PublisherConfig,
        env: &HashMap<String, String>,
    ) -> PublisherConfig {
        if let Some(ref mut service) = config.service {
            service.endpoint = Self::expand(&service.endpoint, env);
        }
        if let Some(ref mut secrets) = config.secrets {
            if let Some(ref dir) = secrets.dir {
                secrets.dir = Some(Self::expand(dir, env));
            }
        }
        config
    }

    fn expand(value: &str, env: &HashMap<String, String>) -> String {
        ENV_VAR_PATTERN
            .replace_all(value, |caps: &regex::Captures| {
                env.get(&caps[1]).cloned().unwrap_or_default()
            })
            .to_string()
    }
}
