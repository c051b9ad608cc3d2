//! Configuration structures and types for profile-publisher
//!
//! This module provides type-safe configuration management with serde support.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublisherConfig {
    /// Schema version (required)
    pub version: String,

    /// Project identity (optional, CLI arguments can supply it)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectConfig>,

    /// Remote service settings (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceConfig>,

    /// Status poller settings (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poller: Option<PollerConfig>,

    /// Local secret store settings (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secrets: Option<SecretsConfig>,
}

/// Project identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectConfig {
    /// Project id used in every remote call
    #[serde(rename = "projectId")]
    pub project_id: String,

    /// Bot name, keys the local secret store and the settings document
    #[serde(rename = "botName")]
    pub bot_name: String,
}

/// Remote service settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    /// Base URL of the publish/settings services
    ///
    /// Environment variables are expanded with the `${VAR}` syntax.
    pub endpoint: String,
}

/// Status poller settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollerConfig {
    /// Fixed delay between status refreshes, in seconds (default: 10)
    #[serde(skip_serializing_if = "Option::is_none", rename = "intervalSecs")]
    pub interval_secs: Option<u64>,
}

impl PollerConfig {
    /// Fixed refresh delay as a Duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.unwrap_or(DEFAULT_POLL_INTERVAL_SECS))
    }
}

/// Fixed delay between status refreshes while a publish is pending
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Local secret store settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecretsConfig {
    /// Directory holding per-bot sensitive settings files
    ///
    /// Environment variables are expanded with the `${VAR}` syntax.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            project: None,
            service: None,
            poller: Some(PollerConfig {
                interval_secs: Some(DEFAULT_POLL_INTERVAL_SECS),
            }),
            secrets: None,
        }
    }
}

impl PublisherConfig {
    /// Poller settings with defaults applied
    pub fn poller(&self) -> PollerConfig {
        self.poller.clone().unwrap_or(PollerConfig {
            interval_secs: Some(DEFAULT_POLL_INTERVAL_SECS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PublisherConfig::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.poller().interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_serialize_config() {
        let config = PublisherConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("version: '1.0'"));
    }

    #[test]
    fn test_deserialize_minimal_config() {
        let yaml = r#"
version: "1.0"
project:
  projectId: "12345.678"
  botName: "my-bot"
service:
  endpoint: "http://localhost:5000/api"
"#;
        let config: PublisherConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.project.as_ref().unwrap().bot_name, "my-bot");
        assert_eq!(config.poller().interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_poller_interval_override() {
        let yaml = r#"
version: "1.0"
poller:
  intervalSecs: 3
"#;
        let config: PublisherConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.poller().interval(), Duration::from_secs(3));
    }
}
