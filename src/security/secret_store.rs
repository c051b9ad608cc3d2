//! Local secret store with memory-safe handling and masking capabilities
//!
//! Sensitive, type-specific settings (service passwords, subscription keys)
//! never travel through the settings service; they are kept locally per bot
//! and attached to publish/rollback calls at the transport boundary. The
//! `secrecy` crate prevents accidental exposure in logs or memory dumps.

use lazy_static::lazy_static;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

lazy_static! {
    /// Keys whose values are considered sensitive regardless of source
    static ref SENSITIVE_KEY_PATTERN: Regex =
        Regex::new(r"(?i)(password|secret|key|token)").unwrap();
}

/// Sensitive settings for one bot, keyed by setting path
#[derive(Default)]
pub struct SecretBundle {
    values: HashMap<String, SecretString>,
}

impl SecretBundle {
    /// Build a bundle from plain key/value pairs
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k, SecretString::new(v.into())))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Expose the bundle as a JSON object for a remote call body
    ///
    /// This is the single intentional exposure point; callers must only pass
    /// the result to the transport layer.
    pub fn expose_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .values
            .iter()
            .map(|(k, v)| {
                (
                    k.clone(),
                    serde_json::Value::String(v.expose_secret().to_string()),
                )
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

impl std::fmt::Debug for SecretBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretBundle")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Local secret store reading per-bot sensitive settings
///
/// Secrets live in `<dir>/<bot-name>.json` as a flat JSON object. Reads are
/// synchronous; the store is a local boundary, not a remote service.
///
/// # Examples
///
/// ```
/// use profile_publisher::security::SecretStore;
///
/// let store = SecretStore::new("/tmp/profile-publisher-secrets");
/// assert_eq!(store.mask_token("abcdef123456"), "abc...456");
/// assert_eq!(store.mask_token("short"), "****");
/// ```
pub struct SecretStore {
    dir: PathBuf,
}

impl SecretStore {
    /// Create a store rooted at the given directory
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Read the sensitive settings bundle for a bot
    ///
    /// A missing or unreadable file yields an empty bundle; publishing
    /// without local secrets is legal (the remote endpoint decides whether
    /// they were required).
    pub fn read(&self, bot_name: &str) -> SecretBundle {
        let path = self.dir.join(format!("{}.json", bot_name));

        let Ok(content) = std::fs::read_to_string(&path) else {
            return SecretBundle::default();
        };

        match serde_json::from_str::<HashMap<String, String>>(&content) {
            Ok(pairs) => SecretBundle::from_pairs(pairs),
            Err(error) => {
                tracing::warn!(bot = bot_name, %error, "sensitive settings file is not a flat JSON object");
                SecretBundle::default()
            }
        }
    }

    /// Check whether a settings key names sensitive material
    pub fn is_sensitive_key(&self, key: &str) -> bool {
        SENSITIVE_KEY_PATTERN.is_match(key)
    }

    /// Masks a secret for safe logging
    ///
    /// Shows only the first 3 and last 3 characters for identification.
    /// Values shorter than 10 characters are fully masked as "****".
    pub fn mask_token(&self, token: &str) -> String {
        if token.is_empty() || token.len() < 10 {
            return "****".to_string();
        }

        let prefix = &token[..3];
        let suffix = &token[token.len() - 3..];
        format!("{}...{}", prefix, suffix)
    }

    /// Masks every value of a bundle found inside a string
    ///
    /// Used to sanitize remote error messages before they are surfaced.
    pub fn mask_secrets_in_string(&self, text: &str, bundle: &SecretBundle) -> String {
        let mut masked = text.to_string();

        for secret in bundle.values.values() {
            let secret_str = secret.expose_secret();
            if secret_str.is_empty() {
                continue;
            }
            if masked.contains(secret_str) {
                masked = masked.replace(secret_str, &self.mask_token(secret_str));
            }
        }

        masked
    }
}
