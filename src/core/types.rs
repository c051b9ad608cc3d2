//! Core types for publish profile management
//!
//! This module defines the fundamental data model shared by the target store,
//! history aggregation, status polling, and publish/rollback dispatch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Status code of a publish attempt still in flight
pub const STATUS_PENDING: u16 = 202;

/// Status code of a successful publish attempt
pub const STATUS_SUCCESS: u16 = 200;

/// Reserved selection sentinel for the aggregated "all profiles" view
pub const ALL_TARGETS: &str = "all";

// ============================================================================
// Publish Targets
// ============================================================================

/// A named publish destination with a type and opaque configuration
///
/// Targets live inside the project settings document and are unique by name
/// within a project. The `configuration` string is interpreted only by the
/// remote publish endpoint for the registered type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishTarget {
    /// Profile name (unique within a project)
    pub name: String,

    /// Name of a registered publish type
    #[serde(rename = "type")]
    pub type_name: String,

    /// Type-specific configuration (opaque JSON string)
    pub configuration: String,

    /// Timestamp of the most recent publish attempt, if any
    #[serde(skip_serializing_if = "Option::is_none", rename = "lastPublished")]
    pub last_published: Option<DateTime<Utc>>,
}

impl PublishTarget {
    /// Create a target with no publish history
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, configuration: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            configuration: configuration.into(),
            last_published: None,
        }
    }
}

// ============================================================================
// Publish Types
// ============================================================================

/// Capability flags declared by a publish type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishFeatures {
    /// Supports rolling back to a prior successful version
    #[serde(default)]
    pub rollback: bool,

    /// Supports pulling the deployed state back into the project
    #[serde(default)]
    pub pull: bool,

    /// Exposes per-target publish history
    #[serde(default)]
    pub history: bool,
}

/// A registered publish type, supplied read-only by the remote registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishType {
    /// Type name, referenced by `PublishTarget::type_name`
    pub name: String,

    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Capability flags
    #[serde(default)]
    pub features: PublishFeatures,
}

// ============================================================================
// Publish History
// ============================================================================

/// One publish attempt's outcome for a target
///
/// Records are append-only per target and arrive newest-first from the
/// history service. `status` uses HTTP-style codes: 202 means the attempt is
/// still in flight, 200 means success, anything else is a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishHistoryRecord {
    /// Version id assigned by the publish endpoint
    pub id: String,

    /// HTTP-style status code
    pub status: u16,

    /// Short status message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Full log output of the attempt
    #[serde(default)]
    pub log: String,

    /// Comment entered when the publish was triggered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// When the attempt was recorded
    pub time: DateTime<Utc>,
}

impl PublishHistoryRecord {
    /// Whether this attempt is still awaiting a result
    pub fn is_pending(&self) -> bool {
        self.status == STATUS_PENDING
    }

    /// Whether this attempt completed successfully
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// Section metadata partitioning a flattened history sequence by target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryGroup {
    /// Group key (the originating target name)
    pub key: String,

    /// Display name (same as the target name)
    pub name: String,

    /// Index of the group's first record in the flattened sequence
    #[serde(rename = "startIndex")]
    pub start_index: usize,

    /// Number of records contributed by this target
    pub count: usize,

    /// Nesting level (always 0, groups are flat)
    pub level: u8,
}

/// Flattened, grouped history ready for section rendering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryView {
    /// Records in target order, newest-first within each target
    pub items: Vec<PublishHistoryRecord>,

    /// Parallel group metadata, one entry per contributing target
    pub groups: Vec<HistoryGroup>,
}

impl HistoryView {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Which target's history is being viewed
///
/// Exactly one target is selected at a time, or the reserved `"all"`
/// sentinel. The resolved target must be `None` whenever `All` is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Aggregated view over every configured target
    All,

    /// A single named target
    Target(String),
}

impl Selection {
    /// Parse a route parameter, honoring the `"all"` sentinel
    pub fn parse(name: &str) -> Self {
        if name == ALL_TARGETS {
            Selection::All
        } else {
            Selection::Target(name.to_string())
        }
    }

    /// Route-parameter representation
    pub fn as_str(&self) -> &str {
        match self {
            Selection::All => ALL_TARGETS,
            Selection::Target(name) => name,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    /// The selected target name, unless the sentinel is selected
    pub fn target_name(&self) -> Option<&str> {
        match self {
            Selection::All => None,
            Selection::Target(name) => Some(name),
        }
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Project Settings
// ============================================================================

/// The project settings document owning the publish target list
///
/// Settings keys other than `publishTargets` are carried opaquely so a
/// round-trip through the store never drops fields this crate does not model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Configured publish targets
    #[serde(default, rename = "publishTargets")]
    pub publish_targets: Vec<PublishTarget>,

    /// Unmodeled settings keys, preserved verbatim
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ProjectSettings {
    /// Position of a target by name
    pub fn find_target(&self, name: &str) -> Option<usize> {
        self.publish_targets.iter().position(|t| t.name == name)
    }
}

// ============================================================================
// Publish Requests
// ============================================================================

/// User-supplied parameters for a publish call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishRequest {
    /// Free-form comment attached to the new version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
