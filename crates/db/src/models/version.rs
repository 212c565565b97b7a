//! Version models and DTOs.
//!
//! Defines the stored version record, the draft handed to a store for
//! numbering and appending, and the create input used by callers.

use serde::{Deserialize, Serialize};
use verso_core::numbering::VersionNumber;
use verso_core::types::{Timestamp, UserId, VersionId};
use verso_core::version::{formatted_title, VersionType};

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// One immutable entry in a user's version history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub id: VersionId,
    pub user_id: UserId,
    pub content: String,
    #[serde(rename = "type")]
    pub version_type: VersionType,
    pub topic: String,
    pub version_number: VersionNumber,
    pub created_at: Timestamp,
    pub description: Option<String>,
    pub framework_id: Option<String>,
    pub framework_name: Option<String>,
    pub original_input: Option<String>,
}

impl Version {
    /// Display title, always computed from topic, number and type.
    pub fn formatted_title(&self) -> String {
        formatted_title(&self.topic, self.version_number, self.version_type)
    }
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// A version whose topic is settled but whose id, number and timestamp are
/// still to be assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDraft {
    pub user_id: UserId,
    pub content: String,
    pub version_type: VersionType,
    pub topic: String,
    pub description: Option<String>,
    pub framework_id: Option<String>,
    pub framework_name: Option<String>,
    pub original_input: Option<String>,
}

impl VersionDraft {
    pub fn into_version(
        self,
        id: VersionId,
        version_number: VersionNumber,
        created_at: Timestamp,
    ) -> Version {
        Version {
            id,
            user_id: self.user_id,
            content: self.content,
            version_type: self.version_type,
            topic: self.topic,
            version_number,
            created_at,
            description: self.description,
            framework_id: self.framework_id,
            framework_name: self.framework_name,
            original_input: self.original_input,
        }
    }
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// Input for saving a new version.
///
/// When `topic` is absent it is derived from `original_input`, or from
/// `content` when no separate input text was supplied.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateVersion {
    pub user_id: UserId,
    pub content: String,
    #[serde(rename = "type", default = "default_version_type")]
    pub version_type: VersionType,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub original_input: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub framework_id: Option<String>,
    #[serde(default)]
    pub framework_name: Option<String>,
}

fn default_version_type() -> VersionType {
    VersionType::Save
}

impl CreateVersion {
    pub fn new(
        user_id: impl Into<UserId>,
        content: impl Into<String>,
        version_type: VersionType,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            content: content.into(),
            version_type,
            topic: None,
            original_input: None,
            description: None,
            framework_id: None,
            framework_name: None,
        }
    }

    /// Text the topic labeller should read.
    pub fn topic_source(&self) -> &str {
        self.original_input
            .as_deref()
            .filter(|input| !input.trim().is_empty())
            .unwrap_or(&self.content)
    }
}
