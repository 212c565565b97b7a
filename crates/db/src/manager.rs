//! Version history engine.
//!
//! [`VersionManager`] validates input, settles the topic label, and delegates
//! numbering and appending to a [`VersionStore`]. Rollback re-materializes an
//! old version's content as a brand-new version; nothing is ever edited in
//! place.

use std::sync::Arc;

use verso_core::error::CoreError;
use verso_core::topic::{derive_topic, normalize_topic, TopicLexicon};
use verso_core::types::VersionId;
use verso_core::version::{
    clamp_limit, validate_content, validate_description, validate_user_id, VersionType,
    DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT,
};

use crate::models::version::{CreateVersion, Version, VersionDraft};
use crate::store::VersionStore;

/// Version ids are opaque strings to callers; anything that does not parse
/// simply does not exist.
fn parse_version_id(raw: &str) -> Option<VersionId> {
    raw.trim().parse().ok()
}

/// Entry point for saving, listing and rolling back versions.
///
/// Cheap to share behind an `Arc`; the store and lexicon are injected by the
/// composing application.
pub struct VersionManager {
    store: Arc<dyn VersionStore>,
    lexicon: Arc<TopicLexicon>,
}

impl VersionManager {
    pub fn new(store: Arc<dyn VersionStore>, lexicon: TopicLexicon) -> Self {
        Self {
            store,
            lexicon: Arc::new(lexicon),
        }
    }

    pub fn lexicon(&self) -> &TopicLexicon {
        &self.lexicon
    }

    /// Topic label the manager would assign to `input`.
    pub fn derive_topic(&self, input: &str) -> String {
        derive_topic(input, &self.lexicon)
    }

    /// Save a new version, deriving its topic unless one is given.
    pub async fn save_version(&self, input: CreateVersion) -> Result<Version, CoreError> {
        validate_user_id(&input.user_id)?;
        validate_content(&input.content)?;
        if let Some(ref description) = input.description {
            validate_description(description)?;
        }

        let topic = match input.topic.as_deref() {
            Some(topic) => normalize_topic(topic)?,
            None => self.derive_topic(input.topic_source()),
        };

        let draft = VersionDraft {
            user_id: input.user_id,
            content: input.content,
            version_type: input.version_type,
            topic,
            description: input.description,
            framework_id: input.framework_id,
            framework_name: input.framework_name,
            original_input: input.original_input,
        };

        let version = self.store.append(draft).await?;

        tracing::info!(
            version_id = %version.id,
            user_id = %version.user_id,
            topic = %version.topic,
            version_number = %version.version_number,
            version_type = %version.version_type,
            "Version saved"
        );

        Ok(version)
    }

    /// The user's most recent versions, newest first, never more than
    /// `limit`. Unknown users get an empty list; negative limits are invalid.
    pub async fn get_versions(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Version>, CoreError> {
        if let Some(requested) = limit.filter(|l| *l < 0) {
            return Err(CoreError::Validation(format!(
                "Limit must not be negative (got {requested})"
            )));
        }
        let limit = clamp_limit(limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
        let versions = self.store.list_recent(user_id, limit).await?;

        tracing::debug!(count = versions.len(), user_id, limit, "Listed versions");

        Ok(versions)
    }

    /// Point lookup by id, regardless of owner.
    pub async fn get_version(&self, version_id: &str) -> Result<Option<Version>, CoreError> {
        match parse_version_id(version_id) {
            Some(id) => self.store.find_by_id(id).await,
            None => Ok(None),
        }
    }

    /// Most recent version of a user, optionally within one topic group.
    pub async fn latest_version(
        &self,
        user_id: &str,
        topic: Option<&str>,
    ) -> Result<Option<Version>, CoreError> {
        self.store.find_latest(user_id, topic).await
    }

    pub async fn count_versions(&self, user_id: &str) -> Result<i64, CoreError> {
        self.store.count_for_user(user_id).await
    }

    /// Restore an earlier version by appending a copy of its content.
    ///
    /// Unknown ids and versions owned by someone else both yield
    /// [`CoreError::NotFound`]. The copy is recorded as a save and its topic
    /// is derived afresh from the content, so it joins whichever group that
    /// content belongs to today.
    pub async fn rollback_version(
        &self,
        user_id: &str,
        version_id: &str,
    ) -> Result<Version, CoreError> {
        let target = match parse_version_id(version_id) {
            Some(id) => self.store.find_by_id(id).await?,
            None => None,
        }
        .filter(|v| v.user_id == user_id)
        .ok_or_else(|| CoreError::version_not_found(version_id))?;

        let draft = VersionDraft {
            user_id: target.user_id.clone(),
            content: target.content.clone(),
            version_type: VersionType::Save,
            topic: self.derive_topic(&target.content),
            description: Some(format!("Rolled back from v{}", target.version_number)),
            framework_id: target.framework_id.clone(),
            framework_name: target.framework_name.clone(),
            original_input: None,
        };

        let restored = self.store.append(draft).await?;

        tracing::info!(
            restored_version_id = %restored.id,
            from_version_id = %target.id,
            from_version = %target.version_number,
            new_version = %restored.version_number,
            topic = %restored.topic,
            user_id,
            "Version rolled back"
        );

        Ok(restored)
    }

    pub async fn health_check(&self) -> Result<(), CoreError> {
        self.store.health_check().await
    }
}
