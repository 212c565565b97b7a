//! Storage abstraction for version history.
//!
//! A store owns the ordered, append-only version records of every user.
//! Numbering happens inside the store because assigning the next number and
//! appending the record must be one critical section per user.

use async_trait::async_trait;
use verso_core::error::CoreError;
use verso_core::types::VersionId;

use crate::models::version::{Version, VersionDraft};

#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Assign the next number in the draft's topic group, stamp a creation
    /// time later than any of the user's existing versions, and append.
    ///
    /// Appends for the same user are serialized; a failed append leaves the
    /// user's history unchanged.
    async fn append(&self, draft: VersionDraft) -> Result<Version, CoreError>;

    /// Point lookup, independent of owner.
    async fn find_by_id(&self, id: VersionId) -> Result<Option<Version>, CoreError>;

    /// Up to `limit` versions of `user_id`, newest first.
    async fn list_recent(&self, user_id: &str, limit: i64) -> Result<Vec<Version>, CoreError>;

    /// The user's most recent version, optionally within one topic group.
    async fn find_latest(
        &self,
        user_id: &str,
        topic: Option<&str>,
    ) -> Result<Option<Version>, CoreError>;

    /// Number of versions the user has.
    async fn count_for_user(&self, user_id: &str) -> Result<i64, CoreError>;

    /// Cheap reachability check.
    async fn health_check(&self) -> Result<(), CoreError>;
}
