//! In-process version store.
//!
//! Each user's history sits behind its own `RwLock`, so appends for one user
//! are serialized while other users proceed independently and readers see
//! whole records only. The user registry and id index are sharded
//! `DashMap`s; their entries are only touched synchronously, never across an
//! `.await`.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;
use verso_core::error::CoreError;
use verso_core::numbering::{next_created_at, TopicGroups};
use verso_core::types::{new_version_id, UserId, VersionId};

use crate::models::version::{Version, VersionDraft};
use crate::store::VersionStore;

/// One user's append-only history plus its topic counters.
#[derive(Debug, Default)]
struct UserHistory {
    versions: Vec<Version>,
    groups: TopicGroups,
}

type HistoryHandle = Arc<RwLock<UserHistory>>;

/// Version store kept entirely in memory.
///
/// Thread-safe via interior locks; designed to be wrapped in `Arc` and
/// shared across the application.
#[derive(Debug, Default)]
pub struct MemoryVersionStore {
    users: DashMap<UserId, HistoryHandle>,
    /// Version id -> owner's history and position within it.
    index: DashMap<VersionId, (HistoryHandle, usize)>,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn history(&self, user_id: &str) -> Option<HistoryHandle> {
        self.users.get(user_id).map(|entry| Arc::clone(entry.value()))
    }

    fn history_or_insert(&self, user_id: &str) -> HistoryHandle {
        if let Some(handle) = self.history(user_id) {
            return handle;
        }
        Arc::clone(self.users.entry(user_id.to_string()).or_default().value())
    }
}

#[async_trait]
impl VersionStore for MemoryVersionStore {
    async fn append(&self, draft: VersionDraft) -> Result<Version, CoreError> {
        let handle = self.history_or_insert(&draft.user_id);
        let mut history = handle.write().await;

        let number = history.groups.next_number(&draft.topic);
        let created_at = next_created_at(
            history.versions.last().map(|v| v.created_at),
            chrono::Utc::now(),
        );
        let version = draft.into_version(new_version_id(), number, created_at);

        history.groups.record(&version.topic, number);
        history.versions.push(version.clone());
        let position = history.versions.len() - 1;

        self.index
            .insert(version.id, (Arc::clone(&handle), position));

        Ok(version)
    }

    async fn find_by_id(&self, id: VersionId) -> Result<Option<Version>, CoreError> {
        let entry = self
            .index
            .get(&id)
            .map(|entry| (Arc::clone(&entry.value().0), entry.value().1));
        let Some((handle, position)) = entry else {
            return Ok(None);
        };
        let history = handle.read().await;
        Ok(history.versions.get(position).cloned())
    }

    async fn list_recent(&self, user_id: &str, limit: i64) -> Result<Vec<Version>, CoreError> {
        let Some(handle) = self.history(user_id) else {
            return Ok(Vec::new());
        };
        let limit = usize::try_from(limit).unwrap_or(0);
        let history = handle.read().await;
        Ok(history.versions.iter().rev().take(limit).cloned().collect())
    }

    async fn find_latest(
        &self,
        user_id: &str,
        topic: Option<&str>,
    ) -> Result<Option<Version>, CoreError> {
        let Some(handle) = self.history(user_id) else {
            return Ok(None);
        };
        let history = handle.read().await;
        Ok(history
            .versions
            .iter()
            .rev()
            .find(|v| topic.map_or(true, |t| v.topic == t))
            .cloned())
    }

    async fn count_for_user(&self, user_id: &str) -> Result<i64, CoreError> {
        let Some(handle) = self.history(user_id) else {
            return Ok(0);
        };
        let count = handle.read().await.versions.len();
        i64::try_from(count).map_err(|e| CoreError::Internal(e.to_string()))
    }

    async fn health_check(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verso_core::numbering::VersionNumber;
    use verso_core::version::VersionType;

    fn draft(user_id: &str, topic: &str) -> VersionDraft {
        VersionDraft {
            user_id: user_id.to_string(),
            content: format!("{topic} body"),
            version_type: VersionType::Save,
            topic: topic.to_string(),
            description: None,
            framework_id: None,
            framework_name: None,
            original_input: None,
        }
    }

    #[tokio::test]
    async fn append_assigns_numbers_per_topic() {
        let store = MemoryVersionStore::new();
        let a = store.append(draft("u", "a")).await.unwrap();
        let b = store.append(draft("u", "b")).await.unwrap();
        let a2 = store.append(draft("u", "a")).await.unwrap();

        assert_eq!(a.version_number, VersionNumber::new(1, 0));
        assert_eq!(b.version_number, VersionNumber::new(2, 0));
        assert_eq!(a2.version_number, VersionNumber::new(1, 1));
    }

    #[tokio::test]
    async fn users_number_independently() {
        let store = MemoryVersionStore::new();
        store.append(draft("alice", "a")).await.unwrap();
        store.append(draft("alice", "b")).await.unwrap();
        let bob = store.append(draft("bob", "b")).await.unwrap();
        assert_eq!(bob.version_number, VersionNumber::new(1, 0));
    }

    #[tokio::test]
    async fn created_at_strictly_increases() {
        let store = MemoryVersionStore::new();
        let mut previous = None;
        for _ in 0..50 {
            let v = store.append(draft("u", "t")).await.unwrap();
            if let Some(prev) = previous {
                assert!(v.created_at > prev);
            }
            previous = Some(v.created_at);
        }
    }

    #[tokio::test]
    async fn find_by_id_returns_stored_record() {
        let store = MemoryVersionStore::new();
        let v = store.append(draft("u", "t")).await.unwrap();
        assert_eq!(store.find_by_id(v.id).await.unwrap(), Some(v));
        assert_eq!(store.find_by_id(new_version_id()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_recent_is_newest_first_and_limited() {
        let store = MemoryVersionStore::new();
        for topic in ["a", "b", "c", "d"] {
            store.append(draft("u", topic)).await.unwrap();
        }
        let listed = store.list_recent("u", 3).await.unwrap();
        let topics: Vec<&str> = listed.iter().map(|v| v.topic.as_str()).collect();
        assert_eq!(topics, vec!["d", "c", "b"]);
        assert!(store.list_recent("nobody", 10).await.unwrap().is_empty());
        assert!(store.list_recent("u", -1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_latest_optionally_filters_by_topic() {
        let store = MemoryVersionStore::new();
        let a = store.append(draft("u", "a")).await.unwrap();
        let b = store.append(draft("u", "b")).await.unwrap();

        assert_eq!(store.find_latest("u", None).await.unwrap(), Some(b));
        assert_eq!(store.find_latest("u", Some("a")).await.unwrap(), Some(a));
        assert_eq!(store.find_latest("u", Some("zzz")).await.unwrap(), None);
        assert_eq!(store.find_latest("nobody", None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn append_for_one_user_does_not_wait_on_another() {
        let store = MemoryVersionStore::new();
        store.append(draft("alice", "a")).await.unwrap();

        let alice = store.history_or_insert("alice");
        let _held = alice.write().await;

        let bob = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            store.append(draft("bob", "b")),
        )
        .await
        .expect("bob's append must not block on alice's history")
        .unwrap();

        assert_eq!(bob.version_number, VersionNumber::new(1, 0));
        assert_eq!(store.find_by_id(bob.id).await.unwrap(), Some(bob));
    }

    #[tokio::test]
    async fn count_for_user() {
        let store = MemoryVersionStore::new();
        assert_eq!(store.count_for_user("u").await.unwrap(), 0);
        store.append(draft("u", "a")).await.unwrap();
        store.append(draft("u", "a")).await.unwrap();
        store.append(draft("other", "a")).await.unwrap();
        assert_eq!(store.count_for_user("u").await.unwrap(), 2);
    }
}
