//! Postgres-backed version store for the `versions` table.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use verso_core::error::CoreError;
use verso_core::numbering::{next_created_at, TopicGroups, VersionNumber};
use verso_core::types::{new_version_id, Timestamp, VersionId};

use crate::models::version::{Version, VersionDraft};
use crate::store::VersionStore;

/// Column list for versions queries.
const COLUMNS: &str = "id, user_id, content, version_type, topic, major, minor, \
    description, framework_id, framework_name, original_input, created_at";

/// Raw `versions` row; converted into [`Version`] after validation.
#[derive(Debug, FromRow)]
struct VersionRow {
    id: VersionId,
    user_id: String,
    content: String,
    version_type: String,
    topic: String,
    major: i32,
    minor: i32,
    description: Option<String>,
    framework_id: Option<String>,
    framework_name: Option<String>,
    original_input: Option<String>,
    created_at: Timestamp,
}

impl TryFrom<VersionRow> for Version {
    type Error = CoreError;

    fn try_from(row: VersionRow) -> Result<Self, Self::Error> {
        Ok(Version {
            id: row.id,
            user_id: row.user_id,
            content: row.content,
            version_type: row.version_type.parse()?,
            topic: row.topic,
            version_number: number_from_columns(row.major, row.minor)?,
            created_at: row.created_at,
            description: row.description,
            framework_id: row.framework_id,
            framework_name: row.framework_name,
            original_input: row.original_input,
        })
    }
}

fn number_from_columns(major: i32, minor: i32) -> Result<VersionNumber, CoreError> {
    let convert = |v: i32| {
        u32::try_from(v).map_err(|_| CoreError::Internal(format!("Negative version component {v}")))
    };
    Ok(VersionNumber::new(convert(major)?, convert(minor)?))
}

fn column_from_component(v: u32) -> Result<i32, CoreError> {
    i32::try_from(v).map_err(|_| CoreError::Internal(format!("Version component {v} out of range")))
}

/// Map a sqlx failure to the store-unavailable signal, logging the cause.
fn store_error(err: sqlx::Error) -> CoreError {
    tracing::error!(error = %err, "Version store error");
    CoreError::StoreUnavailable(err.to_string())
}

/// Version store over a Postgres pool.
///
/// Appends run in a transaction holding a per-user advisory lock, so
/// numbering and insertion are serialized per user across processes.
#[derive(Debug, Clone)]
pub struct PgVersionStore {
    pool: PgPool,
}

impl PgVersionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VersionStore for PgVersionStore {
    async fn append(&self, draft: VersionDraft) -> Result<Version, CoreError> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(&draft.user_id)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        // Within a group the major is fixed, so this yields one row per topic.
        let head_rows: Vec<(String, i32, i32)> = sqlx::query_as(
            "SELECT topic, major, MAX(minor) FROM versions
             WHERE user_id = $1
             GROUP BY topic, major",
        )
        .bind(&draft.user_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(store_error)?;

        let heads = head_rows
            .iter()
            .map(|(topic, major, minor)| Ok((topic.as_str(), number_from_columns(*major, *minor)?)))
            .collect::<Result<Vec<_>, CoreError>>()?;
        let number = TopicGroups::from_history(heads).next_number(&draft.topic);

        let (last_created_at,): (Option<Timestamp>,) =
            sqlx::query_as("SELECT MAX(created_at) FROM versions WHERE user_id = $1")
                .bind(&draft.user_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(store_error)?;
        let created_at = next_created_at(last_created_at, chrono::Utc::now());

        let query = format!(
            "INSERT INTO versions
                (id, user_id, content, version_type, topic, major, minor,
                 description, framework_id, framework_name, original_input, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, VersionRow>(&query)
            .bind(new_version_id())
            .bind(&draft.user_id)
            .bind(&draft.content)
            .bind(draft.version_type.as_str())
            .bind(&draft.topic)
            .bind(column_from_component(number.major)?)
            .bind(column_from_component(number.minor)?)
            .bind(&draft.description)
            .bind(&draft.framework_id)
            .bind(&draft.framework_name)
            .bind(&draft.original_input)
            .bind(created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;
        row.try_into()
    }

    async fn find_by_id(&self, id: VersionId) -> Result<Option<Version>, CoreError> {
        let query = format!("SELECT {COLUMNS} FROM versions WHERE id = $1");
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .map(Version::try_from)
            .transpose()
    }

    async fn list_recent(&self, user_id: &str, limit: i64) -> Result<Vec<Version>, CoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM versions
             WHERE user_id = $1
             ORDER BY created_at DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(user_id)
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(Version::try_from)
            .collect()
    }

    async fn find_latest(
        &self,
        user_id: &str,
        topic: Option<&str>,
    ) -> Result<Option<Version>, CoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM versions
             WHERE user_id = $1 AND ($2::TEXT IS NULL OR topic = $2)
             ORDER BY created_at DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(user_id)
            .bind(topic)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .map(Version::try_from)
            .transpose()
    }

    async fn count_for_user(&self, user_id: &str) -> Result<i64, CoreError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM versions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.0)
    }

    async fn health_check(&self) -> Result<(), CoreError> {
        crate::health_check(&self.pool).await.map_err(store_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn number_columns_round_trip() {
        assert_eq!(number_from_columns(3, 7).unwrap(), VersionNumber::new(3, 7));
        assert_eq!(column_from_component(7).unwrap(), 7);
    }

    #[test]
    fn negative_columns_are_rejected() {
        assert_matches!(number_from_columns(-1, 0), Err(CoreError::Internal(_)));
        assert_matches!(column_from_component(u32::MAX), Err(CoreError::Internal(_)));
    }

    #[test]
    fn unknown_type_in_row_is_rejected() {
        let row = VersionRow {
            id: new_version_id(),
            user_id: "u".into(),
            content: "c".into(),
            version_type: "publish".into(),
            topic: "t".into(),
            major: 1,
            minor: 0,
            description: None,
            framework_id: None,
            framework_name: None,
            original_input: None,
            created_at: chrono::Utc::now(),
        };
        assert!(Version::try_from(row).is_err());
    }
}
