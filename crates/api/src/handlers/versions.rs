//! Handlers for version history and rollback.
//!
//! Callers identify the acting user explicitly (`user_id` in the query or
//! body); authentication is the job of whatever sits in front of this
//! service.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use verso_core::error::CoreError;
use verso_core::numbering::VersionNumber;
use verso_core::types::{Timestamp, UserId, VersionId};
use verso_core::version::VersionType;
use verso_db::models::version::{CreateVersion, Version};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// `?user_id=&limit=` for version listings.
#[derive(Debug, Deserialize)]
pub struct VersionListParams {
    pub user_id: UserId,
    pub limit: Option<i64>,
}

/// `?user_id=&topic=` for the latest-version lookup.
#[derive(Debug, Deserialize)]
pub struct LatestVersionParams {
    pub user_id: UserId,
    pub topic: Option<String>,
}

/// `?user_id=` identifying who asks for a rollback.
#[derive(Debug, Deserialize)]
pub struct RollbackParams {
    pub user_id: UserId,
}

// ---------------------------------------------------------------------------
// API request / response types
// ---------------------------------------------------------------------------

/// Request body for saving a new version.
#[derive(Debug, Deserialize, Validate)]
pub struct SaveVersionRequest {
    #[validate(length(min = 1, max = 128))]
    pub user_id: UserId,
    #[validate(length(min = 1))]
    pub content: String,
    /// `save` or `optimize`.
    #[serde(rename = "type", default = "default_type_tag")]
    pub version_type: String,
    pub topic: Option<String>,
    pub original_input: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub framework_id: Option<String>,
    pub framework_name: Option<String>,
}

fn default_type_tag() -> String {
    VersionType::Save.as_str().to_string()
}

/// A version as exposed over HTTP, with its display title.
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub id: VersionId,
    pub user_id: UserId,
    pub content: String,
    #[serde(rename = "type")]
    pub version_type: VersionType,
    pub topic: String,
    pub version_number: VersionNumber,
    pub created_at: Timestamp,
    pub formatted_title: String,
    pub description: Option<String>,
    pub framework_id: Option<String>,
    pub framework_name: Option<String>,
    pub original_input: Option<String>,
}

impl From<Version> for VersionResponse {
    fn from(v: Version) -> Self {
        let formatted_title = v.formatted_title();
        Self {
            id: v.id,
            user_id: v.user_id,
            content: v.content,
            version_type: v.version_type,
            topic: v.topic,
            version_number: v.version_number,
            created_at: v.created_at,
            formatted_title,
            description: v.description,
            framework_id: v.framework_id,
            framework_name: v.framework_name,
            original_input: v.original_input,
        }
    }
}

// ---------------------------------------------------------------------------
// GET /versions
// ---------------------------------------------------------------------------

/// List a user's most recent versions, newest first.
pub async fn list_versions(
    State(state): State<AppState>,
    Query(params): Query<VersionListParams>,
) -> AppResult<impl IntoResponse> {
    if let Some(limit) = params.limit.filter(|l| *l < 0) {
        return Err(AppError::BadRequest(format!(
            "limit must be zero or greater (got {limit})"
        )));
    }

    let versions = state
        .versions
        .get_versions(&params.user_id, params.limit)
        .await?;

    let data: Vec<VersionResponse> = versions.into_iter().map(VersionResponse::from).collect();
    Ok(Json(DataResponse { data }))
}

// ---------------------------------------------------------------------------
// POST /versions
// ---------------------------------------------------------------------------

/// Save a new version. The topic is derived unless supplied.
pub async fn save_version(
    State(state): State<AppState>,
    Json(body): Json<SaveVersionRequest>,
) -> AppResult<impl IntoResponse> {
    body.validate()?;
    let version_type: VersionType = body.version_type.parse()?;

    let input = CreateVersion {
        user_id: body.user_id,
        content: body.content,
        version_type,
        topic: body.topic,
        original_input: body.original_input,
        description: body.description,
        framework_id: body.framework_id,
        framework_name: body.framework_name,
    };

    let version = state.versions.save_version(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: VersionResponse::from(version),
        }),
    ))
}

// ---------------------------------------------------------------------------
// GET /versions/latest
// ---------------------------------------------------------------------------

/// Most recent version of a user, optionally within one topic. `data` is
/// `null` when the user has none.
pub async fn latest_version(
    State(state): State<AppState>,
    Query(params): Query<LatestVersionParams>,
) -> AppResult<impl IntoResponse> {
    let version = state
        .versions
        .latest_version(&params.user_id, params.topic.as_deref())
        .await?;

    Ok(Json(DataResponse {
        data: version.map(VersionResponse::from),
    }))
}

// ---------------------------------------------------------------------------
// GET /versions/{id}
// ---------------------------------------------------------------------------

/// Fetch one version by id.
pub async fn get_version(
    State(state): State<AppState>,
    Path(version_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let version = state
        .versions
        .get_version(&version_id)
        .await?
        .ok_or_else(|| CoreError::version_not_found(&version_id))?;

    Ok(Json(DataResponse {
        data: VersionResponse::from(version),
    }))
}

// ---------------------------------------------------------------------------
// POST /versions/{id}/rollback
// ---------------------------------------------------------------------------

/// Roll back to an earlier version by saving its content as a new version.
pub async fn rollback_version(
    State(state): State<AppState>,
    Path(version_id): Path<String>,
    Query(params): Query<RollbackParams>,
) -> AppResult<impl IntoResponse> {
    let restored = state
        .versions
        .rollback_version(&params.user_id, &version_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: VersionResponse::from(restored),
        }),
    ))
}
