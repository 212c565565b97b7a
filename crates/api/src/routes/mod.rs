pub mod health;
pub mod versions;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /versions                     list, save
/// /versions/latest              most recent version (optionally per topic)
/// /versions/{id}                get
/// /versions/{id}/rollback       rollback (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/versions", versions::router())
}
