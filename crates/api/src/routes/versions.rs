//! Route definitions for version history.
//!
//! ```text
//! VERSIONS (mounted at /versions):
//! GET    /                     list_versions     (?user_id=&limit=)
//! POST   /                     save_version
//! GET    /latest               latest_version    (?user_id=&topic=)
//! GET    /{id}                 get_version
//! POST   /{id}/rollback        rollback_version  (?user_id=)
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::versions;
use crate::state::AppState;

/// Version routes -- mounted at `/versions`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(versions::list_versions).post(versions::save_version),
        )
        .route("/latest", get(versions::latest_version))
        .route("/{id}", get(versions::get_version))
        .route("/{id}/rollback", post(versions::rollback_version))
}
