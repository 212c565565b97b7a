use std::sync::Arc;

use verso_db::VersionManager;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Version history engine over the configured store.
    pub versions: Arc<VersionManager>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
