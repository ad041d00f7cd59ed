use std::sync::Arc;

use embedq_core::TaskFacade;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub facade: Arc<TaskFacade>,
    pub config: Arc<ServerConfig>,
}
