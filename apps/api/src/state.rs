use std::sync::Arc;

use crate::config::Config;
use crate::layout::LayoutConfig;
use crate::session::CollectionManager;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Owns the single Session Collection and its collaborator backend.
    pub manager: CollectionManager,
    pub config: Config,
    /// Report geometry, validated at startup.
    pub layout: Arc<LayoutConfig>,
}
