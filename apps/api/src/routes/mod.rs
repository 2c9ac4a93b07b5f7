mod extract;
pub mod health;
pub mod session;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session lifecycle
        .route(
            "/api/v1/session",
            post(session::handle_load)
                .get(session::handle_get_session)
                .delete(session::handle_reset),
        )
        .route("/api/v1/session/match", post(session::handle_match))
        // View state
        .route("/api/v1/session/sort", put(session::handle_set_sort))
        .route("/api/v1/session/expanded", put(session::handle_set_expanded))
        .route(
            "/api/v1/session/candidates/:id/toggle",
            post(session::handle_toggle_expanded),
        )
        // Reconciled deletion
        .route(
            "/api/v1/session/candidates",
            delete(session::handle_delete_all),
        )
        .route(
            "/api/v1/session/candidates/:id",
            delete(session::handle_delete_one),
        )
        // Report
        .route("/api/v1/session/report", get(session::handle_report))
        .route("/api/v1/session/export", get(session::handle_export))
        .with_state(state)
}
