pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::resume::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/resume/:id", get(handlers::handle_get_resume))
        .route("/resume/:id/url", get(handlers::handle_get_resume_url))
        .route("/resume/:id/cache", delete(handlers::handle_invalidate_resume))
        .route("/bulk-export", post(handlers::handle_bulk_export))
        .with_state(state)
}
