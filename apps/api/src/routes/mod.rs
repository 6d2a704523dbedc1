pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Single generation endpoint; non-POST methods get 405 from the router.
        .route("/api/v1/resumes", post(handlers::handle_generate))
        .with_state(state)
}
