use std::sync::Arc;

use axum::{
    Router,
    routing::post,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn availability_routes(state: Arc<AppConfig>) -> Router {
    // Public: a bearer token, when sent, is forwarded to the data store for RLS.
    Router::new()
        .route("/available-slots", post(handlers::get_available_slots))
        .with_state(state)
}
