//! Route configuration
//!
//! Each endpoint only answers its declared methods; anything else gets a
//! 405 from the method router.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/assign", get(handlers::assign::assign))
        .route(
            "/upload",
            post(handlers::upload::upload).put(handlers::upload::upload),
        )
        // the path form exists to carry filenames in the URL
        .route("/get", get(handlers::get::get_query))
        .route("/get/{filename}", get(handlers::get::get_path))
        .route("/verify", get(handlers::verify::verify))
        .route("/delete", post(handlers::delete::delete_query))
        .route("/delete/{filename}", delete(handlers::delete::delete_path))
        // size limits come from the upload policy, not a blanket cap
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
