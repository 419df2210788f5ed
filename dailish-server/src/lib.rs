pub mod api;
pub mod database;
pub mod errors;
pub mod queries;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<database::ServerDatabase>,
}

impl AppState {
    pub fn new(db: database::ServerDatabase) -> Self {
        Self { db: Arc::new(db) }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route(
            "/api/users/:key",
            get(api::get_document)
                .post(api::create_document)
                .delete(api::delete_document),
        )
        .route(
            "/api/users/:key/tasks",
            post(api::append_task).put(api::replace_tasks),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
