mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};
use pullwatch_core::{CommandRunner, SystemRunner};
use tower_http::cors::CorsLayer;

pub use handlers::{gpu_status, home, not_found, Message};

#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<dyn CommandRunner>,
}

impl AppState {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(SystemRunner))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/gpu", get(gpu_status))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
