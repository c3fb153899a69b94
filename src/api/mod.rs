pub mod auth;
pub mod notes;
pub mod ws;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .nest("/api/auth", auth::routes())
        .nest("/api/notes", notes::routes())
        .route("/api/ws", get(ws::note_events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
