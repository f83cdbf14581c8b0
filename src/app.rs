use axum::http::Uri;
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::loader::{self, LoadContext, RouteEntry};
use crate::routes;
use crate::state::AppState;

/// Builds the application router from the compiled-in route manifest.
pub fn build_app(config: AppConfig) -> (Router, AppState) {
    build_app_with(config, routes::MANIFEST)
}

/// Same as [`build_app`] with an explicit manifest.
pub fn build_app_with(config: AppConfig, manifest: &[RouteEntry]) -> (Router, AppState) {
    let registration = {
        let ctx = LoadContext { config: &config };
        loader::discover_and_register(manifest, &ctx, Router::new())
    };

    let state = AppState::new(config, registration.mounted);
    let app = registration
        .router
        .fallback(not_found)
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    (app, state)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}
