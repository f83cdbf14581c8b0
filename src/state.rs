use std::sync::Arc;
use std::time::Instant;

use crate::config::AppConfig;
use crate::loader::MountedRoute;
use crate::system_info;

/// The shared application state.
///
/// Built once by [`crate::app::build_app`] after the route loader has run and
/// handed to every handler through axum's `State` extractor. Nothing in it is
/// mutated after startup.
#[derive(Clone)]
pub struct AppState {
    /// The application configuration.
    pub config: Arc<AppConfig>,
    /// Route units registered at startup, in registration order.
    pub routes: Arc<[MountedRoute]>,
    /// Process start, used for uptime reporting.
    pub started_at: Instant,
    /// `app.id` from configuration, or the machine-derived id.
    pub app_id: String,
}

impl AppState {
    pub fn new(config: AppConfig, routes: Vec<MountedRoute>) -> Self {
        let app_id = config.app.id.clone().unwrap_or_else(system_info::machine_app_id);
        Self { config: Arc::new(config), routes: routes.into(), started_at: Instant::now(), app_id }
    }
}
