use axum::{extract::State, routing::get};
use serde::Serialize;

use crate::error::AppResult;
use crate::loader::{ApiRouter, LoadContext};
use crate::state::AppState;
use crate::system_info::{self, SystemStats};
use crate::types::ApiResponse;

pub fn router(_ctx: &LoadContext<'_>) -> AppResult<ApiRouter> {
    Ok(ApiRouter::new("").with_tag("system").route("/", get(root)).route("/health", get(health)))
}

#[derive(Debug, Serialize)]
pub struct RouteSummary {
    pub module: String,
    pub prefix: String,
    pub tag: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AppInfo {
    pub name: String,
    pub app_id: String,
    pub version: String,
    pub description: String,
    pub routes: Vec<RouteSummary>,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub uptime_seconds: u64,
    pub os: &'static str,
    pub arch: &'static str,
    #[serde(flatten)]
    pub system: SystemStats,
}

// Application metadata from configuration
pub async fn root(State(state): State<AppState>) -> ApiResponse<AppInfo> {
    let app = &state.config.app;
    ApiResponse::ok(AppInfo {
        name: app.name.clone(),
        app_id: state.app_id.clone(),
        version: app.version().to_string(),
        description: app.description.clone(),
        routes: state
            .routes
            .iter()
            .map(|r| RouteSummary { module: r.module.clone(), prefix: r.prefix.clone(), tag: r.tag.clone() })
            .collect(),
    })
}

// Process uptime plus a host snapshot (cpu, memory, disk of log.dir, boot)
pub async fn health(State(state): State<AppState>) -> ApiResponse<Health> {
    let system = system_info::collect(&state.config.log.dir).await;
    ApiResponse::ok(Health {
        status: "healthy",
        uptime_seconds: state.started_at.elapsed().as_secs(),
        os: std::env::consts::OS,
        arch: std::env::consts::ARCH,
        system,
    })
}
