use std::path::PathBuf;

use serde::Deserialize;

const DEFAULTS: &str = include_str!("../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct AppInfoConfig {
    pub name: String,
    /// Falls back to an id derived from the machine when unset.
    pub id: Option<String>,
    /// Falls back to the crate version when unset.
    pub version: Option<String>,
    pub description: String,
}

impl AppInfoConfig {
    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or(env!("CARGO_PKG_VERSION"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub console: bool,
    pub dir: PathBuf,
    pub file_name: String,
    pub rotation: String,
    pub max_files: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewerConfig {
    pub static_dir: PathBuf,
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub tail_poll_interval_ms: u64,
    pub tail_channel_capacity: usize,
    pub tail_idle_timeout_secs: u64,
    pub tail_max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppInfoConfig,
    pub server: ServerConfig,
    pub log: LogConfig,
    pub viewer: ViewerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        match ::config::Config::builder()
            .add_source(::config::File::from_str(DEFAULTS, ::config::FileFormat::Toml))
            .build()
            .and_then(|cfg| cfg.try_deserialize())
        {
            Ok(app_cfg) => app_cfg,
            Err(e) => panic!("Failed to load embedded default config: {}", e),
        }
    }
}

pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();

    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(DEFAULTS, ::config::FileFormat::Toml))
        // Optional local file: restbase.toml (in CWD)
        .add_source(::config::File::with_name("restbase").required(false));

    if let Ok(custom_path) = std::env::var("RESTBASE_CONFIG") {
        builder = builder.add_source(::config::File::with_name(&custom_path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(::config::Environment::with_prefix("RESTBASE").separator("__"));

    let cfg = builder.build()?;
    let app_cfg: AppConfig = cfg.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

pub(crate) fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }

    if cfg.app.name.trim().is_empty() {
        return Err(anyhow::anyhow!("app.name must not be empty"));
    }

    if cfg.log.file_name.trim().is_empty() {
        return Err(anyhow::anyhow!("log.file_name must not be empty"));
    }
    if !matches!(cfg.log.rotation.as_str(), "minutely" | "hourly" | "daily" | "never") {
        return Err(anyhow::anyhow!(
            "log.rotation must be one of minutely, hourly, daily, never (got {})",
            cfg.log.rotation
        ));
    }

    let v = &cfg.viewer;
    if v.max_page_size == 0 {
        return Err(anyhow::anyhow!("viewer.max_page_size must be > 0"));
    }
    if v.default_page_size == 0 || v.default_page_size > v.max_page_size {
        return Err(anyhow::anyhow!("viewer.default_page_size must be in 1..=max_page_size"));
    }
    if v.tail_poll_interval_ms == 0 {
        return Err(anyhow::anyhow!("viewer.tail_poll_interval_ms must be > 0"));
    }
    if v.tail_channel_capacity == 0 {
        return Err(anyhow::anyhow!("viewer.tail_channel_capacity must be > 0"));
    }

    Ok(())
}
