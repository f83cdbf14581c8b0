use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

/// Keeps the non-blocking writers alive; dropping it flushes and stops them.
#[must_use = "dropping the guards stops log output"]
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

fn rotation(name: &str) -> anyhow::Result<Rotation> {
    match name {
        "minutely" => Ok(Rotation::MINUTELY),
        "hourly" => Ok(Rotation::HOURLY),
        "daily" => Ok(Rotation::DAILY),
        "never" => Ok(Rotation::NEVER),
        other => Err(anyhow::anyhow!("unknown log rotation: {}", other)),
    }
}

/// Installs the global subscriber: optional stdout plus a rolling file in
/// `log.dir`, which is what the log viewer reads.
///
/// `RUST_LOG` overrides `log.level` when set.
pub fn init(cfg: &LogConfig) -> anyhow::Result<LogGuards> {
    std::fs::create_dir_all(&cfg.dir)?;

    let mut builder =
        RollingFileAppender::builder().rotation(rotation(&cfg.rotation)?).filename_prefix(&cfg.file_name);
    if cfg.max_files > 0 {
        builder = builder.max_log_files(cfg.max_files);
    }
    let (file_nb, file_guard) = tracing_appender::non_blocking(builder.build(&cfg.dir)?);
    let mut guards = vec![file_guard];

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!("{},tower_http=info", cfg.level))?,
    };

    let stdout_layer = if cfg.console {
        let (stdout_nb, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
        guards.push(stdout_guard);
        Some(fmt::layer().with_writer(stdout_nb))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(fmt::layer().with_ansi(false).with_writer(file_nb))
        .try_init()?;

    Ok(LogGuards { _guards: guards })
}
