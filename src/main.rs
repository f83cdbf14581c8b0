use std::net::SocketAddr;

use tracing::info;

use restbase::{app, config, lifecycle, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (embedded defaults -> restbase.toml -> env/.env)
    let app_cfg = config::load()?;

    // Logging (stdout + rotating file under log.dir, which the viewer reads)
    let _log_guards = logging::init(&app_cfg.log)?;

    let port: u16 = app_cfg.server.port;
    let host: String = app_cfg.server.host.clone();
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid listen addr {}:{} - {}", host, port, e))?;

    // Route units are registered before the listener is bound
    let (router, state) = app::build_app(app_cfg);
    info!(routes = state.routes.len(), "Route registration finished");

    let hooks = lifecycle::default_hooks();
    if let Err(e) = hooks.run_startup(&state).await {
        hooks.run_shutdown(&state).await;
        return Err(e);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("{} listening on http://{}", state.config.app.name, listener.local_addr()?);
    let served = axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await;

    hooks.run_shutdown(&state).await;
    info!("Server stopped");
    served.map_err(Into::into)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut term = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(term) => term,
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutdown signal received. Stopping server...");
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("Shutdown signal received. Stopping server...");
}
