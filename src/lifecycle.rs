//! Startup and shutdown hooks.
//!
//! Hooks run in registration order. `main` runs the startup hooks after the
//! routes are registered and before the listener accepts connections, and the
//! shutdown hooks once graceful shutdown has drained the server. Shutdown
//! hooks also run when a startup hook fails.

use std::future::Future;

use anyhow::Context;
use futures::future::{BoxFuture, FutureExt};
use tracing::{error, info};

use crate::state::AppState;

type Hook = Box<dyn Fn(AppState) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

#[derive(Default)]
pub struct Lifecycle {
    startup: Vec<(String, Hook)>,
    shutdown: Vec<(String, Hook)>,
}

fn boxed<F, Fut>(hook: F) -> Hook
where
    F: Fn(AppState) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Box::new(move |state| hook(state).boxed())
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_startup<F, Fut>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.startup.push((name.into(), boxed(hook)));
        self
    }

    pub fn on_shutdown<F, Fut>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.shutdown.push((name.into(), boxed(hook)));
        self
    }

    /// Runs startup hooks in order, stopping at the first failure.
    pub async fn run_startup(&self, state: &AppState) -> anyhow::Result<()> {
        for (name, hook) in &self.startup {
            hook(state.clone()).await.with_context(|| format!("startup hook {} failed", name))?;
            info!(hook = %name, "Startup hook finished");
        }
        Ok(())
    }

    /// Runs every shutdown hook; failures are logged and do not stop the rest.
    /// Returns the number of hooks that failed.
    pub async fn run_shutdown(&self, state: &AppState) -> usize {
        let mut failed = 0;
        for (name, hook) in &self.shutdown {
            match hook(state.clone()).await {
                Ok(()) => info!(hook = %name, "Shutdown hook finished"),
                Err(e) => {
                    failed += 1;
                    error!(hook = %name, error = %e, "Shutdown hook failed");
                }
            }
        }
        failed
    }
}

/// Hooks every service starts with.
pub fn default_hooks() -> Lifecycle {
    Lifecycle::new()
        .on_startup("announce", |state: AppState| async move {
            info!(
                app = %state.config.app.name,
                app_id = %state.app_id,
                version = state.config.app.version(),
                routes = state.routes.len(),
                "Service started"
            );
            Ok::<(), anyhow::Error>(())
        })
        .on_shutdown("announce", |state: AppState| async move {
            info!(app = %state.config.app.name, "Service stopped");
            Ok::<(), anyhow::Error>(())
        })
}
