//! # restbase
//!
//! A small scaffold for REST services on axum. Route units are registered
//! from a compiled-in manifest, every reply uses the same
//! `{code, message, data, request_id}` envelope, configuration is layered from
//! an embedded default through files to the environment, and the service's own
//! log files can be browsed and tailed over HTTP.
//!
//! ## Core Components
//!
//! - [`app`]: router assembly (loader, fallback, tower-http layers)
//! - [`config`]: layered configuration loading and validation
//! - [`error`]: error taxonomy and its envelope responses
//! - [`lifecycle`]: startup and shutdown hooks
//! - [`loader`]: route unit registration and prefix derivation
//! - [`log_reader`]: log file listing, paging and live tail
//! - [`logging`]: tracing subscriber with rolling file output
//! - [`routes`]: the route units and their manifest
//! - [`state`]: shared, read-only application state
//! - [`system_info`]: host statistics and the machine-derived app id
//! - [`types`]: envelope and DTOs

pub mod app;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod loader;
pub mod log_reader;
pub mod logging;
pub mod routes;
pub mod state;
pub mod system_info;
pub mod types;

#[cfg(test)]
mod tests;
