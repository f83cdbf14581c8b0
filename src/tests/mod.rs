//! Integration and unit tests for restbase.
//!
//! ## Test Modules
//!
//! - **api_tests**: endpoints through the full router, envelope shape
//! - **config_tests**: configuration defaults, layering and validation
//! - **error_tests**: error mapping and envelope bodies
//! - **lifecycle_tests**: startup/shutdown hook ordering and failures
//! - **loader_tests**: prefix derivation, failure containment, manifest check
//! - **log_reader_tests**: listing, path resolution and paging
//! - **tail_tests**: live tail subscriptions

pub mod error_tests;
pub mod tail_tests;

use std::path::Path;

use crate::config::AppConfig;

/// Default configuration with the log directory pointed at `log_dir`.
pub(crate) fn test_config(log_dir: &Path) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.log.dir = log_dir.to_path_buf();
    cfg
}

pub(crate) fn write_file(path: &Path, content: &str) {
    std::fs::write(path, content).unwrap();
}
