//! HTTP route units.
//!
//! Every file below this directory (except `mod.rs` markers) is a route unit
//! with a `router` constructor, and must be listed in [`MANIFEST`] under its
//! path relative to this directory. Directories become URL prefixes:
//!
//! - `logs.rs`: log viewer, served under `/logs`
//! - `system.rs`: application info and health, served at the root
//! - `v1/demo.rs`: envelope and error demos, served under `/v1/demo`

pub mod logs;
pub mod system;
pub mod v1;

use crate::loader::RouteEntry;

pub static MANIFEST: &[RouteEntry] = &[
    RouteEntry::new("logs.rs", logs::router),
    RouteEntry::new("system.rs", system::router),
    RouteEntry::new("v1/demo.rs", v1::demo::router),
];
