//! Route unit registration.
//!
//! Route units live under `src/routes/`. Each one exposes a constructor that
//! returns an [`ApiRouter`] (a declared prefix, an optional tag and a list of
//! path bindings). The compiled-in manifest in [`crate::routes::MANIFEST`]
//! lists every unit together with its path relative to the routes root, and
//! [`discover_and_register`] turns that manifest into one axum `Router`:
//!
//! - `logs.rs` declaring `/logs` is served under `/logs`
//! - `v1/demo.rs` declaring `/demo` is served under `/v1/demo`
//! - `v2/test/x.rs` declaring `/x` is served under `/v2/test/x`
//!
//! A unit that fails to construct (error or panic), or whose bindings axum
//! refuses to insert, is logged and skipped; the remaining units are still
//! registered.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use axum::routing::MethodRouter;
use axum::Router;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// File stems that mark a directory module rather than a route unit.
const MARKER_STEMS: &[&str] = &["mod", "deps", "lib"];

/// What a route unit constructor gets to see.
pub struct LoadContext<'a> {
    pub config: &'a AppConfig,
}

pub type LoadFn = fn(&LoadContext<'_>) -> AppResult<ApiRouter>;

/// One manifest line: where the unit lives and how to build it.
#[derive(Clone, Copy)]
pub struct RouteEntry {
    /// Path relative to the routes root, `/`-separated (`v1/demo.rs`).
    pub path: &'static str,
    pub load: LoadFn,
}

impl RouteEntry {
    pub const fn new(path: &'static str, load: LoadFn) -> Self {
        Self { path, load }
    }
}

/// A bundle of path bindings plus the unit's declared prefix and tag.
pub struct ApiRouter {
    prefix: String,
    tag: Option<String>,
    bindings: Vec<(String, MethodRouter<AppState>)>,
}

impl ApiRouter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), tag: None, bindings: Vec::new() }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn route(mut self, path: impl Into<String>, handler: MethodRouter<AppState>) -> Self {
        self.bindings.push((path.into(), handler));
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|(p, _)| p.as_str())
    }
}

/// Record of a registered route unit.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MountedRoute {
    pub module: String,
    pub prefix: String,
    pub tag: Option<String>,
    /// Full paths this unit bound, after prefixing.
    pub paths: Vec<String>,
}

/// Outcome of a loader run.
pub struct Registration {
    pub router: Router<AppState>,
    pub mounted: Vec<MountedRoute>,
    pub failures: Vec<AppError>,
}

impl Registration {
    /// Number of route units that were registered.
    pub fn count(&self) -> usize {
        self.mounted.len()
    }
}

/// Returns true for manifest entries that are not route units.
pub fn is_marker(path: &str) -> bool {
    let p = Path::new(path);
    if p.extension().and_then(|e| e.to_str()) != Some("rs") {
        return true;
    }
    match p.file_stem().and_then(|s| s.to_str()) {
        Some(stem) => MARKER_STEMS.contains(&stem),
        None => true,
    }
}

/// Directory segments contributed by a unit's location, outermost first.
pub fn dir_segments(path: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = path.split(['/', '\\']).filter(|s| !s.is_empty()).collect();
    parts.pop();
    parts
}

/// Joins route fragments into one normalized path (`/a/b`, or `/` when empty).
pub fn join_route(parts: &[&str]) -> String {
    let segments: Vec<&str> =
        parts.iter().flat_map(|p| p.split('/')).filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Prefix a unit ends up under: its directories followed by its declared prefix.
pub fn derive_prefix(path: &str, declared: &str) -> String {
    let mut parts = dir_segments(path);
    parts.push(declared);
    join_route(&parts)
}

fn panic_message(payload: Box<dyn std::any::Any + Send>, fallback: &str) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| fallback.to_string())
}

fn load_unit(entry: &RouteEntry, ctx: &LoadContext<'_>) -> AppResult<ApiRouter> {
    match catch_unwind(AssertUnwindSafe(|| (entry.load)(ctx))) {
        Ok(Ok(router)) => Ok(router),
        Ok(Err(e)) => Err(AppError::Load { module: entry.path.to_string(), message: e.to_string() }),
        Err(panic) => Err(AppError::Load {
            module: entry.path.to_string(),
            message: panic_message(panic, "constructor panicked"),
        }),
    }
}

type RouteTable = Vec<(String, MethodRouter<AppState>)>;

/// Inserts every binding of `table` into a clone of `dispatcher`.
///
/// axum panics on paths it cannot insert (`/:id` syntax, `{id}` vs `{name}`
/// at the same position); that panic is returned as an error.
fn build_router(dispatcher: &Router<AppState>, table: &RouteTable) -> Result<Router<AppState>, String> {
    catch_unwind(AssertUnwindSafe(|| {
        table.iter().fold(dispatcher.clone(), |r, (path, handler)| r.route(path, handler.clone()))
    }))
    .map_err(|panic| panic_message(panic, "route insertion panicked"))
}

/// Builds every unit in `manifest` and registers its bindings on `dispatcher`.
///
/// When two bindings resolve to the same full path the later one replaces the
/// earlier one. A unit whose bindings cannot be inserted next to the ones
/// already registered is rejected as a whole and leaves the table untouched.
pub fn discover_and_register(
    manifest: &[RouteEntry],
    ctx: &LoadContext<'_>,
    dispatcher: Router<AppState>,
) -> Registration {
    let mut table: RouteTable = Vec::new();
    let mut owners: HashMap<String, (usize, String)> = HashMap::new();
    let mut router = dispatcher.clone();
    let mut mounted = Vec::new();
    let mut failures = Vec::new();

    for entry in manifest {
        if is_marker(entry.path) {
            continue;
        }

        let unit = match load_unit(entry, ctx) {
            Ok(unit) => unit,
            Err(e) => {
                error!(module = entry.path, error = %e, "Failed to load route module");
                failures.push(e);
                continue;
            }
        };

        if unit.is_empty() {
            warn!(module = entry.path, "Route module exposes no routes, skipping");
            continue;
        }

        let prefix = derive_prefix(entry.path, unit.prefix());
        let tag = unit.tag().map(str::to_string);
        let mut paths = Vec::with_capacity(unit.bindings.len());
        let mut next_table = table.clone();
        let mut next_owners = owners.clone();

        for (path, handler) in unit.bindings {
            let full = join_route(&[&prefix, &path]);
            match next_owners.get(&full).cloned() {
                Some((idx, previous)) => {
                    warn!(
                        path = %full,
                        previous = %previous,
                        module = entry.path,
                        "Route already registered, later registration wins"
                    );
                    next_table[idx].1 = handler;
                    next_owners.insert(full.clone(), (idx, entry.path.to_string()));
                }
                None => {
                    next_owners.insert(full.clone(), (next_table.len(), entry.path.to_string()));
                    next_table.push((full.clone(), handler));
                }
            }
            paths.push(full);
        }

        match build_router(&dispatcher, &next_table) {
            Ok(built) => {
                router = built;
                table = next_table;
                owners = next_owners;
            }
            Err(message) => {
                let e = AppError::Load { module: entry.path.to_string(), message };
                error!(module = entry.path, error = %e, "Failed to register route module");
                failures.push(e);
                continue;
            }
        }

        info!(module = entry.path, prefix = %prefix, routes = paths.len(), "Loaded route module");
        mounted.push(MountedRoute { module: entry.path.to_string(), prefix, tag, paths });
    }

    if mounted.is_empty() {
        warn!("No route modules registered");
    } else {
        info!(count = mounted.len(), failed = failures.len(), "Route modules registered");
    }

    Registration { router, mounted, failures }
}
