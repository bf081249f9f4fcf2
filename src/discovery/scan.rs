//! Pages directory scanning.

use std::path::Path;

use crate::config::DiscoveryConfig;
use crate::discovery::tree::{build_routes, is_route_file};
use crate::error::{Result, RouteError};
use crate::observability::metrics;
use crate::routing::route::RouteNode;

/// List page files under `config.pages_dir`, relative and `/`-separated.
///
/// Hidden entries are skipped; ignore files are not consulted. The walk is
/// sorted by file name so discovery order is stable across platforms.
pub fn scan_pages(config: &DiscoveryConfig) -> Result<Vec<String>> {
    let root = config.pages_dir.as_path();
    if !root.is_dir() {
        return Err(RouteError::MissingPagesDir(root.display().to_string()));
    }

    let walker = ignore::WalkBuilder::new(root)
        .hidden(true)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let Some(relative) = relative_path(root, entry.path()) else {
            continue;
        };
        if is_route_file(&relative, config) {
            files.push(relative);
        }
    }

    tracing::debug!(pages_dir = %root.display(), files = files.len(), "Pages scanned");
    Ok(files)
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    Some(segments?.join("/"))
}

/// Scan the pages directory and build its route tree.
pub fn discover(config: &DiscoveryConfig) -> Result<Vec<RouteNode>> {
    let result = scan_pages(config).and_then(|files| build_routes(&files, config));
    metrics::record_tree_build(result.is_ok());
    match &result {
        Ok(routes) => tracing::info!(routes = routes.len(), "Route tree built"),
        Err(e) => tracing::error!(error = %e, "Route tree build failed"),
    }
    result
}
