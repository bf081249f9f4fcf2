//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use page_router::config::DiscoveryConfig;
use page_router::RouteNode;
use tempfile::TempDir;

/// Page files of the reference site.
pub const SITE: &[&str] = &[
    "index.tsx",
    "about.tsx",
    "$id.tsx",
    "blog/_layout.tsx",
    "blog/index.tsx",
    "blog/$slug.tsx",
];

/// Create a temporary pages directory holding empty `files`.
pub fn pages_dir(files: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for file in files {
        touch(dir.path(), file);
    }
    dir
}

pub fn touch(root: &Path, file: &str) {
    let path = root.join(file);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, "export default () => null\n").unwrap();
}

pub fn discovery_config(root: &Path) -> DiscoveryConfig {
    DiscoveryConfig {
        pages_dir: root.to_path_buf(),
        ..DiscoveryConfig::default()
    }
}

/// Sibling paths of one tree level.
pub fn paths(nodes: &[RouteNode]) -> Vec<String> {
    nodes.iter().map(|n| n.path.clone()).collect()
}
