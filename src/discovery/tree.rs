//! Route tree construction from page file paths.
//!
//! # Responsibilities
//! - Normalise file paths into route ids and route paths
//! - Nest pages and layouts under their nearest ancestor layout
//! - Order every sibling list deterministically
//! - Reject sibling groups with more than one dynamic route
//!
//! # Data Flow
//! ```text
//! ["/index.tsx", "/blog/_layout.tsx", "/blog/$slug.tsx", ...]
//!     → normalize_file_path        "/blog/$slug"
//!     → classify                   layout | index | page
//!     → parent = nearest layout    "/blog/_layout"
//!     → build levels bottom-up, sort by (priority, index, discovery order)
//!     → Vec<RouteNode>
//! ```
//!
//! # Design Decisions
//! - Pure function of the file list; no filesystem access here
//! - Priority is the two-digit ordinal `static exact` (11, 10, 1, 0) and only
//!   lives for the duration of the sort
//! - An index page yields to its equal-priority named siblings, so `/about`
//!   sorts ahead of `/`

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use crate::config::DiscoveryConfig;
use crate::error::{Result, RouteError};
use crate::routing::route::{ComponentRef, RouteNode};

const DEFAULT_INDEX: &str = "index";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Layout,
    Index,
    Page,
}

#[derive(Debug)]
struct PageFile {
    /// Normalised file path, e.g. `/blog/_layout`.
    id: String,
    /// Path relative to the pages directory, with extension.
    source: String,
    kind: FileKind,
    /// Route path before pattern conversion, e.g. `/blog/$slug`.
    route_path: String,
}

struct Ranked {
    priority: u8,
    is_index: bool,
    is_static: bool,
    node: RouteNode,
}

/// Strip the extension, use forward slashes and ensure a leading slash.
pub fn normalize_file_path(file: &str) -> String {
    let file = file.replace('\\', "/");
    let (dir, name) = match file.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, file.as_str()),
    };
    let stem = match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    };

    let joined = match dir {
        Some(dir) => format!("{}/{}", dir, stem),
        None => stem.to_string(),
    };
    if joined.starts_with('/') {
        joined
    } else {
        format!("/{}", joined)
    }
}

/// Collapse `/index` onto its directory and drop a trailing slash.
///
/// `/a/index` → `/a`, `/index` → `/`, `/a/` → `/a`, `/` → `/`.
pub fn normalize_route_path(path: &str) -> String {
    normalize_route_path_with(path, DEFAULT_INDEX)
}

pub fn normalize_route_path_with(path: &str, index_name: &str) -> String {
    let suffix = format!("/{}", index_name);
    let path = path.strip_suffix(suffix.as_str()).unwrap_or(path);
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Whether `file` (relative to the pages directory) is a page source.
///
/// Hidden files and files under hidden directories are never pages.
pub fn is_route_file(file: &str, config: &DiscoveryConfig) -> bool {
    let file = file.replace('\\', "/");
    if file.split('/').any(|segment| segment.starts_with('.')) {
        return false;
    }
    let name = file.rsplit('/').next().unwrap_or(&file);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => config.extensions.iter().any(|e| e == ext),
        _ => false,
    }
}

/// Build the route tree for `files`, given relative to the pages directory.
///
/// Files that are not page sources are skipped. Fails without producing a
/// partial tree when a directory holds more than one dynamic route.
pub fn build_routes<S: AsRef<str>>(files: &[S], config: &DiscoveryConfig) -> Result<Vec<RouteNode>> {
    let mut pages = Vec::with_capacity(files.len());
    for file in files {
        let file = file.as_ref();
        if !is_route_file(file, config) {
            tracing::debug!(file = %file, "Skipping non-page file");
            continue;
        }
        pages.push(classify(file, config));
    }

    // 1. Register layouts by the directory they wrap.
    let mut layouts: HashMap<String, usize> = HashMap::new();
    let mut shadowed = HashSet::new();
    for (index, page) in pages.iter().enumerate() {
        if page.kind != FileKind::Layout {
            continue;
        }
        if let Some(&first) = layouts.get(&page.route_path) {
            tracing::warn!(
                layout = %page.source,
                kept = %pages[first].source,
                "Duplicate layout in directory, ignoring"
            );
            shadowed.insert(index);
        } else {
            layouts.insert(page.route_path.clone(), index);
        }
    }

    // 2. Attach every file to its nearest ancestor layout.
    let mut children: HashMap<Option<String>, Vec<usize>> = HashMap::new();
    for (index, page) in pages.iter().enumerate() {
        if shadowed.contains(&index) {
            continue;
        }
        let start = match page.kind {
            FileKind::Layout => parent_dir(&page.route_path),
            _ => parent_dir(&page.id),
        };
        let parent = nearest_layout(start, &layouts);
        children.entry(parent).or_default().push(index);
    }

    // 3. Build and sort each level bottom-up.
    build_level(None, &pages, &children, config)
}

fn classify(file: &str, config: &DiscoveryConfig) -> PageFile {
    let id = normalize_file_path(file);
    let base = id.rsplit('/').next().unwrap_or_default();

    let (kind, route_path) = if base == config.layout_marker {
        (FileKind::Layout, parent_dir(&id).unwrap_or("/").to_string())
    } else {
        let kind = if base == config.index_name {
            FileKind::Index
        } else {
            FileKind::Page
        };
        (kind, normalize_route_path_with(&id, &config.index_name))
    };

    PageFile {
        source: id.trim_start_matches('/').to_string() + extension_of(file),
        id,
        kind,
        route_path,
    }
}

fn extension_of(file: &str) -> &str {
    let name = file.rsplit(['/', '\\']).next().unwrap_or(file);
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[dot..],
        _ => "",
    }
}

fn parent_dir(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rsplit_once('/') {
        Some(("", _)) => Some("/"),
        Some((dir, _)) => Some(dir),
        None => None,
    }
}

fn nearest_layout(mut dir: Option<&str>, layouts: &HashMap<String, usize>) -> Option<String> {
    while let Some(current) = dir {
        if layouts.contains_key(current) {
            return Some(current.to_string());
        }
        dir = parent_dir(current);
    }
    None
}

fn build_level(
    parent: Option<String>,
    pages: &[PageFile],
    children: &HashMap<Option<String>, Vec<usize>>,
    config: &DiscoveryConfig,
) -> Result<Vec<RouteNode>> {
    let Some(members) = children.get(&parent) else {
        return Ok(Vec::new());
    };

    let mut ranked = Vec::with_capacity(members.len());
    for &index in members {
        let page = &pages[index];
        let exact = page.kind != FileKind::Layout;
        let nested = if exact {
            Vec::new()
        } else {
            build_level(Some(page.route_path.clone()), pages, children, config)?
        };

        let is_static = is_static_path(&page.route_path, &config.dynamic_prefix);
        let component = ComponentRef::new(config.pages_dir.join(&page.source).to_string_lossy());
        let node = RouteNode::new(
            page.id.clone(),
            to_pattern(&page.route_path, &config.dynamic_prefix),
            exact,
            component,
        )
        .with_children(nested);

        ranked.push(Ranked {
            priority: priority(is_static, exact),
            is_index: page.kind == FileKind::Index,
            is_static,
            node,
        });
    }

    let dynamic: Vec<String> = ranked
        .iter()
        .filter(|r| !r.is_static)
        .map(|r| r.node.id.clone())
        .collect();
    if dynamic.len() > 1 {
        return Err(RouteError::MultipleDynamicRoutes {
            directory: parent.unwrap_or_else(|| "/".to_string()),
            routes: dynamic,
        });
    }

    // Stable: ties keep discovery order.
    ranked.sort_by_key(|r| (Reverse(r.priority), r.is_index));

    let mut seen = HashSet::new();
    for r in &ranked {
        if !seen.insert(r.node.path.as_str()) {
            tracing::warn!(path = %r.node.path, id = %r.node.id, "Duplicate route path among siblings");
        }
    }

    Ok(ranked.into_iter().map(|r| r.node).collect())
}

/// `"{static}{exact}"` read as a decimal number.
fn priority(is_static: bool, exact: bool) -> u8 {
    u8::from(is_static) * 10 + u8::from(exact)
}

fn is_static_path(route_path: &str, dynamic_prefix: &str) -> bool {
    match route_path.rsplit('/').next() {
        Some(last) if !last.is_empty() => !last.starts_with(dynamic_prefix),
        _ => true,
    }
}

/// `$name` → `:name`, `$$name` → `:name*`, `$` → `*`.
fn to_pattern(route_path: &str, dynamic_prefix: &str) -> String {
    if route_path == "/" {
        return "/".to_string();
    }
    let segments: Vec<String> = route_path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| match segment.strip_prefix(dynamic_prefix) {
            None => segment.to_string(),
            Some("") => "*".to_string(),
            Some(rest) => match rest.strip_prefix(dynamic_prefix) {
                Some("") => "*".to_string(),
                Some(name) => format!(":{}*", name),
                None => format!(":{}", rest),
            },
        })
        .collect();
    format!("/{}", segments.join("/"))
}
