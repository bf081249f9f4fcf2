//! Route tree matching.
//!
//! # Responsibilities
//! - Compile every node of a route tree into a [`PathPattern`]
//! - Resolve a pathname to the chain of matched routes, root first
//!
//! # Design Decisions
//! - Siblings are tried in tree order; the first that matches wins
//! - A route with children matches only through one of them, unless it is
//!   exact and the pathname ends at its own pattern
//! - A childless route matches as a prefix unless it is exact
//! - Path matching is case-sensitive

use std::sync::Arc;

use crate::routing::pattern::{PathMatch, PathPattern};
use crate::routing::route::{Params, RouteMatch, RouteNode};

#[derive(Debug, Clone)]
struct CompiledRoute {
    pattern: PathPattern,
    route: RouteNode,
    children: Vec<CompiledRoute>,
}

impl CompiledRoute {
    fn compile(route: &RouteNode, parent: &str) -> Self {
        let full = join_patterns(parent, &route.path);
        Self {
            children: route
                .children
                .iter()
                .map(|child| CompiledRoute::compile(child, &full))
                .collect(),
            pattern: PathPattern::compile(&full),
            route: route.clone(),
        }
    }
}

/// A route tree compiled for matching. Immutable once built.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Arc<Vec<RouteNode>>,
    compiled: Vec<CompiledRoute>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteNode>) -> Self {
        let compiled = routes.iter().map(|r| CompiledRoute::compile(r, "/")).collect();
        Self {
            routes: Arc::new(routes),
            compiled,
        }
    }

    pub fn routes(&self) -> &Arc<Vec<RouteNode>> {
        &self.routes
    }

    /// Matched chain for `pathname`; empty when nothing matches.
    pub fn match_routes(&self, pathname: &str) -> Vec<RouteMatch> {
        match_level(&self.compiled, pathname, &Params::new()).unwrap_or_default()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

fn match_level(routes: &[CompiledRoute], pathname: &str, inherited: &Params) -> Option<Vec<RouteMatch>> {
    for compiled in routes {
        if let Some(chain) = match_route(compiled, pathname, inherited) {
            return Some(chain);
        }
    }
    None
}

fn match_route(compiled: &CompiledRoute, pathname: &str, inherited: &Params) -> Option<Vec<RouteMatch>> {
    let route = &compiled.route;

    let level = |matched: PathMatch| {
        let mut params = inherited.clone();
        params.extend(matched.params);
        RouteMatch {
            route: route.clone(),
            pathname: matched.pathname,
            params,
        }
    };

    if compiled.children.is_empty() {
        let matched = if route.exact {
            compiled.pattern.match_exact(pathname)
        } else {
            compiled.pattern.match_prefix(pathname)
        }?;
        return Some(vec![level(matched)]);
    }

    let head = level(compiled.pattern.match_prefix(pathname)?);
    if let Some(tail) = match_level(&compiled.children, pathname, &head.params) {
        let mut chain = Vec::with_capacity(tail.len() + 1);
        chain.push(head);
        chain.extend(tail);
        return Some(chain);
    }

    if route.exact {
        return compiled.pattern.match_exact(pathname).map(|m| vec![level(m)]);
    }
    None
}

/// Absolute child patterns stand alone; relative ones extend the parent.
fn join_patterns(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        child.to_string()
    } else if child.is_empty() {
        parent.to_string()
    } else {
        format!("{}/{}", parent.trim_end_matches('/'), child)
    }
}

/// Match `pathname` against `routes`, returning the chain root first.
///
/// Compiles the tree on every call; hold a [`RouteTable`] for repeated lookups.
pub fn match_routes(routes: &[RouteNode], pathname: &str) -> Vec<RouteMatch> {
    RouteTable::new(routes.to_vec()).match_routes(pathname)
}
