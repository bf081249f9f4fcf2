//! Error types shared across subsystems.
//!
//! # Design Decisions
//! - Only configuration problems are errors. A navigation that matches no
//!   route, or a transition held by a blocker, is ordinary control flow.
//! - Watch failures travel on their own channel (see `discovery::watcher`)
//!   and never reach route-change subscribers.

use thiserror::Error;

/// Fatal errors raised while building a route tree.
#[derive(Debug, Error)]
pub enum RouteError {
    /// More than one dynamic route among the siblings of one directory.
    #[error("multiple dynamic routes under {directory}: {}", routes.join(", "))]
    MultipleDynamicRoutes {
        directory: String,
        routes: Vec<String>,
    },

    /// The pages directory could not be walked.
    #[error("failed to scan pages directory: {0}")]
    Scan(#[from] ignore::Error),

    #[error("pages directory {0} does not exist")]
    MissingPagesDir(String),
}

/// Errors surfaced by the route watcher, separately from route updates.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("file watcher failed: {0}")]
    Notify(#[from] notify::Error),

    /// A rebuild after a file-system change was rejected; the previous tree stays live.
    #[error("route rebuild failed: {0}")]
    Rebuild(#[from] RouteError),

    #[error("failed to start watch worker: {0}")]
    Worker(#[from] std::io::Error),
}

pub type Result<T, E = RouteError> = std::result::Result<T, E>;
