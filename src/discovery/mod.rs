//! Route discovery subsystem.
//!
//! # Data Flow
//! ```text
//! pages_dir
//!     → scan.rs (walk, filter page sources)
//!     → tree.rs (normalise, nest, sort, validate)
//!     → Vec<RouteNode>
//!
//! Live updates:
//!     watcher.rs (notify) → rebuild from scratch → subscribers
//!                         └→ failures → error listeners
//! ```
//!
//! # Design Decisions
//! - Every rebuild is a full scan; there is no incremental diffing
//! - The watcher starts with the first subscriber
//! - Route updates and watch failures never share a channel

pub mod scan;
pub mod tree;
pub mod watcher;

use std::sync::{Arc, Weak};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use crate::config::{DiscoveryConfig, WatchConfig};
use crate::error::{Result, WatchError};
use crate::history::registry::Registry;
use crate::history::Unsubscribe;
use crate::routing::route::RouteNode;

pub use scan::{discover, scan_pages};
pub use tree::{build_routes, is_route_file, normalize_file_path, normalize_route_path};
pub use watcher::RouteWatcher;

/// Receives each new route tree.
pub type RoutesListener = dyn Fn(&Arc<Vec<RouteNode>>) + Send + Sync;

/// Receives watch failures.
pub type WatchErrorListener = dyn Fn(&WatchError) + Send + Sync;

struct Shared {
    discovery: DiscoveryConfig,
    watch: WatchConfig,
    latest: ArcSwapOption<Vec<RouteNode>>,
    listeners: Registry<RoutesListener>,
    error_listeners: Registry<WatchErrorListener>,
    watcher: Mutex<Option<RouteWatcher>>,
}

impl Shared {
    fn publish(&self, routes: Arc<Vec<RouteNode>>) {
        self.latest.store(Some(routes.clone()));
        for (_, listener) in self.listeners.snapshot() {
            listener(&routes);
        }
    }

    fn fail(&self, error: WatchError) {
        for (_, listener) in self.error_listeners.snapshot() {
            listener(&error);
        }
    }
}

/// Route trees for one pages directory, on demand or live.
#[derive(Clone)]
pub struct RouteDiscovery {
    shared: Arc<Shared>,
}

impl RouteDiscovery {
    pub fn new(discovery: DiscoveryConfig, watch: WatchConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                discovery,
                watch,
                latest: ArcSwapOption::empty(),
                listeners: Registry::new(),
                error_listeners: Registry::new(),
                watcher: Mutex::new(None),
            }),
        }
    }

    /// The current route tree.
    ///
    /// While watching this is the last published tree; otherwise the pages
    /// directory is scanned now.
    pub fn get_routes(&self) -> Result<Arc<Vec<RouteNode>>> {
        if self.is_watching() {
            if let Some(routes) = self.shared.latest.load_full() {
                return Ok(routes);
            }
        }
        Ok(Arc::new(discover(&self.shared.discovery)?))
    }

    /// Register for route tree updates, starting the watcher if needed.
    ///
    /// The listener is called with the current tree before this returns.
    pub fn subscribe(
        &self,
        listener: impl Fn(&Arc<Vec<RouteNode>>) + Send + Sync + 'static,
    ) -> Result<Unsubscribe, WatchError> {
        let listener: Arc<RoutesListener> = Arc::new(listener);
        let (_, unsubscribe) = self.shared.listeners.add(listener.clone());

        if self.is_watching() {
            if let Some(routes) = self.shared.latest.load_full() {
                listener(&routes);
            }
            return Ok(unsubscribe);
        }

        // The initial tree reaches every listener, this one included, inside start.
        let started = match self.start_watcher() {
            Ok(started) => started,
            Err(e) => {
                unsubscribe.unsubscribe();
                return Err(e);
            }
        };

        let mut slot = self.shared.watcher.lock();
        if slot.is_none() {
            *slot = Some(started);
        } else {
            drop(slot);
            tracing::debug!("Concurrent subscribe already started a watcher");
            started.stop();
        }
        Ok(unsubscribe)
    }

    /// Register for watch failures.
    pub fn on_error(&self, listener: impl Fn(&WatchError) + Send + Sync + 'static) -> Unsubscribe {
        let listener: Arc<WatchErrorListener> = Arc::new(listener);
        self.shared.error_listeners.add(listener).1
    }

    pub fn is_watching(&self) -> bool {
        self.shared.watcher.lock().is_some()
    }

    /// Stop the watcher. Subscribers stay registered and are fed again on
    /// the next `subscribe`. Must not be called from a route listener.
    pub fn stop(&self) {
        let watcher = self.shared.watcher.lock().take();
        if let Some(watcher) = watcher {
            watcher.stop();
        }
        self.shared.latest.store(None);
    }

    fn start_watcher(&self) -> Result<RouteWatcher, WatchError> {
        let on_routes: Weak<Shared> = Arc::downgrade(&self.shared);
        let on_error = on_routes.clone();

        RouteWatcher::start(
            self.shared.discovery.clone(),
            &self.shared.watch,
            Box::new(move |routes| {
                if let Some(shared) = on_routes.upgrade() {
                    shared.publish(routes);
                }
            }),
            Box::new(move |error| {
                if let Some(shared) = on_error.upgrade() {
                    shared.fail(error);
                }
            }),
        )
    }
}
