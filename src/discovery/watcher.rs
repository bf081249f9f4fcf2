//! Pages directory watcher for live route updates.
//!
//! # Responsibilities
//! - Emit the initial route tree synchronously on start
//! - Rebuild the whole tree after each burst of file-system changes
//! - Report watch and rebuild failures on a separate error callback
//!
//! # Data Flow
//! ```text
//! notify backend thread ──events──▶ mpsc ──▶ worker thread
//!                                             wait for first event
//!                                             sleep debounce, drain the rest
//!                                             discover() ──▶ on_routes | on_error
//! ```
//!
//! # Design Decisions
//! - Some backends never report the files already present at shallow depth,
//!   so the first tree is always computed by a scan
//! - The watch is registered before that scan; a page created in between is
//!   either in the first tree or triggers a rebuild
//! - One worker: events arriving during a rebuild are coalesced into the next one
//! - A failed rebuild keeps the previous tree live

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::{DiscoveryConfig, WatchConfig};
use crate::discovery::scan::discover;
use crate::error::{RouteError, WatchError};
use crate::observability::metrics;
use crate::routing::route::RouteNode;

/// Receives every newly built tree.
pub type RoutesCallback = Box<dyn Fn(Arc<Vec<RouteNode>>) + Send>;

/// Receives watch and rebuild failures.
pub type ErrorCallback = Box<dyn Fn(WatchError) + Send>;

/// A running watch over the pages directory. Dropping it stops watching.
pub struct RouteWatcher {
    path: PathBuf,
    watcher: Option<RecommendedWatcher>,
    worker: Option<JoinHandle<()>>,
}

impl RouteWatcher {
    /// Start watching, then build the initial tree and hand it to `on_routes`.
    ///
    /// Fails if the backend cannot watch the directory or the initial tree
    /// cannot be built; nothing is emitted in that case.
    pub fn start(
        discovery: DiscoveryConfig,
        watch: &WatchConfig,
        on_routes: RoutesCallback,
        on_error: ErrorCallback,
    ) -> Result<Self, WatchError> {
        if !discovery.pages_dir.is_dir() {
            let dir = discovery.pages_dir.display().to_string();
            return Err(RouteError::MissingPagesDir(dir).into());
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = event_tx.send(res);
            },
            Config::default().with_poll_interval(Duration::from_millis(watch.poll_interval_ms)),
        )?;
        watcher.watch(&discovery.pages_dir, RecursiveMode::Recursive)?;

        let initial = Arc::new(discover(&discovery)?);
        on_routes(initial);

        let path = discovery.pages_dir.clone();
        let debounce = Duration::from_millis(watch.debounce_ms);
        let worker = std::thread::Builder::new()
            .name("route-watcher".to_string())
            .spawn(move || run_worker(discovery, debounce, event_rx, on_routes, on_error))?;

        tracing::info!(path = ?path, "Route watcher started");
        Ok(Self {
            path,
            watcher: Some(watcher),
            worker: Some(worker),
        })
    }

    /// Stop watching and wait for an in-flight rebuild to finish.
    ///
    /// Must not be called from inside one of the watcher's own callbacks.
    pub fn stop(mut self) {
        self.watcher.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!(path = ?self.path, "Route watcher worker panicked");
            }
        }
    }
}

impl Drop for RouteWatcher {
    fn drop(&mut self) {
        // Dropping the backend closes the channel; the worker exits on its own.
        if self.watcher.take().is_some() {
            tracing::info!(path = ?self.path, "Route watcher stopped");
        }
    }
}

fn run_worker(
    discovery: DiscoveryConfig,
    debounce: Duration,
    mut events: mpsc::UnboundedReceiver<notify::Result<Event>>,
    on_routes: RoutesCallback,
    on_error: ErrorCallback,
) {
    while let Some(first) = events.blocking_recv() {
        let mut batch = vec![first];
        if !debounce.is_zero() {
            std::thread::sleep(debounce);
        }
        while let Ok(next) = events.try_recv() {
            batch.push(next);
        }

        let mut changed = false;
        for res in batch {
            match res {
                Ok(event) => changed |= affects_routes(&event),
                Err(e) => {
                    tracing::error!(error = %e, "Watch error");
                    on_error(WatchError::Notify(e));
                }
            }
        }
        if !changed {
            continue;
        }

        metrics::record_watch_event();
        match discover(&discovery) {
            Ok(routes) => on_routes(Arc::new(routes)),
            Err(e) => {
                tracing::warn!(error = %e, "Rebuild failed, keeping previous routes");
                on_error(WatchError::Rebuild(e));
            }
        }
    }
    tracing::debug!("Route watcher worker exiting");
}

/// Adds, removes and renames change the tree; content edits do not.
fn affects_routes(event: &Event) -> bool {
    match event.kind {
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Any | EventKind::Other => true,
        EventKind::Modify(ModifyKind::Name(_)) | EventKind::Modify(ModifyKind::Any) => true,
        EventKind::Modify(_) | EventKind::Access(_) => false,
    }
}
