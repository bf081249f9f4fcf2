//! Router: a history plus a route table.
//!
//! # Responsibilities
//! - Resolve navigation targets to paths, hrefs and matched routes
//! - Forward push / replace / go / block to the history
//! - Keep the current route in sync with every committed location
//! - Notify after-each listeners once per committed navigation
//!
//! # State Transitions
//! ```text
//! Idle ──push/replace/go──▶ Resolving ──all blockers proceed──▶ Committing ──▶ Idle
//!                                │
//!                                └─ a blocker holds ──▶ Blocked
//!                                                         │
//!                            retry ──▶ Committing ──▶ Idle ┘
//! ```
//!
//! # Design Decisions
//! - The current route is an `Arc` snapshot swapped atomically; readers never lock
//! - The route table can be replaced at runtime; the current location is re-matched
//!   without notifying after-each listeners
//! - A pathname with no matching route still commits, with an empty match chain

use std::fmt;
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde_json::Value;

use crate::history::registry::Registry;
use crate::history::{
    resolve_path, Action, BlockerFn, History, Location, Navigation, PartialPath, Path, Transition,
    Unsubscribe, Update, Verdict,
};
use crate::observability::metrics;
use crate::routing::matcher::RouteTable;
use crate::routing::route::{Params, RouteMatch, RouteNode};

/// Where the router is in a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Resolving,
    /// A blocker holds the last proposed transition.
    Blocked,
    Committing,
}

/// The committed location and the routes it matched.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentRoute {
    pub action: Action,
    pub location: Location,
    /// Matched chain, root first. Empty when no route matched.
    pub matches: Vec<RouteMatch>,
    /// Parameters of the deepest match.
    pub params: Params,
}

impl CurrentRoute {
    fn new(action: Action, location: Location, matches: Vec<RouteMatch>) -> Self {
        let params = matches.last().map(|m| m.params.clone()).unwrap_or_default();
        Self {
            action,
            location,
            matches,
            params,
        }
    }

    pub fn is_matched(&self) -> bool {
        !self.matches.is_empty()
    }

    /// The deepest matched route.
    pub fn leaf(&self) -> Option<&RouteNode> {
        self.matches.last().map(|m| &m.route)
    }
}

/// Result of [`Router::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub path: Path,
    /// Href as the underlying history would write it.
    pub href: String,
    pub matches: Vec<RouteMatch>,
}

/// Callback invoked after every committed navigation.
pub type AfterEachFn = dyn Fn(&CurrentRoute) + Send + Sync;

struct Inner {
    history: Arc<dyn History>,
    table: ArcSwap<RouteTable>,
    current: ArcSwap<CurrentRoute>,
    after_each: Registry<AfterEachFn>,
    phase: Mutex<Phase>,
    unlisten: Unsubscribe,
}

impl Inner {
    fn commit(&self, update: &Update) {
        self.set_phase(Phase::Committing);

        let matches = self.table.load().match_routes(&update.location.pathname);
        if matches.is_empty() {
            tracing::debug!(pathname = %update.location.pathname, "No route matched");
        }
        let current = Arc::new(CurrentRoute::new(update.action, update.location.clone(), matches));
        self.current.store(current.clone());
        self.set_phase(Phase::Idle);

        tracing::debug!(
            action = update.action.as_str(),
            pathname = %current.location.pathname,
            key = %current.location.key,
            "Navigation committed"
        );

        for (_, listener) in self.after_each.snapshot() {
            listener(&current);
        }
    }

    fn set_phase(&self, phase: Phase) {
        *self.phase.lock() = phase;
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.unlisten.unsubscribe();
    }
}

/// Routes locations of a [`History`] through a route table.
///
/// Cloning is cheap; clones share state.
#[derive(Clone)]
pub struct Router {
    inner: Arc<Inner>,
}

impl Router {
    pub fn new(history: Arc<dyn History>, routes: Vec<RouteNode>) -> Self {
        let table = RouteTable::new(routes);
        let location = history.location();
        let current = CurrentRoute::new(
            history.action(),
            location.clone(),
            table.match_routes(&location.pathname),
        );

        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let weak = weak.clone();
            let unlisten = history.listen(Box::new(move |update| {
                if let Some(inner) = weak.upgrade() {
                    inner.commit(update);
                }
            }));

            Inner {
                history: history.clone(),
                table: ArcSwap::from_pointee(table),
                current: ArcSwap::from_pointee(current),
                after_each: Registry::new(),
                phase: Mutex::new(Phase::Idle),
                unlisten,
            }
        });

        tracing::info!(
            routes = inner.table.load().routes().len(),
            pathname = %location.pathname,
            "Router initialized"
        );

        Self { inner }
    }

    pub fn history(&self) -> &Arc<dyn History> {
        &self.inner.history
    }

    /// Snapshot of the committed route.
    pub fn current(&self) -> Arc<CurrentRoute> {
        self.inner.current.load_full()
    }

    /// Snapshot of the active route tree.
    pub fn routes(&self) -> Arc<Vec<RouteNode>> {
        self.inner.table.load().routes().clone()
    }

    /// Where the router is in a navigation.
    ///
    /// A transition held by a blocker reports `Blocked` whether the router
    /// or the platform (an external back/forward) proposed it.
    pub fn phase(&self) -> Phase {
        let phase = *self.inner.phase.lock();
        let holding = self.inner.history.is_holding();
        match phase {
            Phase::Idle if holding => Phase::Blocked,
            Phase::Blocked if !holding => Phase::Idle,
            phase => phase,
        }
    }

    /// Resolve `to` against `from` (default: the current pathname).
    pub fn resolve(&self, to: impl Into<PartialPath>, from: Option<&str>) -> Resolved {
        let current = self.current();
        let from = from.unwrap_or(&current.location.pathname);
        let path = resolve_path(&to.into(), from);

        Resolved {
            href: self.inner.history.create_href(&path),
            matches: self.inner.table.load().match_routes(&path.pathname),
            path,
        }
    }

    pub fn push(&self, to: impl Into<PartialPath>, state: Value) -> Navigation {
        self.navigate(Action::Push, to.into(), state)
    }

    pub fn replace(&self, to: impl Into<PartialPath>, state: Value) -> Navigation {
        self.navigate(Action::Replace, to.into(), state)
    }

    /// Move through the history. Out-of-range moves change nothing and are
    /// not counted as navigations.
    pub fn go(&self, delta: isize) {
        self.inner.set_phase(Phase::Resolving);
        if self.inner.history.go(delta) {
            self.settle(Action::Pop);
        } else {
            self.inner.set_phase(Phase::Idle);
            tracing::debug!(delta, "Ignoring out-of-range go");
        }
    }

    pub fn back(&self) {
        self.go(-1);
    }

    pub fn forward(&self) {
        self.go(1);
    }

    pub fn block(&self, blocker: impl Fn(&Transition) -> Verdict + Send + Sync + 'static) -> Unsubscribe {
        let blocker: Box<BlockerFn> = Box::new(blocker);
        self.inner.history.block(blocker)
    }

    /// Register a listener for committed navigations.
    pub fn after_each(&self, listener: impl Fn(&CurrentRoute) + Send + Sync + 'static) -> Unsubscribe {
        let listener: Arc<AfterEachFn> = Arc::new(listener);
        self.inner.after_each.add(listener).1
    }

    /// Swap the route table and re-match the current location.
    pub fn replace_routes(&self, routes: Vec<RouteNode>) {
        let table = RouteTable::new(routes);
        let count = table.routes().len();
        self.inner.table.store(Arc::new(table));

        let previous = self.current();
        let matches = self.inner.table.load().match_routes(&previous.location.pathname);
        self.inner.current.store(Arc::new(CurrentRoute::new(
            previous.action,
            previous.location.clone(),
            matches,
        )));

        tracing::info!(routes = count, "Route table replaced");
    }

    fn navigate(&self, action: Action, to: PartialPath, state: Value) -> Navigation {
        self.inner.set_phase(Phase::Resolving);

        let path = self.resolve(to, None).path;
        let outcome = match action {
            Action::Replace => self.inner.history.replace(path.into(), state),
            _ => self.inner.history.push(path.into(), state),
        };

        self.settle(action);
        outcome
    }

    fn settle(&self, action: Action) {
        let outcome = if self.inner.history.is_holding() {
            self.inner.set_phase(Phase::Blocked);
            tracing::debug!(action = action.as_str(), "Navigation held by blocker");
            Navigation::Blocked
        } else {
            self.inner.set_phase(Phase::Idle);
            Navigation::Committed
        };
        metrics::record_navigation(action, outcome);
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("current", &self.current().location.pathname)
            .field("phase", &self.phase())
            .finish()
    }
}
