//! Metrics collection.
//!
//! # Metrics
//! - `router_navigations_total` (counter): navigations by `action` and `outcome`
//! - `route_tree_builds_total` (counter): route tree builds by `outcome`
//! - `route_watch_events_total` (counter): coalesced watcher rebuilds
//!
//! # Design Decisions
//! - Label values are static strings to keep cardinality bounded

use crate::history::{Action, Navigation};

pub fn record_navigation(action: Action, outcome: Navigation) {
    let outcome = match outcome {
        Navigation::Committed => "committed",
        Navigation::Blocked => "blocked",
    };
    ::metrics::counter!(
        "router_navigations_total",
        "action" => action.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_tree_build(ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    ::metrics::counter!("route_tree_builds_total", "outcome" => outcome).increment(1);
}

pub fn record_watch_event() {
    ::metrics::counter!("route_watch_events_total").increment(1);
}
