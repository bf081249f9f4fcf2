//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (on load and on every tree update):
//!     RouteNode[] (from discovery or hand-written)
//!     → matcher.rs (join child patterns onto parents)
//!     → pattern.rs (compile segments)
//!     → Freeze as immutable RouteTable
//!
//! Navigation:
//!     Router::push / replace / go
//!     → history (blockers, commit)
//!     → listener → RouteTable::match_routes(pathname)
//!     → CurrentRoute swapped in → after-each listeners
//! ```
//!
//! # Design Decisions
//! - Tables are immutable; an update swaps in a new one
//! - No regex in the matching path
//! - Deterministic: siblings are tried in tree order, first match wins

pub mod matcher;
pub mod pattern;
pub mod route;
pub mod router;

pub use matcher::{match_routes, RouteTable};
pub use pattern::{match_path, PathMatch, PathPattern};
pub use route::{ComponentRef, ParamValue, Params, RouteMatch, RouteNode};
pub use router::{AfterEachFn, CurrentRoute, Phase, Resolved, Router};
