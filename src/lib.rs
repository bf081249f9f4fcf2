//! File-system page router: route discovery, path matching and navigation history.

pub mod config;
pub mod discovery;
pub mod error;
pub mod history;
pub mod observability;
pub mod routing;

pub use config::schema::RouterConfig;
pub use discovery::RouteDiscovery;
pub use error::{RouteError, WatchError};
pub use history::{create_history, History};
pub use routing::{RouteNode, Router};
