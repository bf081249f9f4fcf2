//! History subsystem: location sources, their mutations and the blocking pipeline.
//!
//! # Data Flow
//! ```text
//! push / replace / go
//!     → blocking.rs (blockers in registration order, veto / retry)
//!     → commit into the backend
//!         memory.rs   explicit stack + cursor
//!         browser.rs  platform URL path        ─┐
//!         hash.rs     platform URL fragment    ─┴─ platform.rs (external primitive)
//!     → registry.rs (listeners notified synchronously)
//!
//! External back/forward (platform pop):
//!     platform.rs pop handler → blocking.rs → commit or revert
//! ```
//!
//! # Design Decisions
//! - All backends share one contract ([`History`]); the router never knows which it has
//! - A held transition is never written to the backend
//! - A newer proposal supersedes a held one; there is no queue

pub mod blocking;
pub mod browser;
pub mod hash;
pub mod location;
pub mod memory;
pub mod path;
pub mod platform;
pub mod registry;

use std::sync::Arc;

use serde_json::Value;

use crate::config::{HistoryConfig, HistoryMode};

pub use blocking::{BlockerFn, Transition, Verdict};
pub use browser::{BrowserHistory, PlatformHistory};
pub use hash::HashHistory;
pub use location::{Action, Location, DEFAULT_KEY};
pub use memory::MemoryHistory;
pub use path::{create_path, parse_path, resolve_path, PartialPath, Path};
pub use platform::{InMemoryPlatform, Platform};
pub use registry::Unsubscribe;

/// A committed change, as seen by listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub action: Action,
    pub location: Location,
}

/// Callback invoked after every committed change.
pub type ListenerFn = dyn Fn(&Update) + Send + Sync;

/// Result of a `push` or `replace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Committed,
    /// A blocker held the transition; the location did not change.
    Blocked,
}

/// Contract shared by the browser, hash and memory backends.
pub trait History: Send + Sync {
    /// The current location.
    fn location(&self) -> Location;

    /// The action that produced the current location.
    fn action(&self) -> Action;

    fn listen(&self, listener: Box<ListenerFn>) -> Unsubscribe;

    /// Add a new entry. A missing pathname in `to` reuses the current one.
    fn push(&self, to: PartialPath, state: Value) -> Navigation;

    /// Overwrite the current entry.
    fn replace(&self, to: PartialPath, state: Value) -> Navigation;

    /// Move the cursor by `delta`.
    ///
    /// Out-of-range moves are ignored and return false; otherwise the move
    /// was proposed, though a blocker may still hold it.
    fn go(&self, delta: isize) -> bool;

    fn back(&self) -> bool {
        self.go(-1)
    }

    fn forward(&self) -> bool {
        self.go(1)
    }

    fn block(&self, blocker: Box<BlockerFn>) -> Unsubscribe;

    /// The href this backend would write for `to`.
    fn create_href(&self, to: &Path) -> String;

    /// Whether a transition is currently held by a blocker.
    fn is_holding(&self) -> bool;
}

/// Build the backend selected by `config`.
pub fn create_history(config: &HistoryConfig) -> Result<Arc<dyn History>, url::ParseError> {
    let history: Arc<dyn History> = match config.mode {
        HistoryMode::Browser => {
            let platform = Arc::new(InMemoryPlatform::parse(&config.base_url)?);
            Arc::new(BrowserHistory::new(platform))
        }
        HistoryMode::Hash => {
            let platform = Arc::new(InMemoryPlatform::parse(&config.base_url)?);
            Arc::new(HashHistory::new(platform))
        }
        HistoryMode::Memory => Arc::new(MemoryHistory::new(
            config.initial_entries.iter().map(PartialPath::from),
            None,
        )),
    };
    tracing::debug!(mode = ?config.mode, "History backend created");
    Ok(history)
}

pub(crate) fn notify(listeners: &registry::Registry<ListenerFn>, update: &Update) {
    for (_, listener) in listeners.snapshot() {
        listener(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_history_from_config() {
        let mut config = HistoryConfig::default();
        config.base_url = "http://localhost/start?x=1".into();
        let browser = create_history(&config).unwrap();
        assert_eq!(browser.location().pathname, "/start");
        assert_eq!(browser.location().search, "?x=1");

        config.mode = HistoryMode::Memory;
        config.initial_entries = vec!["/a".into(), "/b".into()];
        let memory = create_history(&config).unwrap();
        assert_eq!(memory.location().pathname, "/b");
    }
}
