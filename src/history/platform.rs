//! Platform location primitive consumed by the browser and hash backends.
//!
//! # Responsibilities
//! - Expose the current document URL and the state stored with the entry
//! - Push / replace entries and move through them
//! - Report back/forward moves through a pop handler
//!
//! # Design Decisions
//! - The trait mirrors a browser's `history` object so a real window binding
//!   can implement it outside this crate
//! - [`InMemoryPlatform`] fires the pop handler synchronously from `go`,
//!   which is the strictest ordering a backend has to cope with

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use url::Url;

/// Callback run after the platform moved to another entry.
pub type PopHandler = Arc<dyn Fn() + Send + Sync>;

/// A platform location/history primitive.
pub trait Platform: Send + Sync {
    /// Full URL of the current entry.
    fn url(&self) -> Url;

    /// State stored with the current entry.
    fn state(&self) -> Option<Value>;

    /// Add an entry; `href` is resolved against the current URL.
    fn push_state(&self, state: Value, href: &str);

    /// Overwrite the current entry.
    fn replace_state(&self, state: Value, href: &str);

    /// Move by `delta` entries. Out-of-range moves are ignored and return false.
    fn go(&self, delta: isize) -> bool;

    /// Install (or clear) the handler for back/forward moves.
    fn set_pop_handler(&self, handler: Option<PopHandler>);
}

#[derive(Debug, Clone)]
struct Entry {
    url: Url,
    state: Option<Value>,
}

#[derive(Debug)]
struct Entries {
    stack: Vec<Entry>,
    index: usize,
}

/// Process-local platform: an entry stack behaving like a browser tab.
pub struct InMemoryPlatform {
    entries: Mutex<Entries>,
    pop_handler: Mutex<Option<PopHandler>>,
}

impl InMemoryPlatform {
    pub fn new(url: Url) -> Self {
        Self {
            entries: Mutex::new(Entries {
                stack: vec![Entry { url, state: None }],
                index: 0,
            }),
            pop_handler: Mutex::new(None),
        }
    }

    pub fn parse(url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(url)?))
    }

    /// Number of entries in the tab.
    pub fn len(&self) -> usize {
        self.entries.lock().stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().stack.is_empty()
    }

    pub fn index(&self) -> usize {
        self.entries.lock().index
    }

    fn resolve(current: &Url, href: &str) -> Url {
        match current.join(href) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(href = %href, error = %e, "Unresolvable href, keeping current URL");
                current.clone()
            }
        }
    }
}

impl Platform for InMemoryPlatform {
    fn url(&self) -> Url {
        let entries = self.entries.lock();
        entries.stack[entries.index].url.clone()
    }

    fn state(&self) -> Option<Value> {
        let entries = self.entries.lock();
        entries.stack[entries.index].state.clone()
    }

    fn push_state(&self, state: Value, href: &str) {
        let mut entries = self.entries.lock();
        let index = entries.index;
        let url = Self::resolve(&entries.stack[index].url, href);
        entries.stack.truncate(index + 1);
        entries.stack.push(Entry {
            url,
            state: Some(state),
        });
        entries.index = index + 1;
    }

    fn replace_state(&self, state: Value, href: &str) {
        let mut entries = self.entries.lock();
        let index = entries.index;
        let url = Self::resolve(&entries.stack[index].url, href);
        entries.stack[index] = Entry {
            url,
            state: Some(state),
        };
    }

    fn go(&self, delta: isize) -> bool {
        {
            let mut entries = self.entries.lock();
            let Some(target) = step_index(entries.index, delta, entries.stack.len()) else {
                return false;
            };
            entries.index = target;
        }

        let handler = self.pop_handler.lock().clone();
        if let Some(handler) = handler {
            handler();
        }
        true
    }

    fn set_pop_handler(&self, handler: Option<PopHandler>) {
        *self.pop_handler.lock() = handler;
    }
}

/// `index + delta` when it lands on another entry of a `len`-long stack.
pub(crate) fn step_index(index: usize, delta: isize, len: usize) -> Option<usize> {
    if delta == 0 {
        return None;
    }
    let target = isize::try_from(index).ok()?.checked_add(delta)?;
    usize::try_from(target).ok().filter(|&target| target < len)
}
