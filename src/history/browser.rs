//! History over a platform location primitive.
//!
//! # Responsibilities
//! - Mirror the platform's current entry as a [`Location`]
//! - Write pushes/replaces through to the platform with `{usr, key, idx}` state
//! - Replay platform back/forward moves through the blocker pipeline
//!
//! # Design Decisions
//! - Where the location lives inside the URL is a [`UrlScheme`]: the path for
//!   the browser backend, the fragment for the hash backend
//! - A held pop has already happened on the platform, so it is reverted by
//!   moving the inverse delta; the pop caused by that revert is swallowed
//! - Retrying a held pop replays the original delta and skips the blocker
//!   that held it when the pop arrives

use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::history::blocking::{BlockerFn, Blockers, Transition};
use crate::history::location::{Action, Location, DEFAULT_KEY};
use crate::history::path::{create_path, PartialPath, Path};
use crate::history::platform::Platform;
use crate::history::registry::{EntryId, Registry, Unsubscribe};
use crate::history::{notify, History, ListenerFn, Navigation, Update};

/// Where a location is encoded inside the platform URL.
pub trait UrlScheme: Send + Sync + 'static {
    /// Path represented by `url`.
    fn read(url: &Url) -> Path;

    /// Href handed to the platform for `path`.
    fn href(path: &Path) -> String;
}

/// Location in the URL path, query and fragment.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathScheme;

impl UrlScheme for PathScheme {
    fn read(url: &Url) -> Path {
        Path {
            pathname: url.path().to_string(),
            search: url
                .query()
                .filter(|q| !q.is_empty())
                .map(|q| format!("?{}", q))
                .unwrap_or_default(),
            hash: url
                .fragment()
                .filter(|f| !f.is_empty())
                .map(|f| format!("#{}", f))
                .unwrap_or_default(),
        }
    }

    fn href(path: &Path) -> String {
        create_path(&path.into())
    }
}

/// Backend reading and writing the platform URL path.
pub type BrowserHistory = PlatformHistory<PathScheme>;

/// State persisted with each platform entry.
#[derive(Debug, Serialize, Deserialize)]
struct StoredState {
    usr: Value,
    key: String,
    idx: usize,
}

impl StoredState {
    fn for_location(location: &Location, idx: usize) -> Value {
        serde_json::json!({
            "usr": location.state,
            "key": location.key,
            "idx": idx,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Bypass {
    seq: u64,
    after: EntryId,
    target: usize,
}

struct State {
    action: Action,
    location: Location,
    index: usize,
    reverting: bool,
    bypass: Option<Bypass>,
}

struct Shared<S> {
    platform: Arc<dyn Platform>,
    state: Mutex<State>,
    listeners: Registry<ListenerFn>,
    blockers: Blockers,
    _scheme: PhantomData<fn() -> S>,
}

enum Step {
    Push(Location),
    Replace(Location),
}

/// History backed by a [`Platform`], generic over the URL encoding.
pub struct PlatformHistory<S: UrlScheme> {
    shared: Arc<Shared<S>>,
}

impl<S: UrlScheme> Clone for PlatformHistory<S> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<S: UrlScheme> PlatformHistory<S> {
    /// Attach to `platform`, taking over its pop handler.
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        let (location, index) = read_entry::<S>(platform.as_ref());
        let index = match index {
            Some(index) => index,
            None => {
                // Entries created outside this history carry no index; stamp the current one.
                platform.replace_state(
                    StoredState::for_location(&location, 0),
                    &S::href(&location.path()),
                );
                0
            }
        };

        let shared = Arc::new(Shared {
            platform: platform.clone(),
            state: Mutex::new(State {
                action: Action::Pop,
                location,
                index,
                reverting: false,
                bypass: None,
            }),
            listeners: Registry::new(),
            blockers: Blockers::new(),
            _scheme: PhantomData,
        });

        let weak: Weak<Shared<S>> = Arc::downgrade(&shared);
        platform.set_pop_handler(Some(Arc::new(move || {
            if let Some(shared) = weak.upgrade() {
                handle_pop(&shared);
            }
        })));

        Self { shared }
    }

    /// Position of the current entry on the platform stack.
    pub fn index(&self) -> usize {
        self.shared.state.lock().index
    }
}

fn read_entry<S: UrlScheme>(platform: &dyn Platform) -> (Location, Option<usize>) {
    let path = S::read(&platform.url());
    let stored = platform
        .state()
        .and_then(|value| serde_json::from_value::<StoredState>(value).ok());

    match stored {
        Some(stored) => (Location::new(path, stored.usr, stored.key), Some(stored.idx)),
        None => (Location::new(path, Value::Null, DEFAULT_KEY), None),
    }
}

fn propose<S: UrlScheme>(shared: &Arc<Shared<S>>, step: Step, seq: u64, after: Option<EntryId>) -> Navigation {
    let (action, location) = match &step {
        Step::Push(location) => (Action::Push, location.clone()),
        Step::Replace(location) => (Action::Replace, location.clone()),
    };

    let tx = Transition::new(action, location);
    if let Some(held_by) = shared.blockers.run(&tx, after) {
        tracing::debug!(action = action.as_str(), pathname = %tx.location.pathname, "Transition held");
        shared.blockers.hold(seq);
        let weak = Arc::downgrade(shared);
        tx.arm(move || match weak.upgrade() {
            Some(shared) if shared.blockers.release(seq) => {
                propose(&shared, step, seq, Some(held_by));
                true
            }
            _ => false,
        });
        return Navigation::Blocked;
    }

    let update = {
        let mut state = shared.state.lock();
        let (location, index) = match step {
            Step::Push(location) => (location, state.index + 1),
            Step::Replace(location) => (location, state.index),
        };

        let stored = StoredState::for_location(&location, index);
        let href = S::href(&location.path());
        match action {
            Action::Push => shared.platform.push_state(stored, &href),
            _ => shared.platform.replace_state(stored, &href),
        }

        state.index = index;
        state.location = location.clone();
        state.action = action;
        Update { action, location }
    };
    notify(&shared.listeners, &update);
    Navigation::Committed
}

fn handle_pop<S: UrlScheme>(shared: &Arc<Shared<S>>) {
    let (location, stored_index) = read_entry::<S>(shared.platform.as_ref());
    let (current_index, bypass) = {
        let mut state = shared.state.lock();
        if state.reverting {
            state.reverting = false;
            return;
        }
        (state.index, state.bypass.take())
    };
    let next_index = stored_index.unwrap_or(current_index);

    let (seq, after) = match bypass {
        Some(bypass) if bypass.target == next_index => (bypass.seq, Some(bypass.after)),
        _ => (shared.blockers.begin(), None),
    };

    let tx = Transition::new(Action::Pop, location.clone());
    if let Some(held_by) = shared.blockers.run(&tx, after) {
        let delta = current_index as isize - next_index as isize;
        tracing::debug!(pathname = %location.pathname, delta, "Pop held, reverting");
        shared.blockers.hold(seq);

        let weak = Arc::downgrade(shared);
        tx.arm(move || match weak.upgrade() {
            Some(shared) if shared.blockers.release(seq) => {
                if delta == 0 {
                    commit_pop(&shared, location, next_index);
                } else {
                    shared.state.lock().bypass = Some(Bypass {
                        seq,
                        after: held_by,
                        target: next_index,
                    });
                    shared.platform.go(-delta);
                }
                true
            }
            _ => false,
        });

        if delta == 0 {
            tracing::warn!("Held pop carries no entry index and cannot be reverted");
        } else {
            shared.state.lock().reverting = true;
            shared.platform.go(delta);
        }
        return;
    }

    commit_pop(shared, location, next_index);
}

fn commit_pop<S: UrlScheme>(shared: &Arc<Shared<S>>, location: Location, index: usize) {
    let update = {
        let mut state = shared.state.lock();
        state.index = index;
        state.location = location.clone();
        state.action = Action::Pop;
        Update {
            action: Action::Pop,
            location,
        }
    };
    notify(&shared.listeners, &update);
}

impl<S: UrlScheme> History for PlatformHistory<S> {
    fn location(&self) -> Location {
        self.shared.state.lock().location.clone()
    }

    fn action(&self) -> Action {
        self.shared.state.lock().action
    }

    fn listen(&self, listener: Box<ListenerFn>) -> Unsubscribe {
        self.shared.listeners.add(Arc::from(listener)).1
    }

    fn push(&self, to: PartialPath, state: Value) -> Navigation {
        let seq = self.shared.blockers.begin();
        let location = Location::next(&self.location(), to, state);
        propose(&self.shared, Step::Push(location), seq, None)
    }

    fn replace(&self, to: PartialPath, state: Value) -> Navigation {
        let seq = self.shared.blockers.begin();
        let location = Location::next(&self.location(), to, state);
        propose(&self.shared, Step::Replace(location), seq, None)
    }

    fn go(&self, delta: isize) -> bool {
        delta != 0 && self.shared.platform.go(delta)
    }

    fn block(&self, blocker: Box<BlockerFn>) -> Unsubscribe {
        self.shared.blockers.add(Arc::from(blocker))
    }

    fn create_href(&self, to: &Path) -> String {
        S::href(to)
    }

    fn is_holding(&self) -> bool {
        self.shared.blockers.is_holding()
    }
}
