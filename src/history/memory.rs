//! In-process history for headless runs and tests.
//!
//! # Responsibilities
//! - Keep an explicit entry stack and cursor
//! - Run every change through the blocker pipeline
//!
//! # Design Decisions
//! - `go` past either end of the stack is a no-op (no clamping to the edge)
//! - Pushing truncates forward entries, like a browser does

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;

use crate::history::blocking::{BlockerFn, Blockers, Transition};
use crate::history::location::{Action, Location};
use crate::history::path::{create_path, PartialPath, Path};
use crate::history::platform::step_index;
use crate::history::registry::{Registry, Unsubscribe};
use crate::history::{notify, History, ListenerFn, Navigation, Update};

struct MemoryState {
    entries: Vec<Location>,
    index: usize,
    action: Action,
}

struct Shared {
    state: Mutex<MemoryState>,
    listeners: Registry<ListenerFn>,
    blockers: Blockers,
}

/// What a proposal will do once it passes the blockers.
#[derive(Clone)]
enum Step {
    Push(Location),
    Replace(Location),
    Pop(usize),
}

/// History backed by a vector of entries.
#[derive(Clone)]
pub struct MemoryHistory {
    shared: Arc<Shared>,
}

impl MemoryHistory {
    /// Create a history from initial entries; `index` defaults to the last one.
    ///
    /// An empty entry list starts at `/`.
    pub fn new<I, P>(initial_entries: I, index: Option<usize>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PartialPath>,
    {
        let mut entries: Vec<Location> = initial_entries
            .into_iter()
            .map(|entry| {
                let partial: PartialPath = entry.into();
                let path = Path {
                    pathname: partial.pathname.unwrap_or_else(|| "/".to_string()),
                    search: partial.search.unwrap_or_default(),
                    hash: partial.hash.unwrap_or_default(),
                };
                Location::initial(path, Value::Null)
            })
            .collect();
        if entries.is_empty() {
            entries.push(Location::initial(Path::new("/"), Value::Null));
        }
        let index = index.unwrap_or(entries.len() - 1).min(entries.len() - 1);

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(MemoryState {
                    entries,
                    index,
                    action: Action::Pop,
                }),
                listeners: Registry::new(),
                blockers: Blockers::new(),
            }),
        }
    }

    /// Cursor position in the entry stack.
    pub fn index(&self) -> usize {
        self.shared.state.lock().index
    }

    pub fn entries(&self) -> Vec<Location> {
        self.shared.state.lock().entries.clone()
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new(["/"], None)
    }
}

fn propose(shared: &Arc<Shared>, step: Step, seq: u64, after: Option<u64>) -> Navigation {
    let (action, location) = {
        let state = shared.state.lock();
        match &step {
            Step::Push(location) => (Action::Push, location.clone()),
            Step::Replace(location) => (Action::Replace, location.clone()),
            Step::Pop(target) => match state.entries.get(*target) {
                Some(location) => (Action::Pop, location.clone()),
                // The stack shrank while this pop was held.
                None => return Navigation::Blocked,
            },
        }
    };

    let tx = Transition::new(action, location);
    if let Some(held_by) = shared.blockers.run(&tx, after) {
        tracing::debug!(action = action.as_str(), pathname = %tx.location.pathname, "Transition held");
        shared.blockers.hold(seq);
        let weak: Weak<Shared> = Arc::downgrade(shared);
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
        match step {
            Step::Push(location) => {
                let next = state.index + 1;
                state.entries.truncate(next);
                state.entries.push(location);
                state.index = next;
            }
            Step::Replace(location) => {
                let index = state.index;
                state.entries[index] = location;
            }
            Step::Pop(target) => state.index = target,
        }
        state.action = action;
        Update {
            action,
            location: state.entries[state.index].clone(),
        }
    };
    notify(&shared.listeners, &update);
    Navigation::Committed
}

impl History for MemoryHistory {
    fn location(&self) -> Location {
        let state = self.shared.state.lock();
        state.entries[state.index].clone()
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
        let target = {
            let state = self.shared.state.lock();
            match step_index(state.index, delta, state.entries.len()) {
                Some(target) => target,
                None => {
                    tracing::debug!(delta, index = state.index, "Ignoring out-of-range go");
                    return false;
                }
            }
        };
        let seq = self.shared.blockers.begin();
        propose(&self.shared, Step::Pop(target), seq, None);
        true
    }

    fn block(&self, blocker: Box<BlockerFn>) -> Unsubscribe {
        self.shared.blockers.add(Arc::from(blocker))
    }

    fn create_href(&self, to: &Path) -> String {
        create_path(&to.into())
    }

    fn is_holding(&self) -> bool {
        self.shared.blockers.is_holding()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Verdict;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder(history: &MemoryHistory) -> Arc<Mutex<Vec<Update>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        history.listen(Box::new(move |update: &Update| sink.lock().push(update.clone())));
        seen
    }

    #[test]
    fn test_initial_location_has_default_key() {
        let history = MemoryHistory::default();
        assert_eq!(history.location().pathname, "/");
        assert_eq!(history.location().key, "default");
        assert_eq!(history.action(), Action::Pop);
    }

    #[test]
    fn test_push_same_path_twice_creates_two_entries() {
        let history = MemoryHistory::default();
        let seen = recorder(&history);

        assert_eq!(history.push("/a".into(), Value::Null), Navigation::Committed);
        assert_eq!(history.push("/a".into(), Value::Null), Navigation::Committed);

        assert_eq!(history.entries().len(), 3);
        assert_eq!(history.index(), 2);
        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|u| u.action == Action::Push && u.location.pathname == "/a"));
        assert_ne!(seen[0].location.key, seen[1].location.key);
    }

    #[test]
    fn test_replace_overwrites_current_entry() {
        let history = MemoryHistory::new(["/a", "/b"], None);
        history.replace("/c?x=1".into(), serde_json::json!({"from": "test"}));

        let entries = history.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].pathname, "/c");
        assert_eq!(entries[1].search, "?x=1");
        assert_eq!(entries[1].state["from"], "test");
        assert_eq!(history.action(), Action::Replace);
    }

    #[test]
    fn test_go_moves_cursor_and_ignores_out_of_range() {
        let history = MemoryHistory::new(["/a", "/b", "/c"], Some(1));
        let seen = recorder(&history);

        history.go(5);
        history.go(-2);
        assert_eq!(history.location().pathname, "/b");
        assert!(seen.lock().is_empty());

        history.back();
        assert_eq!(history.location().pathname, "/a");
        history.go(2);
        assert_eq!(history.location().pathname, "/c");
        assert_eq!(history.action(), Action::Pop);
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn test_go_with_extreme_delta_is_ignored() {
        let history = MemoryHistory::new(["/a", "/b"], None);
        let seen = recorder(&history);

        assert!(!history.go(isize::MAX));
        assert!(!history.go(isize::MIN));
        assert_eq!(history.location().pathname, "/b");
        assert_eq!(history.index(), 1);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_push_truncates_forward_entries() {
        let history = MemoryHistory::new(["/a", "/b", "/c"], Some(0));
        history.push("/d".into(), Value::Null);
        let paths: Vec<_> = history.entries().into_iter().map(|l| l.pathname).collect();
        assert_eq!(paths, vec!["/a", "/d"]);
    }

    #[test]
    fn test_held_transition_commits_on_retry() {
        let history = MemoryHistory::default();
        let seen = recorder(&history);
        let held: Arc<Mutex<Option<Transition>>> = Arc::new(Mutex::new(None));

        let slot = held.clone();
        history.block(Box::new(move |tx: &Transition| {
            *slot.lock() = Some(tx.clone());
            Verdict::Hold
        }));

        assert_eq!(history.push("/held".into(), Value::Null), Navigation::Blocked);
        assert_eq!(history.location().pathname, "/");
        assert!(history.is_holding());
        assert!(seen.lock().is_empty());

        let tx = held.lock().take().unwrap();
        assert!(tx.retry());
        assert_eq!(history.location().pathname, "/held");
        assert_eq!(history.location().key, tx.location.key);
        assert!(!history.is_holding());
        assert!(!tx.retry());
        assert_eq!(history.entries().len(), 2);
    }

    #[test]
    fn test_retry_runs_remaining_blockers() {
        let history = MemoryHistory::default();
        let later_calls = Arc::new(AtomicUsize::new(0));
        let held: Arc<Mutex<Option<Transition>>> = Arc::new(Mutex::new(None));

        let slot = held.clone();
        history.block(Box::new(move |tx: &Transition| {
            *slot.lock() = Some(tx.clone());
            Verdict::Hold
        }));
        let calls = later_calls.clone();
        history.block(Box::new(move |_: &Transition| {
            calls.fetch_add(1, Ordering::SeqCst);
            Verdict::Proceed
        }));

        history.push("/x".into(), Value::Null);
        assert_eq!(later_calls.load(Ordering::SeqCst), 0);

        let tx = held.lock().take().unwrap();
        tx.retry();
        assert_eq!(later_calls.load(Ordering::SeqCst), 1);
        assert_eq!(history.location().pathname, "/x");
    }

    #[test]
    fn test_newer_navigation_supersedes_held_one() {
        let history = MemoryHistory::default();
        let held: Arc<Mutex<Vec<Transition>>> = Arc::new(Mutex::new(Vec::new()));

        let slot = held.clone();
        let unblock = history.block(Box::new(move |tx: &Transition| {
            slot.lock().push(tx.clone());
            Verdict::Hold
        }));

        history.push("/first".into(), Value::Null);
        history.push("/second".into(), Value::Null);
        unblock.unsubscribe();

        let held = held.lock();
        assert!(!held[0].retry());
        assert_eq!(history.location().pathname, "/");
        assert!(held[1].retry());
        assert_eq!(history.location().pathname, "/second");
    }

    #[test]
    fn test_held_pop_keeps_cursor() {
        let history = MemoryHistory::new(["/a", "/b"], None);
        let unblock = history.block(Box::new(|_: &Transition| Verdict::Hold));

        history.back();
        assert_eq!(history.index(), 1);
        unblock.unsubscribe();
        history.back();
        assert_eq!(history.index(), 0);
    }
}
