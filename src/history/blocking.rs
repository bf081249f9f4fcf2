//! Blocker pipeline shared by every history backend.
//!
//! # State Transitions
//! ```text
//! propose ──▶ run blockers in order ──▶ all proceed ──▶ commit
//!                    │
//!                    └─ one holds ──▶ held (retry armed)
//!                                        │
//!                  retry() (once) ──────▶ resume after the holding blocker
//!                  newer proposal ──────▶ superseded, retry does nothing
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::history::location::{Action, Location};
use crate::history::registry::{EntryId, Registry, Unsubscribe};

/// Decision of a single blocker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Pass the transition on to the next blocker.
    Proceed,
    /// Veto: the transition is held until [`Transition::retry`] is called.
    Hold,
}

/// Callback consulted before a transition commits.
pub type BlockerFn = dyn Fn(&Transition) -> Verdict + Send + Sync;

type RetryFn = Box<dyn FnOnce() -> bool + Send>;

enum RetryState {
    Unarmed,
    Armed(RetryFn),
    Spent,
}

/// A proposed navigation that has not been committed yet.
///
/// Cloning is cheap; all clones share one retry slot.
#[derive(Clone)]
pub struct Transition {
    pub action: Action,
    pub location: Location,
    retry: Arc<Mutex<RetryState>>,
}

impl Transition {
    pub(crate) fn new(action: Action, location: Location) -> Self {
        Self {
            action,
            location,
            retry: Arc::new(Mutex::new(RetryState::Unarmed)),
        }
    }

    /// Re-run this transition, skipping the blocker that held it.
    ///
    /// Only the first call after the veto does anything. Returns false when the
    /// transition was superseded by a newer one or already retried.
    pub fn retry(&self) -> bool {
        let resume = {
            let mut slot = self.retry.lock();
            match std::mem::replace(&mut *slot, RetryState::Spent) {
                RetryState::Armed(resume) => Some(resume),
                RetryState::Unarmed => {
                    *slot = RetryState::Unarmed;
                    None
                }
                RetryState::Spent => None,
            }
        };

        resume.is_some_and(|resume| resume())
    }

    pub(crate) fn arm(&self, resume: impl FnOnce() -> bool + Send + 'static) {
        let mut slot = self.retry.lock();
        if matches!(*slot, RetryState::Unarmed) {
            *slot = RetryState::Armed(Box::new(resume));
        }
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("action", &self.action)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// Registered blockers plus the bookkeeping for the one held transition.
pub(crate) struct Blockers {
    registry: Registry<BlockerFn>,
    seq: AtomicU64,
    held: Mutex<Option<u64>>,
}

impl Blockers {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            seq: AtomicU64::new(0),
            held: Mutex::new(None),
        }
    }

    pub fn add(&self, blocker: Arc<BlockerFn>) -> Unsubscribe {
        self.registry.add(blocker).1
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Start a new proposal. Any held transition is superseded.
    pub fn begin(&self) -> u64 {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        *self.held.lock() = None;
        seq
    }

    /// Run blockers registered after `after` (all when `None`), in order.
    /// Returns the id of the blocker that held the transition.
    pub fn run(&self, tx: &Transition, after: Option<EntryId>) -> Option<EntryId> {
        for (id, blocker) in self.registry.snapshot() {
            if after.is_some_and(|after| id <= after) {
                continue;
            }
            if blocker(tx) == Verdict::Hold {
                return Some(id);
            }
        }
        None
    }

    pub fn hold(&self, seq: u64) {
        *self.held.lock() = Some(seq);
    }

    /// Claim the held transition `seq` for a retry. False when it was superseded.
    pub fn release(&self, seq: u64) -> bool {
        let mut held = self.held.lock();
        if *held == Some(seq) {
            *held = None;
            true
        } else {
            false
        }
    }

    pub fn is_holding(&self) -> bool {
        self.held.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::path::Path;
    use serde_json::Value;
    use std::sync::atomic::AtomicUsize;

    fn transition() -> Transition {
        Transition::new(Action::Push, Location::initial(Path::new("/a"), Value::Null))
    }

    #[test]
    fn test_run_stops_at_first_hold() {
        let blockers = Blockers::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let c = calls.clone();
        blockers.add(Arc::new(move |_: &Transition| {
            c.fetch_add(1, Ordering::SeqCst);
            Verdict::Proceed
        }));
        blockers.add(Arc::new(|_: &Transition| Verdict::Hold));
        let c = calls.clone();
        blockers.add(Arc::new(move |_: &Transition| {
            c.fetch_add(1, Ordering::SeqCst);
            Verdict::Proceed
        }));

        let held_by = blockers.run(&transition(), None);
        assert_eq!(held_by, Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(blockers.run(&transition(), held_by), None);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_retry_fires_once_and_only_when_armed() {
        let tx = transition();
        let fired = Arc::new(AtomicUsize::new(0));

        assert!(!tx.retry());

        let f = fired.clone();
        tx.arm(move || {
            f.fetch_add(1, Ordering::SeqCst);
            true
        });
        let clone = tx.clone();
        assert!(clone.retry());
        assert!(!tx.retry());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_newer_proposal_supersedes_held() {
        let blockers = Blockers::new();
        let first = blockers.begin();
        blockers.hold(first);
        assert!(blockers.is_holding());

        let _second = blockers.begin();
        assert!(!blockers.is_holding());
        assert!(!blockers.release(first));
    }
}
