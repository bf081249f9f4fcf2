//! Ordered callback registry with detachable handles.
//!
//! Used for history listeners, blockers, router `after_each` hooks and route
//! subscribers. Callbacks are always invoked from a snapshot taken outside
//! the lock, so a callback may register, unregister or navigate re-entrantly.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Registration id; ids grow in registration order.
pub type EntryId = u64;

struct Entries<T: ?Sized> {
    next_id: AtomicU64,
    items: Mutex<Vec<(EntryId, Arc<T>)>>,
}

/// Ordered set of callbacks.
pub struct Registry<T: ?Sized> {
    inner: Arc<Entries<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> Registry<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Entries {
                next_id: AtomicU64::new(1),
                items: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Append a callback; the returned handle removes it again.
    pub fn add(&self, item: Arc<T>) -> (EntryId, Unsubscribe) {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.items.lock().push((id, item));

        let weak: Weak<Entries<T>> = Arc::downgrade(&self.inner);
        let handle = Unsubscribe::new(move || {
            if let Some(entries) = weak.upgrade() {
                entries.items.lock().retain(|(entry_id, _)| *entry_id != id);
            }
        });
        (id, handle)
    }

    /// Callbacks in registration order.
    pub fn snapshot(&self) -> Vec<(EntryId, Arc<T>)> {
        self.inner.items.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.lock().is_empty()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by `listen`, `block`, `after_each` and `subscribe`.
///
/// Dropping the handle keeps the registration alive; call [`Unsubscribe::unsubscribe`].
#[derive(Clone)]
pub struct Unsubscribe {
    remove: Arc<Mutex<Option<Box<dyn FnOnce() + Send>>>>,
}

impl Unsubscribe {
    pub(crate) fn new(remove: impl FnOnce() + Send + 'static) -> Self {
        Self {
            remove: Arc::new(Mutex::new(Some(Box::new(remove)))),
        }
    }

    /// Remove the registration. Further calls do nothing.
    pub fn unsubscribe(&self) {
        let remove = self.remove.lock().take();
        if let Some(remove) = remove {
            remove();
        }
    }

    pub fn is_active(&self) -> bool {
        self.remove.lock().is_some()
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("active", &self.is_active())
            .finish()
    }
}
