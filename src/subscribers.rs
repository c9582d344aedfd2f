use log::warn;
use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use crate::ReceivedData;

/// A callback for inbound data
pub type Handler = Box<dyn Fn(&ReceivedData) + Send + Sync + 'static>;

type Entry = (SubscriptionId, Arc<dyn Fn(&ReceivedData) + Send + Sync>);

/// Identifies a registered handler so it can be removed later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// An observer list of [Handler]s
///
/// Handlers are called in subscription order. The list is not locked while they run, so a
/// handler may subscribe or unsubscribe (itself included) without deadlocking.
#[derive(Default)]
pub struct Subscribers {
    next_id: AtomicU64,
    handlers: Mutex<Vec<Entry>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::from(handler)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.lock();
        let before = handlers.len();
        handlers.retain(|(other, _)| *other != id);
        handlers.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call every handler with `data`
    ///
    /// A panicking handler is logged and skipped; the remaining handlers still run.
    pub fn notify(&self, data: &ReceivedData) {
        let handlers: Vec<_> = self.lock().iter().map(|(_, h)| Arc::clone(h)).collect();
        for handler in handlers {
            if panic::catch_unwind(AssertUnwindSafe(|| handler(data))).is_err() {
                warn!("notify: handler panicked on {} bytes", data.len());
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
