//! Store observers

use std::fmt;
use std::sync::Arc;

use super::StoreSnapshot;

/// Receives every snapshot the store publishes.
///
/// Callbacks run synchronously on the mutating thread, in registration
/// order. They may call back into the store; nested changes are delivered
/// after the current snapshot has reached every observer.
pub trait StoreObserver: Send + Sync {
    /// Observer name, used in logs.
    fn name(&self) -> &str;

    /// Handles a new snapshot.
    fn on_snapshot(&self, snapshot: &Arc<StoreSnapshot>);
}

/// Observer backed by a closure.
pub struct FnObserver<F>
where
    F: Fn(&Arc<StoreSnapshot>) + Send + Sync,
{
    name: String,
    handler: F,
}

impl<F> FnObserver<F>
where
    F: Fn(&Arc<StoreSnapshot>) + Send + Sync,
{
    /// Creates a named observer.
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

impl<F> StoreObserver for FnObserver<F>
where
    F: Fn(&Arc<StoreSnapshot>) + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_snapshot(&self, snapshot: &Arc<StoreSnapshot>) {
        (self.handler)(snapshot);
    }
}

impl<F> fmt::Debug for FnObserver<F>
where
    F: Fn(&Arc<StoreSnapshot>) + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnObserver").field("name", &self.name).finish()
    }
}

/// Handle returned by [`super::TreeStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);
