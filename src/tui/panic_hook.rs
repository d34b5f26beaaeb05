//! Scoped panic hook for the dashboard

use std::panic::{self, PanicHookInfo};
use std::sync::Arc;

type Hook = Arc<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

/// Runs `cleanup` ahead of the previously installed panic hook until dropped
///
/// Dropping the guard puts the previous hook back, so later panics no longer
/// touch the terminal.
pub(crate) struct PanicHookGuard {
    previous: Hook,
}

impl PanicHookGuard {
    pub(crate) fn install<F>(cleanup: F) -> Self
    where
        F: Fn() + Sync + Send + 'static,
    {
        let previous: Hook = Arc::from(panic::take_hook());
        let chained = previous.clone();
        panic::set_hook(Box::new(move |info| {
            cleanup();
            chained(info);
        }));
        Self { previous }
    }
}

impl Drop for PanicHookGuard {
    fn drop(&mut self) {
        // Skip while unwinding: set_hook panics when called from a panicking thread
        if std::thread::panicking() {
            return;
        }
        let previous = self.previous.clone();
        drop(panic::take_hook());
        panic::set_hook(Box::new(move |info| previous(info)));
    }
}
