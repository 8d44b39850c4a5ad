use std::sync::atomic::{AtomicBool, Ordering};

/// At-most-one-in-flight flag shared by the search and chat sessions.
#[derive(Debug, Default)]
pub(crate) struct LoadingFlag(AtomicBool);

impl LoadingFlag {
    /// Claims the flag, or returns `None` if a request is already running.
    pub(crate) fn try_begin(&self) -> Option<LoadingGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| LoadingGuard(&self.0))
    }

    pub(crate) fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub(crate) struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
