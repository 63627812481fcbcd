//! Run-once activation hook.
//!
//! An effect fires at most once per activation, no matter how often
//! `run` is called. It may hand back a cleanup which is invoked on
//! deactivation, either explicitly or when the effect is dropped.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

pub type Cleanup = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
pub struct OnceEffect {
    fired: AtomicBool,
    cleanup: Mutex<Option<Cleanup>>,
}

impl OnceEffect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `effect` unless it already ran. Returns true if it ran now.
    pub fn run<F>(&self, effect: F) -> bool
    where
        F: FnOnce() -> Option<Cleanup>,
    {
        if self.fired.swap(true, Ordering::SeqCst) {
            return false;
        }
        if let Some(cleanup) = effect() {
            *self.cleanup.lock().unwrap_or_else(PoisonError::into_inner) =
                Some(cleanup);
        }
        true
    }

    pub fn has_run(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Invoke the stored cleanup, if any. Safe to call more than once.
    pub fn deactivate(&self) {
        let cleanup = self
            .cleanup
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }
}

impl Drop for OnceEffect {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl std::fmt::Debug for OnceEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let has_cleanup = self
            .cleanup
            .lock()
            .map(|cleanup| cleanup.is_some())
            .unwrap_or(false);
        f.debug_struct("OnceEffect")
            .field("fired", &self.has_run())
            .field("has_cleanup", &has_cleanup)
            .finish()
    }
}
