//! Effect slot state and the scope handed to effect bodies.

use std::cell::Cell;
use std::rc::Rc;

/// Handed to an effect body when it runs. `on_dispose` registers the
/// cleanup for the next differing run (or teardown); `is_active` lets a
/// long-lived body notice that its instance has moved on.
#[derive(Clone)]
pub struct EffectScope {
    active: Rc<Cell<bool>>,
}

impl EffectScope {
    pub(crate) fn new(active: Rc<Cell<bool>>) -> Self {
        Self { active }
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn on_dispose(&self, cleanup: impl FnOnce() + 'static) -> EffectResult {
        EffectResult::new(cleanup)
    }
}

/// What an effect body returns: either a cleanup registration or nothing.
pub struct EffectResult {
    cleanup: Option<Box<dyn FnOnce()>>,
}

impl EffectResult {
    pub fn new(cleanup: impl FnOnce() + 'static) -> Self {
        Self {
            cleanup: Some(Box::new(cleanup)),
        }
    }

    pub(crate) fn into_cleanup(self) -> Option<Box<dyn FnOnce()>> {
        self.cleanup
    }
}

impl Default for EffectResult {
    fn default() -> Self {
        Self { cleanup: None }
    }
}

/// Per-slot effect bookkeeping: the dependency hash of the last run, the
/// recorded cleanup, and a token cancelling a scheduled body that has not
/// run yet.
#[derive(Default)]
pub(crate) struct EffectState {
    last: Option<u64>,
    cleanup: Option<Box<dyn FnOnce()>>,
    token: Option<Rc<Cell<bool>>>,
}

impl EffectState {
    /// A run is due when the effect never ran, when no dependency list was
    /// supplied, or when the dependency hash changed.
    pub(crate) fn should_run(&self, key: Option<u64>) -> bool {
        match (self.last, key) {
            (None, _) => true,
            (_, None) => true,
            (Some(previous), Some(current)) => previous != current,
        }
    }

    /// Records a new pending run: cleans up the previous run, cancels any
    /// body still queued, and arms a fresh token.
    pub(crate) fn arm(&mut self, key: Option<u64>) -> Rc<Cell<bool>> {
        self.run_cleanup();
        self.cancel();
        self.last = key;
        let token = Rc::new(Cell::new(true));
        self.token = Some(Rc::clone(&token));
        token
    }

    pub(crate) fn set_cleanup(&mut self, cleanup: Option<Box<dyn FnOnce()>>) {
        self.cleanup = cleanup;
    }

    pub(crate) fn run_cleanup(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            token.set(false);
        }
    }
}

impl Drop for EffectState {
    fn drop(&mut self) {
        self.cancel();
        self.run_cleanup();
    }
}
