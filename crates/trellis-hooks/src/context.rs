//! The hook context: slot storage addressed by call order.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use trellis_core::hash::hash_one;
use trellis_core::surface::ElementId;
use trellis_core::vnode::{Key, VNode};
use trellis_core::{Owned, RuntimeHandle};

use crate::effects::{EffectResult, EffectScope, EffectState};
use crate::instance::UpdateHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookError {
    /// A render completed with a different number of hook calls than the
    /// first render of this instance.
    OrderViolation { expected: usize, actual: usize },
    /// A hook call found a slot of a different kind at its position.
    SlotKind { index: usize },
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookError::OrderViolation { expected, actual } => write!(
                f,
                "hook order violation: {actual} hook calls this render, {expected} on first render"
            ),
            HookError::SlotKind { index } => {
                write!(f, "hook call at slot {index} changed kind between renders")
            }
        }
    }
}

impl std::error::Error for HookError {}

/// Validation switches for a hook context.
#[derive(Clone, Copy, Debug)]
pub struct HookOptions {
    /// Check hook-call parity per render and surface violations as errors
    /// instead of silently corrupting slot state.
    pub validate: bool,
}

impl Default for HookOptions {
    fn default() -> Self {
        Self {
            validate: cfg!(debug_assertions),
        }
    }
}

/// The per-instance slot storage. Append-only in length; the cursor resets
/// to zero at the start of every render and each hook call claims one slot.
pub(crate) struct HookSlots {
    slots: Vec<Box<dyn Any>>,
    cursor: usize,
    expected: Option<usize>,
    validate: bool,
    violation: Option<HookError>,
    effects: Vec<Owned<EffectState>>,
}

impl HookSlots {
    pub(crate) fn new(options: HookOptions) -> Self {
        Self {
            slots: Vec::new(),
            cursor: 0,
            expected: None,
            validate: options.validate,
            violation: None,
            effects: Vec::new(),
        }
    }

    pub(crate) fn begin(&mut self) {
        self.cursor = 0;
        self.violation = None;
    }

    /// Closes out a render: records the slot count of the first render and
    /// checks later renders against it.
    pub(crate) fn finish(&mut self) -> Result<(), HookError> {
        if let Some(violation) = self.violation.take() {
            return Err(violation);
        }
        match self.expected {
            None => {
                self.expected = Some(self.cursor);
                Ok(())
            }
            Some(expected) if self.validate && expected != self.cursor => {
                Err(HookError::OrderViolation {
                    expected,
                    actual: self.cursor,
                })
            }
            Some(_) => Ok(()),
        }
    }

    /// Claims the slot at the cursor, initializing it on first use.
    /// Returns the slot and whether it was created by this call.
    fn slot<T: 'static>(&mut self, init: impl FnOnce() -> T) -> (Owned<T>, bool) {
        let index = self.cursor;
        if index < self.slots.len() {
            if let Some(existing) = self.slots[index].downcast_ref::<Owned<T>>() {
                let existing = existing.clone();
                self.cursor += 1;
                return (existing, false);
            }
            // The call sequence diverged from the previous render. Reinit
            // from here on so the render can complete, and surface the
            // violation when this render finishes.
            if self.validate && self.violation.is_none() {
                self.violation = Some(HookError::SlotKind { index });
            }
            self.slots.truncate(index);
        }
        let owned = Owned::new(init());
        self.slots.push(Box::new(owned.clone()));
        self.cursor += 1;
        (owned, true)
    }

    /// Cancels pending effect bodies and runs every recorded cleanup, in
    /// declaration order.
    pub(crate) fn teardown(&mut self) {
        for effect in self.effects.drain(..) {
            effect.update(|state| {
                state.cancel();
                state.run_cleanup();
            });
        }
        self.slots.clear();
        self.cursor = 0;
        self.expected = None;
    }
}

struct MemoSlot<T> {
    last: Option<u64>,
    value: Option<T>,
}

/// The stateful-function context threaded through a component render.
///
/// Each primitive claims the next slot in call order; see the crate docs
/// for the ordering contract.
pub struct HookContext<'a> {
    slots: &'a mut HookSlots,
    runtime: RuntimeHandle,
    update: UpdateHandle,
    committed: Rc<RefCell<Option<VNode>>>,
}

impl<'a> HookContext<'a> {
    pub(crate) fn new(
        slots: &'a mut HookSlots,
        runtime: RuntimeHandle,
        update: UpdateHandle,
        committed: Rc<RefCell<Option<VNode>>>,
    ) -> Self {
        Self {
            slots,
            runtime,
            update,
            committed,
        }
    }

    /// Persistent state plus a setter that stores unconditionally and
    /// re-renders — setting an equal value still re-renders.
    pub fn use_state<T: Clone + 'static>(
        &mut self,
        init: impl FnOnce() -> T,
    ) -> (T, SetState<T>) {
        let (slot, _) = self.slots.slot(init);
        let value = slot.get();
        (
            value,
            SetState {
                cell: slot,
                update: self.update.clone(),
            },
        )
    }

    /// Recomputes through `factory` when the dependency hash changes, when
    /// no previous value exists, or when `deps` is `None` (always
    /// recompute); otherwise returns the cached value.
    pub fn use_memo<T: Clone + 'static, D: Hash>(
        &mut self,
        deps: Option<D>,
        factory: impl FnOnce() -> T,
    ) -> T {
        let key = deps.map(|deps| hash_one(&deps));
        let (slot, _) = self.slots.slot(|| MemoSlot::<T> {
            last: None,
            value: None,
        });
        slot.update(|memo| {
            let stale = memo.value.is_none() || key.is_none() || memo.last != key;
            if stale {
                memo.value = Some(factory());
                memo.last = key;
            }
        });
        slot.with(|memo| memo.value.clone().expect("memo slot populated above"))
    }

    /// [`use_memo`](Self::use_memo) specialized to a shared function
    /// handle, so a stable callback identity survives re-renders.
    pub fn use_callback<F: 'static, D: Hash>(
        &mut self,
        deps: Option<D>,
        make: impl FnOnce() -> F,
    ) -> Rc<F> {
        self.use_memo(deps, || Rc::new(make()))
    }

    /// A persistent mutable box. Writing to it does not re-render.
    pub fn use_ref<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Owned<T> {
        let (slot, _) = self.slots.slot(init);
        slot
    }

    /// Runs `body` after the commit when the dependency hash changes (same
    /// rule as [`use_memo`](Self::use_memo)); the previous run's cleanup
    /// fires first. Bodies never run during a render — they ride the
    /// runtime task queue, in declaration order.
    pub fn use_effect<D: Hash>(
        &mut self,
        deps: Option<D>,
        body: impl FnOnce(EffectScope) -> EffectResult + 'static,
    ) {
        let key = deps.map(|deps| hash_one(&deps));
        let (slot, created) = self.slots.slot(EffectState::default);
        if created {
            self.slots.effects.push(slot.clone());
        }
        if !slot.with(|state| state.should_run(key)) {
            return;
        }
        let token = slot.update(|state| state.arm(key));
        let state = slot.clone();
        let mut body_opt = Some(body);
        self.runtime.spawn_task(Box::new(move || {
            if !token.get() {
                return;
            }
            if let Some(body) = body_opt.take() {
                let result = body(EffectScope::new(Rc::clone(&token)));
                state.update(|state| state.set_cleanup(result.into_cleanup()));
            }
        }));
    }

    /// A handle that re-renders the instance with no state change.
    pub fn use_update(&mut self) -> UpdateHandle {
        self.update.clone()
    }

    /// After every commit, resolves the live element of the committed
    /// descendant carrying `key` into a persistent box.
    pub fn use_element(&mut self, key: impl Into<Key>) -> Owned<Option<ElementId>> {
        let slot = self.use_ref(|| None);
        let key: Key = key.into();
        let committed = Rc::clone(&self.committed);
        let target = slot.clone();
        self.use_effect(None::<()>, move |_| {
            let found = committed
                .borrow()
                .as_ref()
                .and_then(|root| root.descendant_by_key(&key))
                .and_then(|node| node.element());
            target.set(found);
            EffectResult::default()
        });
        slot
    }

    /// The most recently committed tree, if any.
    pub fn committed(&self) -> Option<VNode> {
        self.committed.borrow().clone()
    }
}

/// The setter half of [`HookContext::use_state`].
pub struct SetState<T> {
    cell: Owned<T>,
    update: UpdateHandle,
}

impl<T: 'static> SetState<T> {
    /// Stores `value` and triggers a re-render, unconditionally.
    pub fn set(&self, value: T) {
        self.cell.set(value);
        self.update.trigger();
    }
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            update: self.update.clone(),
        }
    }
}

impl<T> fmt::Debug for SetState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SetState")
    }
}
