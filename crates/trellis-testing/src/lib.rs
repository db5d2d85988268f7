//! Test harness for the Trellis runtime.
//!
//! Provides a recording module that counts every lifecycle dispatch, a
//! no-op scheduler, and a bundled harness (in-memory surface + default
//! modules + recording module + runtime) the crate test suites drive.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use trellis_core::patch::{PatchError, Patcher};
use trellis_core::surface::{ElementId, MemorySurface, Surface, SurfaceError};
use trellis_core::vnode::{placeholder, VNode};
use trellis_core::{Module, Runtime, RuntimeHandle, Scheduler};
use trellis_modules::default_modules;

/// Shared lifecycle counters, one per module slot.
#[derive(Clone, Default)]
pub struct ModuleCounts {
    creates: Rc<Cell<usize>>,
    updates: Rc<Cell<usize>>,
    destroys: Rc<Cell<usize>>,
    removes: Rc<Cell<usize>>,
    inserts: Rc<Cell<usize>>,
    pres: Rc<Cell<usize>>,
    posts: Rc<Cell<usize>>,
}

impl ModuleCounts {
    pub fn creates(&self) -> usize {
        self.creates.get()
    }

    pub fn updates(&self) -> usize {
        self.updates.get()
    }

    pub fn destroys(&self) -> usize {
        self.destroys.get()
    }

    pub fn removes(&self) -> usize {
        self.removes.get()
    }

    pub fn inserts(&self) -> usize {
        self.inserts.get()
    }

    pub fn pres(&self) -> usize {
        self.pres.get()
    }

    pub fn posts(&self) -> usize {
        self.posts.get()
    }

    pub fn reset(&self) {
        self.creates.set(0);
        self.updates.set(0);
        self.destroys.set(0);
        self.removes.set(0);
        self.inserts.set(0);
        self.pres.set(0);
        self.posts.set(0);
    }
}

/// A [`Module`] that observes every dispatch without touching the surface.
pub struct RecordingModule {
    counts: ModuleCounts,
}

impl RecordingModule {
    pub fn new(counts: ModuleCounts) -> Self {
        Self { counts }
    }
}

impl Module for RecordingModule {
    fn pre(&self) {
        self.counts.pres.set(self.counts.pres.get() + 1);
    }

    fn create(
        &self,
        _surface: &mut dyn Surface,
        _old: &VNode,
        _new: &VNode,
    ) -> Result<(), SurfaceError> {
        self.counts.creates.set(self.counts.creates.get() + 1);
        Ok(())
    }

    fn update(
        &self,
        _surface: &mut dyn Surface,
        _old: &VNode,
        _new: &VNode,
    ) -> Result<(), SurfaceError> {
        self.counts.updates.set(self.counts.updates.get() + 1);
        Ok(())
    }

    fn destroy(&self, _surface: &mut dyn Surface, _node: &VNode) -> Result<(), SurfaceError> {
        self.counts.destroys.set(self.counts.destroys.get() + 1);
        Ok(())
    }

    fn remove(
        &self,
        _surface: &mut dyn Surface,
        _node: &VNode,
        done: &mut dyn FnMut(),
    ) -> Result<(), SurfaceError> {
        self.counts.removes.set(self.counts.removes.get() + 1);
        done();
        Ok(())
    }

    fn insert(&self, _surface: &mut dyn Surface, _node: &VNode) -> Result<(), SurfaceError> {
        self.counts.inserts.set(self.counts.inserts.get() + 1);
        Ok(())
    }

    fn post(&self) {
        self.counts.posts.set(self.counts.posts.get() + 1);
    }
}

/// No-op scheduler for tests that drain explicitly.
#[derive(Default)]
pub struct TestScheduler;

impl Scheduler for TestScheduler {
    fn schedule(&self) {}
}

/// Scheduler that counts wake-ups.
#[derive(Default)]
pub struct CountingScheduler {
    scheduled: AtomicUsize,
}

impl CountingScheduler {
    pub fn count(&self) -> usize {
        self.scheduled.load(Ordering::SeqCst)
    }
}

impl Scheduler for CountingScheduler {
    fn schedule(&self) {
        self.scheduled.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory surface + default modules + recording module + runtime,
/// pre-wired with a root container element.
pub struct TestHarness {
    surface: Rc<RefCell<MemorySurface>>,
    patcher: Patcher,
    counts: ModuleCounts,
    runtime: Runtime,
    container: ElementId,
}

impl TestHarness {
    pub fn new() -> Self {
        let mut surface = MemorySurface::new();
        let container = surface.create_element("root");
        let counts = ModuleCounts::default();
        let mut modules = default_modules();
        modules.push(Box::new(RecordingModule::new(counts.clone())) as Box<dyn Module>);
        Self {
            surface: Rc::new(RefCell::new(surface)),
            patcher: Patcher::new(modules),
            counts,
            runtime: Runtime::new(Arc::new(TestScheduler)),
            container,
        }
    }

    pub fn surface(&self) -> Rc<RefCell<MemorySurface>> {
        Rc::clone(&self.surface)
    }

    pub fn patcher(&self) -> &Patcher {
        &self.patcher
    }

    /// Consumes the harness's patcher for APIs that take ownership.
    pub fn take_patcher(self) -> (Patcher, Rc<RefCell<MemorySurface>>, Runtime, ElementId, ModuleCounts) {
        (
            self.patcher,
            self.surface,
            self.runtime,
            self.container,
            self.counts,
        )
    }

    pub fn counts(&self) -> &ModuleCounts {
        &self.counts
    }

    pub fn container(&self) -> ElementId {
        self.container
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    /// Commits `node` as a fresh tree under the container, via the engine's
    /// placeholder-replace path, and zeroes the counters afterwards.
    pub fn mount(&self, node: &VNode) -> VNode {
        let slot = {
            let mut surface = self.surface.borrow_mut();
            let slot = surface.create_element("");
            surface
                .insert_before(self.container, slot, None)
                .expect("container exists");
            slot
        };
        let committed = self
            .patch(&placeholder(slot), node)
            .expect("mount patch succeeds");
        self.counts.reset();
        self.surface.borrow_mut().reset_stats();
        committed
    }

    pub fn patch(&self, old: &VNode, new: &VNode) -> Result<VNode, PatchError> {
        let mut surface = self.surface.borrow_mut();
        self.patcher.patch(&mut *surface, old, new)
    }

    /// Selectors (or text, for text nodes) of `parent`'s live children, in
    /// order.
    pub fn live_labels(&self, parent: ElementId) -> Vec<String> {
        let surface = self.surface.borrow();
        let record = surface.record(parent).expect("parent exists");
        record
            .children()
            .iter()
            .map(|child| {
                let child = surface.record(*child).expect("child exists");
                child
                    .sel()
                    .map(str::to_owned)
                    .unwrap_or_else(|| child.text().unwrap_or_default().to_owned())
            })
            .collect()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
