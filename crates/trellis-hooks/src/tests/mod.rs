mod hooks_tests;

use std::cell::RefCell;
use std::rc::Rc;

use trellis_core::surface::{ElementId, MemorySurface};
use trellis_core::{patch::Patcher, Runtime};
use trellis_testing::{ModuleCounts, TestHarness};

/// Everything an instance needs, pre-wired: shared surface, patcher with the
/// default + recording modules, a live runtime, and the container element.
pub(crate) fn fixture() -> (
    Patcher,
    Rc<RefCell<MemorySurface>>,
    Runtime,
    ElementId,
    ModuleCounts,
) {
    TestHarness::new().take_patcher()
}

/// Text content of the committed root's first child.
pub(crate) fn root_text(surface: &Rc<RefCell<MemorySurface>>, root: ElementId) -> String {
    let surface = surface.borrow();
    let record = surface.record(root).expect("root exists");
    let first = record.children().first().copied().expect("root has a child");
    surface
        .record(first)
        .expect("child exists")
        .text()
        .unwrap_or_default()
        .to_owned()
}
