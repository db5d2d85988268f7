use std::cell::{Cell, RefCell};
use std::rc::Rc;

use trellis_core::vnode::{h, text, VNode, VNodeData};

use crate::context::{HookContext, HookError, HookOptions, SetState};
use crate::effects::EffectResult;
use crate::instance::{ComponentInstance, InstanceError, UpdateHandle};

use super::{fixture, root_text};

thread_local! {
    static RENDERS: Cell<usize> = Cell::new(0);
    static FACTORY_RUNS: Cell<usize> = Cell::new(0);
    static DEP: Cell<i64> = Cell::new(0);
    static SETTER: RefCell<Option<SetState<i64>>> = RefCell::new(None);
    static UPDATER: RefCell<Option<UpdateHandle>> = RefCell::new(None);
    static CALLBACK: RefCell<Option<Rc<fn() -> i64>>> = RefCell::new(None);
    static EFFECT_LOG: RefCell<Vec<&'static str>> = RefCell::new(Vec::new());
    static EXTRA_HOOK: Cell<bool> = Cell::new(false);
    static SWAP_KIND: Cell<bool> = Cell::new(false);
    static ELEMENT_PROBE: RefCell<Option<crate::Owned<Option<trellis_core::ElementId>>>> =
        RefCell::new(None);
}

fn reset_probes() {
    RENDERS.with(|c| c.set(0));
    FACTORY_RUNS.with(|c| c.set(0));
    DEP.with(|c| c.set(0));
    SETTER.with(|c| *c.borrow_mut() = None);
    UPDATER.with(|c| *c.borrow_mut() = None);
    CALLBACK.with(|c| *c.borrow_mut() = None);
    EFFECT_LOG.with(|c| c.borrow_mut().clear());
    EXTRA_HOOK.with(|c| c.set(false));
    SWAP_KIND.with(|c| c.set(false));
    ELEMENT_PROBE.with(|c| *c.borrow_mut() = None);
}

fn counter(_: &(), ctx: &mut HookContext<'_>) -> VNode {
    RENDERS.with(|c| c.set(c.get() + 1));
    let (count, set) = ctx.use_state(|| 0i64);
    SETTER.with(|s| *s.borrow_mut() = Some(set));
    h("div", VNodeData::new(), vec![text(count.to_string())])
}

#[test]
fn state_persists_until_the_setter_stores_a_new_value() {
    reset_probes();
    let (patcher, surface, runtime, container, _counts) = fixture();
    let instance =
        ComponentInstance::mount(surface.clone(), patcher, runtime.handle(), container, (), counter)
            .unwrap();
    assert_eq!(RENDERS.with(Cell::get), 1);
    assert_eq!(root_text(&surface, instance.root_element().unwrap()), "0");

    // Re-renders without a set keep returning the same value.
    instance.update().unwrap();
    instance.update().unwrap();
    assert_eq!(RENDERS.with(Cell::get), 3);
    assert_eq!(root_text(&surface, instance.root_element().unwrap()), "0");

    let setter = SETTER.with(|s| s.borrow().clone()).unwrap();
    setter.set(5);
    assert_eq!(RENDERS.with(Cell::get), 4);
    assert_eq!(root_text(&surface, instance.root_element().unwrap()), "5");
}

#[test]
fn setting_an_equal_value_still_rerenders() {
    reset_probes();
    let (patcher, surface, runtime, container, _counts) = fixture();
    let _instance =
        ComponentInstance::mount(surface, patcher, runtime.handle(), container, (), counter)
            .unwrap();
    let setter = SETTER.with(|s| s.borrow().clone()).unwrap();
    setter.set(0);
    setter.set(0);
    assert_eq!(RENDERS.with(Cell::get), 3);
}

fn memoized(_: &(), ctx: &mut HookContext<'_>) -> VNode {
    let dep = DEP.with(Cell::get);
    let value = ctx.use_memo(Some(dep), move || {
        FACTORY_RUNS.with(|c| c.set(c.get() + 1));
        dep * 2
    });
    h("div", VNodeData::new(), vec![text(value.to_string())])
}

#[test]
fn memo_returns_the_cached_value_while_deps_hold() {
    reset_probes();
    let (patcher, surface, runtime, container, _counts) = fixture();
    let instance =
        ComponentInstance::mount(surface.clone(), patcher, runtime.handle(), container, (), memoized)
            .unwrap();
    assert_eq!(FACTORY_RUNS.with(Cell::get), 1);

    instance.update().unwrap();
    instance.update().unwrap();
    assert_eq!(FACTORY_RUNS.with(Cell::get), 1);

    DEP.with(|c| c.set(3));
    instance.update().unwrap();
    assert_eq!(FACTORY_RUNS.with(Cell::get), 2);
    assert_eq!(root_text(&surface, instance.root_element().unwrap()), "6");
}

fn always_recompute(_: &(), ctx: &mut HookContext<'_>) -> VNode {
    let value = ctx.use_memo(None::<u64>, || {
        FACTORY_RUNS.with(|c| c.set(c.get() + 1));
        0i64
    });
    h("div", VNodeData::new(), vec![text(value.to_string())])
}

#[test]
fn memo_without_deps_recomputes_every_render() {
    reset_probes();
    let (patcher, surface, runtime, container, _counts) = fixture();
    let instance = ComponentInstance::mount(
        surface,
        patcher,
        runtime.handle(),
        container,
        (),
        always_recompute,
    )
    .unwrap();
    instance.update().unwrap();
    instance.update().unwrap();
    assert_eq!(FACTORY_RUNS.with(Cell::get), 3);
}

fn with_callback(_: &(), ctx: &mut HookContext<'_>) -> VNode {
    let dep = DEP.with(Cell::get);
    let cb = ctx.use_callback(Some(dep), || (|| 42) as fn() -> i64);
    CALLBACK.with(|c| *c.borrow_mut() = Some(cb));
    h("div", VNodeData::new(), vec![])
}

#[test]
fn callback_identity_is_stable_while_deps_hold() {
    reset_probes();
    let (patcher, surface, runtime, container, _counts) = fixture();
    let instance = ComponentInstance::mount(
        surface,
        patcher,
        runtime.handle(),
        container,
        (),
        with_callback,
    )
    .unwrap();
    let first = CALLBACK.with(|c| c.borrow().clone()).unwrap();

    instance.update().unwrap();
    let second = CALLBACK.with(|c| c.borrow().clone()).unwrap();
    assert!(Rc::ptr_eq(&first, &second));

    DEP.with(|c| c.set(9));
    instance.update().unwrap();
    let third = CALLBACK.with(|c| c.borrow().clone()).unwrap();
    assert!(!Rc::ptr_eq(&first, &third));
    assert_eq!((*third)(), 42);
}

fn with_ref(_: &(), ctx: &mut HookContext<'_>) -> VNode {
    RENDERS.with(|c| c.set(c.get() + 1));
    let slot = ctx.use_ref(|| 0i64);
    let seen = slot.get();
    slot.update(|value| *value += 1);
    h("div", VNodeData::new(), vec![text(seen.to_string())])
}

#[test]
fn refs_persist_without_triggering_renders() {
    reset_probes();
    let (patcher, surface, runtime, container, _counts) = fixture();
    let instance =
        ComponentInstance::mount(surface.clone(), patcher, runtime.handle(), container, (), with_ref)
            .unwrap();
    assert_eq!(RENDERS.with(Cell::get), 1);
    assert_eq!(root_text(&surface, instance.root_element().unwrap()), "0");

    instance.update().unwrap();
    // The ref kept its mutated value, and mutating it never re-rendered.
    assert_eq!(RENDERS.with(Cell::get), 2);
    assert_eq!(root_text(&surface, instance.root_element().unwrap()), "1");
}

fn two_effects(_: &(), ctx: &mut HookContext<'_>) -> VNode {
    ctx.use_effect(None::<()>, |_| {
        EFFECT_LOG.with(|log| log.borrow_mut().push("first"));
        EffectResult::default()
    });
    ctx.use_effect(None::<()>, |_| {
        EFFECT_LOG.with(|log| log.borrow_mut().push("second"));
        EffectResult::default()
    });
    EFFECT_LOG.with(|log| log.borrow_mut().push("render"));
    h("div", VNodeData::new(), vec![])
}

#[test]
fn effects_run_after_the_commit_in_declaration_order() {
    reset_probes();
    let (patcher, surface, runtime, container, _counts) = fixture();
    let _instance =
        ComponentInstance::mount(surface, patcher, runtime.handle(), container, (), two_effects)
            .unwrap();
    EFFECT_LOG.with(|log| {
        assert_eq!(*log.borrow(), vec!["render", "first", "second"]);
    });
}

fn effect_with_cleanup(_: &(), ctx: &mut HookContext<'_>) -> VNode {
    let b = DEP.with(Cell::get);
    ctx.use_effect(Some((1i64, b)), move |scope| {
        EFFECT_LOG.with(|log| log.borrow_mut().push("body"));
        scope.on_dispose(|| EFFECT_LOG.with(|log| log.borrow_mut().push("cleanup")))
    });
    h("div", VNodeData::new(), vec![])
}

#[test]
fn changing_one_dep_runs_cleanup_exactly_once_before_the_new_body() {
    reset_probes();
    let (patcher, surface, runtime, container, _counts) = fixture();
    let instance = ComponentInstance::mount(
        surface,
        patcher,
        runtime.handle(),
        container,
        (),
        effect_with_cleanup,
    )
    .unwrap();
    EFFECT_LOG.with(|log| assert_eq!(*log.borrow(), vec!["body"]));

    // Unchanged deps: no rerun, no cleanup.
    instance.update().unwrap();
    EFFECT_LOG.with(|log| assert_eq!(*log.borrow(), vec!["body"]));

    DEP.with(|c| c.set(2));
    instance.update().unwrap();
    EFFECT_LOG.with(|log| {
        assert_eq!(*log.borrow(), vec!["body", "cleanup", "body"]);
    });
}

fn forced(_: &(), ctx: &mut HookContext<'_>) -> VNode {
    RENDERS.with(|c| c.set(c.get() + 1));
    let update = ctx.use_update();
    UPDATER.with(|u| *u.borrow_mut() = Some(update));
    h("div", VNodeData::new(), vec![])
}

#[test]
fn forced_update_rerenders_without_state_changes() {
    reset_probes();
    let (patcher, surface, runtime, container, _counts) = fixture();
    let _instance =
        ComponentInstance::mount(surface, patcher, runtime.handle(), container, (), forced)
            .unwrap();
    assert_eq!(RENDERS.with(Cell::get), 1);
    let update = UPDATER.with(|u| u.borrow().clone()).unwrap();
    update.trigger();
    update.trigger();
    assert_eq!(RENDERS.with(Cell::get), 3);
}

fn with_element_lookup(_: &(), ctx: &mut HookContext<'_>) -> VNode {
    let probe = ctx.use_element("needle");
    ELEMENT_PROBE.with(|p| *p.borrow_mut() = Some(probe));
    h(
        "div",
        VNodeData::new(),
        vec![
            h("p", VNodeData::new(), vec![]),
            h("span", VNodeData::new().key("needle"), vec![]),
        ],
    )
}

#[test]
fn element_lookup_resolves_the_committed_descendant() {
    reset_probes();
    let (patcher, surface, runtime, container, _counts) = fixture();
    let instance = ComponentInstance::mount(
        surface,
        patcher,
        runtime.handle(),
        container,
        (),
        with_element_lookup,
    )
    .unwrap();
    let committed = instance.committed().unwrap();
    let expected = committed.children()[1].element();
    assert!(expected.is_some());
    let probe = ELEMENT_PROBE.with(|p| p.borrow().clone()).unwrap();
    assert_eq!(probe.get(), expected);
}

fn conditional_hooks(_: &(), ctx: &mut HookContext<'_>) -> VNode {
    let (_, _) = ctx.use_state(|| 0i64);
    if EXTRA_HOOK.with(Cell::get) {
        let (_, _) = ctx.use_state(|| 1i64);
    }
    h("div", VNodeData::new(), vec![])
}

#[test]
fn hook_count_drift_is_reported_when_validation_is_on() {
    reset_probes();
    let (patcher, surface, runtime, container, _counts) = fixture();
    let instance = ComponentInstance::mount_with(
        surface,
        patcher,
        runtime.handle(),
        container,
        (),
        conditional_hooks,
        HookOptions { validate: true },
    )
    .unwrap();

    EXTRA_HOOK.with(|c| c.set(true));
    match instance.update() {
        Err(InstanceError::Hook(HookError::OrderViolation { expected, actual })) => {
            assert_eq!(expected, 1);
            assert_eq!(actual, 2);
        }
        other => panic!("expected an order violation, got {other:?}"),
    }
}

fn kind_swapping_hooks(_: &(), ctx: &mut HookContext<'_>) -> VNode {
    if SWAP_KIND.with(Cell::get) {
        let _ = ctx.use_memo(Some(0i64), || 0i64);
    } else {
        let (_, _) = ctx.use_state(|| 0i64);
    }
    h("div", VNodeData::new(), vec![])
}

#[test]
fn hook_kind_drift_is_reported_when_validation_is_on() {
    reset_probes();
    let (patcher, surface, runtime, container, _counts) = fixture();
    let instance = ComponentInstance::mount_with(
        surface,
        patcher,
        runtime.handle(),
        container,
        (),
        kind_swapping_hooks,
        HookOptions { validate: true },
    )
    .unwrap();

    SWAP_KIND.with(|c| c.set(true));
    match instance.update() {
        Err(InstanceError::Hook(HookError::SlotKind { index })) => assert_eq!(index, 0),
        other => panic!("expected a slot kind violation, got {other:?}"),
    }
}
