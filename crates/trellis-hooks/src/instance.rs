//! The component instance wrapper: one hook context, one committed tree.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use log::{debug, error, warn};

use trellis_core::patch::{PatchError, Patcher};
use trellis_core::surface::{ElementId, Surface};
use trellis_core::vnode::{placeholder, VNode};
use trellis_core::RuntimeHandle;

use crate::context::{HookContext, HookError, HookOptions, HookSlots};

/// Where an instance is in its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Mounting,
    Idle,
    Updating,
    Destroyed,
}

#[derive(Debug)]
pub enum InstanceError {
    /// No tree has been committed yet.
    NotMounted,
    /// The instance was torn down; it will never render again.
    Destroyed,
    /// An update was requested while a render/patch cycle was running.
    UpdateInProgress,
    Hook(HookError),
    Patch(PatchError),
}

impl fmt::Display for InstanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceError::NotMounted => write!(f, "instance has no committed tree yet"),
            InstanceError::Destroyed => write!(f, "instance was destroyed"),
            InstanceError::UpdateInProgress => {
                write!(f, "update requested during an active render cycle")
            }
            InstanceError::Hook(err) => write!(f, "{err}"),
            InstanceError::Patch(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for InstanceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InstanceError::Hook(err) => Some(err),
            InstanceError::Patch(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HookError> for InstanceError {
    fn from(err: HookError) -> Self {
        InstanceError::Hook(err)
    }
}

impl From<PatchError> for InstanceError {
    fn from(err: PatchError) -> Self {
        InstanceError::Patch(err)
    }
}

pub(crate) trait Updatable {
    fn request_update(&self);
}

/// A weak, clonable trigger that re-renders its instance.
///
/// State setters and `use_update` carry one of these. Triggering after the
/// instance is gone is a logged no-op rather than an error — setters
/// routinely outlive teardown.
#[derive(Clone)]
pub struct UpdateHandle {
    target: Weak<dyn Updatable>,
}

impl UpdateHandle {
    pub fn trigger(&self) {
        match self.target.upgrade() {
            Some(target) => target.request_update(),
            None => warn!("update requested after instance teardown"),
        }
    }
}

impl fmt::Debug for UpdateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UpdateHandle")
    }
}

struct InstanceShared<P, S: Surface> {
    lifecycle: Cell<Lifecycle>,
    hooks: RefCell<HookSlots>,
    committed: Rc<RefCell<Option<VNode>>>,
    surface: Rc<RefCell<S>>,
    patcher: Patcher,
    runtime: RuntimeHandle,
    props: RefCell<P>,
    render: Box<dyn Fn(&P, &mut HookContext<'_>) -> VNode>,
    // Installed right after construction; the weak self-reference pattern.
    self_handle: RefCell<Option<UpdateHandle>>,
}

impl<P: 'static, S: Surface + 'static> InstanceShared<P, S> {
    fn update_handle(&self) -> UpdateHandle {
        self.self_handle
            .borrow()
            .clone()
            .expect("update handle installed at construction")
    }

    fn render_and_commit(&self) -> Result<(), InstanceError> {
        let update = self.update_handle();
        let new_tree = {
            let mut slots = self.hooks.borrow_mut();
            slots.begin();
            let tree = {
                let props = self.props.borrow();
                let mut ctx = HookContext::new(
                    &mut slots,
                    self.runtime.clone(),
                    update,
                    Rc::clone(&self.committed),
                );
                (self.render)(&props, &mut ctx)
            };
            slots.finish()?;
            tree
        };
        let old = self
            .committed
            .borrow()
            .clone()
            .ok_or(InstanceError::NotMounted)?;
        let committed = {
            let mut surface = self.surface.borrow_mut();
            self.patcher.patch(&mut *surface, &old, &new_tree)?
        };
        *self.committed.borrow_mut() = Some(committed);
        Ok(())
    }

    fn perform_update(&self) -> Result<(), InstanceError> {
        match self.lifecycle.get() {
            Lifecycle::Destroyed => return Err(InstanceError::Destroyed),
            Lifecycle::Mounting | Lifecycle::Updating => {
                return Err(InstanceError::UpdateInProgress)
            }
            Lifecycle::Idle => {}
        }
        self.lifecycle.set(Lifecycle::Updating);
        let result = self.render_and_commit();
        self.lifecycle.set(Lifecycle::Idle);
        result?;
        self.runtime.drain_tasks();
        Ok(())
    }
}

impl<P: 'static, S: Surface + 'static> Updatable for InstanceShared<P, S> {
    fn request_update(&self) {
        if let Err(err) = self.perform_update() {
            error!("update request rejected: {err}");
        }
    }
}

/// Owns one component: its hook slots, its committed tree, and the wiring
/// that re-renders it when state changes.
pub struct ComponentInstance<P, S: Surface> {
    shared: Rc<InstanceShared<P, S>>,
}

impl<P: 'static, S: Surface + 'static> ComponentInstance<P, S> {
    /// Renders the component for the first time under `container` and
    /// commits the result.
    pub fn mount(
        surface: Rc<RefCell<S>>,
        patcher: Patcher,
        runtime: RuntimeHandle,
        container: ElementId,
        props: P,
        render: impl Fn(&P, &mut HookContext<'_>) -> VNode + 'static,
    ) -> Result<Self, InstanceError> {
        Self::mount_with(
            surface,
            patcher,
            runtime,
            container,
            props,
            render,
            HookOptions::default(),
        )
    }

    pub fn mount_with(
        surface: Rc<RefCell<S>>,
        patcher: Patcher,
        runtime: RuntimeHandle,
        container: ElementId,
        props: P,
        render: impl Fn(&P, &mut HookContext<'_>) -> VNode + 'static,
        options: HookOptions,
    ) -> Result<Self, InstanceError> {
        let shared = Rc::new(InstanceShared {
            lifecycle: Cell::new(Lifecycle::Mounting),
            hooks: RefCell::new(HookSlots::new(options)),
            committed: Rc::new(RefCell::new(None)),
            surface,
            patcher,
            runtime,
            props: RefCell::new(props),
            render: Box::new(render),
            self_handle: RefCell::new(None),
        });
        let target: Rc<dyn Updatable> = shared.clone();
        *shared.self_handle.borrow_mut() = Some(UpdateHandle {
            target: Rc::downgrade(&target),
        });

        // First mount patches against a placeholder bound to a fresh
        // element, so the engine's replace path does the heavy lifting.
        {
            let mut surface = shared.surface.borrow_mut();
            let slot = surface.create_element("");
            surface
                .insert_before(container, slot, None)
                .map_err(PatchError::from)?;
            *shared.committed.borrow_mut() = Some(placeholder(slot));
        }
        shared.render_and_commit()?;
        shared.lifecycle.set(Lifecycle::Idle);
        debug!("instance mounted");
        shared.runtime.drain_tasks();
        Ok(Self { shared })
    }

    /// Re-runs the component function and patches against the committed
    /// tree.
    pub fn update(&self) -> Result<(), InstanceError> {
        self.shared.perform_update()
    }

    /// Replaces the props and re-renders.
    pub fn set_props(&self, props: P) -> Result<(), InstanceError> {
        *self.shared.props.borrow_mut() = props;
        self.shared.perform_update()
    }

    /// Tears the instance down: removes the committed tree from the
    /// surface, runs every pending effect cleanup, and rejects all future
    /// updates.
    pub fn destroy(&self) -> Result<(), InstanceError> {
        match self.shared.lifecycle.get() {
            Lifecycle::Destroyed => return Err(InstanceError::Destroyed),
            Lifecycle::Mounting | Lifecycle::Updating => {
                return Err(InstanceError::UpdateInProgress)
            }
            Lifecycle::Idle => {}
        }
        let root = self.shared.committed.borrow_mut().take();
        if let Some(root) = root {
            if root.element().is_some() {
                let mut surface = self.shared.surface.borrow_mut();
                self.shared.patcher.unmount(&mut *surface, &root)?;
            }
        }
        self.shared.hooks.borrow_mut().teardown();
        self.shared.lifecycle.set(Lifecycle::Destroyed);
        debug!("instance destroyed");
        self.shared.runtime.drain_tasks();
        Ok(())
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.lifecycle.get()
    }

    /// The committed tree, once mounted.
    pub fn committed(&self) -> Option<VNode> {
        self.shared.committed.borrow().clone()
    }

    /// The live element of the committed root.
    pub fn root_element(&self) -> Option<ElementId> {
        self.committed().and_then(|root| root.element())
    }

    /// A trigger equivalent to the one `use_update` hands out.
    pub fn update_handle(&self) -> UpdateHandle {
        self.shared.update_handle()
    }
}
