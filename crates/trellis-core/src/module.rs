//! The lifecycle-callback contract side-effect modules implement.

use crate::surface::{Surface, SurfaceError};
use crate::vnode::VNode;

/// A pluggable translator from one attribute namespace to surface edits.
///
/// Modules are registered once at [`Patcher`](crate::patch::Patcher)
/// construction and invoked in registration order at each lifecycle point.
/// Every slot is optional; the defaults do nothing. The engine hands modules
/// the old/new node pair and never interprets namespace contents itself.
pub trait Module {
    /// Fires once before a root patch begins.
    fn pre(&self) {}

    /// A live element was just created for `new`. `old` is the engine's
    /// empty node, so a plain diff against it applies every attribute.
    fn create(
        &self,
        _surface: &mut dyn Surface,
        _old: &VNode,
        _new: &VNode,
    ) -> Result<(), SurfaceError> {
        Ok(())
    }

    /// `new` reuses `old`'s live element; reconcile the namespace.
    fn update(
        &self,
        _surface: &mut dyn Surface,
        _old: &VNode,
        _new: &VNode,
    ) -> Result<(), SurfaceError> {
        Ok(())
    }

    /// `node` (or an ancestor) is being removed from the surface. Fired
    /// top-down through the doomed subtree before detachment.
    fn destroy(&self, _surface: &mut dyn Surface, _node: &VNode) -> Result<(), SurfaceError> {
        Ok(())
    }

    /// `node` is the root of a subtree being detached. `done` must be
    /// invoked to signal completion; the element is detached once every
    /// module has signalled.
    fn remove(
        &self,
        _surface: &mut dyn Surface,
        _node: &VNode,
        done: &mut dyn FnMut(),
    ) -> Result<(), SurfaceError> {
        done();
        Ok(())
    }

    /// `node`'s freshly created element is now attached to the surface.
    fn insert(&self, _surface: &mut dyn Surface, _node: &VNode) -> Result<(), SurfaceError> {
        Ok(())
    }

    /// Fires once after a root patch completes.
    fn post(&self) {}
}
