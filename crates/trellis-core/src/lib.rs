#![doc = r"Core pieces of the Trellis retained-tree runtime.

A caller describes the desired interface as a lightweight virtual tree
([`VNode`]), and the [`Patcher`] reconciles successive versions of that tree
against a live [`Surface`], applying the minimal set of structural mutations.
Attribute handling is delegated to pluggable [`Module`] implementations that
are dispatched at fixed lifecycle points. The [`runtime`] module provides the
single-threaded task queue that deferred work (such as hook effects) rides
on."]

pub mod collections;
pub mod hash;
pub mod module;
pub mod owned;
pub mod patch;
pub mod runtime;
pub mod surface;
pub mod vnode;

pub use module::Module;
pub use owned::Owned;
pub use patch::{PatchError, PatchOptions, Patcher};
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle, Scheduler};
pub use surface::{AttrEdit, ElementId, MemorySurface, Surface, SurfaceError};
pub use vnode::{h, keyed_text, placeholder, text, Key, Listener, PropValue, VNode, VNodeData};

#[cfg(test)]
mod tests;
