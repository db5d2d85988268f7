//! Class-list reconciliation.

use trellis_core::surface::{AttrEdit, Surface, SurfaceError};
use trellis_core::vnode::VNode;
use trellis_core::Module;

/// Applies the `class` namespace: a map from class name to an on/off flag.
///
/// Only differences generate edits; a class present and truthy on both
/// sides is left untouched.
pub struct ClassModule;

impl ClassModule {
    fn diff(
        &self,
        surface: &mut dyn Surface,
        old: &VNode,
        new: &VNode,
    ) -> Result<(), SurfaceError> {
        let el = match new.element() {
            Some(el) => el,
            None => return Ok(()),
        };
        let old_classes = old.data().classes();
        let new_classes = new.data().classes();

        for (name, on) in old_classes {
            if !*on {
                continue;
            }
            if !new_classes.get(name).copied().unwrap_or(false) {
                surface.apply(el, AttrEdit::RemoveClass(name.clone()))?;
            }
        }
        for (name, on) in new_classes {
            if !*on {
                continue;
            }
            if !old_classes.get(name).copied().unwrap_or(false) {
                surface.apply(el, AttrEdit::AddClass(name.clone()))?;
            }
        }
        Ok(())
    }
}

impl Module for ClassModule {
    fn create(
        &self,
        surface: &mut dyn Surface,
        old: &VNode,
        new: &VNode,
    ) -> Result<(), SurfaceError> {
        self.diff(surface, old, new)
    }

    fn update(
        &self,
        surface: &mut dyn Surface,
        old: &VNode,
        new: &VNode,
    ) -> Result<(), SurfaceError> {
        self.diff(surface, old, new)
    }
}
