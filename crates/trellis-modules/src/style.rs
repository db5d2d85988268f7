//! Inline-style reconciliation.

use trellis_core::surface::{AttrEdit, Surface, SurfaceError};
use trellis_core::vnode::VNode;
use trellis_core::Module;

/// Applies the `style` namespace: a map from style property to value.
pub struct StyleModule;

impl StyleModule {
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
        let old_styles = old.data().styles();
        let new_styles = new.data().styles();

        for name in old_styles.keys() {
            if !new_styles.contains_key(name) {
                surface.apply(el, AttrEdit::RemoveStyle(name.clone()))?;
            }
        }
        for (name, value) in new_styles {
            if old_styles.get(name) != Some(value) {
                surface.apply(el, AttrEdit::SetStyle(name.clone(), value.clone()))?;
            }
        }
        Ok(())
    }
}

impl Module for StyleModule {
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
