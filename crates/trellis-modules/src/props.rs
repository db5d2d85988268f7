//! Plain-property reconciliation.

use trellis_core::surface::{AttrEdit, Surface, SurfaceError};
use trellis_core::vnode::VNode;
use trellis_core::Module;

/// Applies the `props` namespace: a map from property name to value,
/// compared by value equality.
pub struct PropsModule;

impl PropsModule {
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
        let old_props = old.data().props();
        let new_props = new.data().props();

        for name in old_props.keys() {
            if !new_props.contains_key(name) {
                surface.apply(el, AttrEdit::RemoveProp(name.clone()))?;
            }
        }
        for (name, value) in new_props {
            if old_props.get(name) != Some(value) {
                surface.apply(el, AttrEdit::SetProp(name.clone(), value.clone()))?;
            }
        }
        Ok(())
    }
}

impl Module for PropsModule {
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

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::vnode::{h, placeholder, PropValue, VNodeData};
    use trellis_core::{MemorySurface, Patcher, Surface as _, VNode};

    fn mount(surface: &mut MemorySurface, patcher: &Patcher, node: &VNode) -> VNode {
        let container = surface.create_element("root");
        let slot = surface.create_element("");
        surface.insert_before(container, slot, None).unwrap();
        patcher.patch(surface, &placeholder(slot), node).unwrap()
    }

    #[test]
    fn writes_new_values_and_clears_vanished_ones() {
        let mut surface = MemorySurface::new();
        let patcher = Patcher::new(vec![Box::new(PropsModule)]);
        let first = h(
            "input",
            VNodeData::new().prop("value", "hi").prop("disabled", true),
            vec![],
        );
        let committed = mount(&mut surface, &patcher, &first);

        let second = h("input", VNodeData::new().prop("value", "bye"), vec![]);
        let committed = patcher.patch(&mut surface, &committed, &second).unwrap();
        let record = surface.record(committed.element().unwrap()).unwrap();
        assert_eq!(record.prop("value"), Some(&PropValue::Str("bye".into())));
        assert_eq!(record.prop("disabled"), None);
    }
}
