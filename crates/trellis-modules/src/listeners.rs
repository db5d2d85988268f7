//! Event-listener attachment.

use trellis_core::surface::{AttrEdit, Surface, SurfaceError};
use trellis_core::vnode::{Listener, VNode};
use trellis_core::Module;

/// Applies the `on` namespace: a map from event name to listener handle.
///
/// Handles are compared by identity, so a memoized listener survives
/// re-renders without a detach/attach round trip.
pub struct ListenerModule;

impl ListenerModule {
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
        let old_listeners = old.data().listeners();
        let new_listeners = new.data().listeners();

        for event in old_listeners.keys() {
            if !new_listeners.contains_key(event) {
                surface.apply(el, AttrEdit::RemoveListener(event.clone()))?;
            }
        }
        for (event, listener) in new_listeners {
            let unchanged = old_listeners
                .get(event)
                .map(|previous| Listener::ptr_eq(previous, listener))
                .unwrap_or(false);
            if !unchanged {
                surface.apply(el, AttrEdit::AddListener(event.clone(), listener.clone()))?;
            }
        }
        Ok(())
    }
}

impl Module for ListenerModule {
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

    fn destroy(&self, surface: &mut dyn Surface, node: &VNode) -> Result<(), SurfaceError> {
        let el = match node.element() {
            Some(el) => el,
            None => return Ok(()),
        };
        for event in node.data().listeners().keys() {
            surface.apply(el, AttrEdit::RemoveListener(event.clone()))?;
        }
        Ok(())
    }
}
