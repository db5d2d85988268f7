//! The patch engine: diffs two virtual trees and mutates the live surface.

use std::fmt;

use log::{debug, trace, warn};

use crate::collections::HashMap;
use crate::module::Module;
use crate::surface::{ElementId, Surface, SurfaceError};
use crate::vnode::{h, Key, VNode, VNodeData};

#[derive(Debug)]
pub enum PatchError {
    /// A node that should already be committed has no bound element.
    MissingElement { node: String },
    Surface(SurfaceError),
}

impl fmt::Display for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchError::MissingElement { node } => {
                write!(f, "node <{node}> has no bound live element")
            }
            PatchError::Surface(err) => write!(f, "surface operation failed: {err}"),
        }
    }
}

impl std::error::Error for PatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PatchError::Surface(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SurfaceError> for PatchError {
    fn from(err: SurfaceError) -> Self {
        PatchError::Surface(err)
    }
}

/// Engine-level validation switches.
#[derive(Clone, Copy, Debug)]
pub struct PatchOptions {
    /// Warn on duplicate keys within one sibling list.
    pub validate_keys: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            validate_keys: cfg!(debug_assertions),
        }
    }
}

/// Two nodes address the same live element iff their keys match (including
/// both being absent), their selectors match, and they are the same kind.
pub fn same_node(a: &VNode, b: &VNode) -> bool {
    a.key() == b.key() && a.sel() == b.sel() && a.is_text() == b.is_text()
}

/// The tree-diffing engine.
///
/// Holds the ordered module list, fixed at construction. `patch` is the sole
/// entry point for reconciliation; `unmount` tears a committed tree down.
pub struct Patcher {
    modules: Vec<Box<dyn Module>>,
    options: PatchOptions,
    empty: VNode,
}

impl Patcher {
    pub fn new(modules: Vec<Box<dyn Module>>) -> Self {
        Self::with_options(modules, PatchOptions::default())
    }

    pub fn with_options(modules: Vec<Box<dyn Module>>, options: PatchOptions) -> Self {
        Self {
            modules,
            options,
            empty: h("", VNodeData::default(), Vec::new()),
        }
    }

    /// Reconciles `new` against the committed tree `old`.
    ///
    /// `old` must be bound to a live element (a previously committed tree,
    /// or a [`placeholder`](crate::vnode::placeholder) for a first mount).
    /// On return `new` is bound throughout and is the committed tree; `old`
    /// must be treated as discarded, since its elements may have been reused
    /// or removed.
    pub fn patch(
        &self,
        surface: &mut dyn Surface,
        old: &VNode,
        new: &VNode,
    ) -> Result<VNode, PatchError> {
        if VNode::ptr_eq(old, new) {
            return Ok(new.clone());
        }
        for module in &self.modules {
            module.pre();
        }
        if same_node(old, new) {
            self.patch_node(surface, old, new)?;
        } else {
            debug!("root changed identity, replacing <{}>", old.label());
            let old_el = bound(old)?;
            let parent = surface.parent(old_el)?;
            let new_el = self.create_node(surface, new)?;
            match parent {
                Some(parent) => {
                    surface.insert_before(parent, new_el, Some(old_el))?;
                    self.notify_inserted(surface, new)?;
                    self.remove_node(surface, parent, old)?;
                }
                None => {
                    // Old root was never attached; nothing to splice out.
                    debug!("replaced root has no parent, old tree left detached");
                }
            }
        }
        for module in &self.modules {
            module.post();
        }
        Ok(new.clone())
    }

    /// Destroys and detaches a committed tree.
    pub fn unmount(&self, surface: &mut dyn Surface, node: &VNode) -> Result<(), PatchError> {
        let el = bound(node)?;
        match surface.parent(el)? {
            Some(parent) => self.remove_node(surface, parent, node),
            None => {
                if node.is_element() {
                    self.destroy_recursive(surface, node)
                } else {
                    Ok(())
                }
            }
        }
    }

    fn patch_node(
        &self,
        surface: &mut dyn Surface,
        old: &VNode,
        new: &VNode,
    ) -> Result<(), PatchError> {
        if VNode::ptr_eq(old, new) {
            return Ok(());
        }
        let el = bound(old)?;
        new.bind_element(el);

        if new.is_text() {
            if old.text() != new.text() {
                surface.set_text(el, new.text().unwrap_or_default())?;
            }
            return Ok(());
        }

        for module in &self.modules {
            module.update(surface, old, new)?;
        }

        let old_ch = old.children();
        let new_ch = new.children();
        match (old_ch.is_empty(), new_ch.is_empty()) {
            (false, false) => self.update_children(surface, el, old_ch, new_ch)?,
            (true, false) => {
                for child in new_ch {
                    let child_el = self.create_node(surface, child)?;
                    surface.insert_before(el, child_el, None)?;
                    self.notify_inserted(surface, child)?;
                }
            }
            (false, true) => {
                for child in old_ch {
                    self.remove_node(surface, el, child)?;
                }
            }
            (true, true) => {}
        }
        Ok(())
    }

    /// Keyed four-pointer reconciliation of two sibling lists.
    fn update_children(
        &self,
        surface: &mut dyn Surface,
        parent: ElementId,
        old_list: &[VNode],
        new_list: &[VNode],
    ) -> Result<(), PatchError> {
        // Slots are vacated (set to None) when a keyed match pulls a node
        // out of the middle of the range.
        let mut old: Vec<Option<VNode>> = old_list.iter().cloned().map(Some).collect();
        let mut old_start: isize = 0;
        let mut old_end: isize = old.len() as isize - 1;
        let mut new_start: isize = 0;
        let mut new_end: isize = new_list.len() as isize - 1;
        let mut key_map: Option<HashMap<Key, usize>> = None;

        while old_start <= old_end && new_start <= new_end {
            if old[old_start as usize].is_none() {
                old_start += 1;
                continue;
            }
            if old[old_end as usize].is_none() {
                old_end -= 1;
                continue;
            }
            let old_start_v = old[old_start as usize].clone().unwrap();
            let old_end_v = old[old_end as usize].clone().unwrap();
            let new_start_v = &new_list[new_start as usize];
            let new_end_v = &new_list[new_end as usize];

            if same_node(&old_start_v, new_start_v) {
                self.patch_node(surface, &old_start_v, new_start_v)?;
                old_start += 1;
                new_start += 1;
            } else if same_node(&old_end_v, new_end_v) {
                self.patch_node(surface, &old_end_v, new_end_v)?;
                old_end -= 1;
                new_end -= 1;
            } else if same_node(&old_start_v, new_end_v) {
                // Node moved toward the end of the list.
                self.patch_node(surface, &old_start_v, new_end_v)?;
                let after = surface.next_sibling(bound(&old_end_v)?)?;
                surface.insert_before(parent, bound(&old_start_v)?, after)?;
                old_start += 1;
                new_end -= 1;
            } else if same_node(&old_end_v, new_start_v) {
                // Node moved toward the front of the list.
                self.patch_node(surface, &old_end_v, new_start_v)?;
                surface.insert_before(parent, bound(&old_end_v)?, Some(bound(&old_start_v)?))?;
                old_end -= 1;
                new_start += 1;
            } else {
                let map = key_map.get_or_insert_with(|| {
                    build_key_map(
                        &old,
                        old_start as usize,
                        old_end as usize,
                        self.options.validate_keys,
                    )
                });
                let matched = new_start_v
                    .key()
                    .and_then(|key| map.get(key).copied())
                    .and_then(|idx| old[idx].clone().map(|node| (idx, node)));
                match matched {
                    Some((idx, old_match)) if same_node(&old_match, new_start_v) => {
                        // Keyed match out of order: move its element into
                        // place rather than recreating it.
                        old[idx] = None;
                        self.patch_node(surface, &old_match, new_start_v)?;
                        surface.insert_before(
                            parent,
                            bound(&old_match)?,
                            Some(bound(&old_start_v)?),
                        )?;
                    }
                    _ => {
                        // Same key with a different selector or kind falls
                        // through here too: that is a brand-new element.
                        let child_el = self.create_node(surface, new_start_v)?;
                        surface.insert_before(parent, child_el, Some(bound(&old_start_v)?))?;
                        self.notify_inserted(surface, new_start_v)?;
                    }
                }
                new_start += 1;
            }
        }

        if old_start > old_end {
            // Everything left in the new range is an insertion. The node
            // just past new_end (if any) was already patched, so its element
            // is the anchor.
            let before = new_list
                .get((new_end + 1) as usize)
                .and_then(VNode::element);
            for index in new_start..=new_end {
                let node = &new_list[index as usize];
                let child_el = self.create_node(surface, node)?;
                surface.insert_before(parent, child_el, before)?;
                self.notify_inserted(surface, node)?;
            }
        } else if new_start > new_end {
            for index in old_start..=old_end {
                if let Some(node) = old[index as usize].take() {
                    self.remove_node(surface, parent, &node)?;
                }
            }
        }
        Ok(())
    }

    /// Realizes a virtual subtree: creates live elements in pre-order,
    /// firing every module's `create` slot on each element node.
    fn create_node(
        &self,
        surface: &mut dyn Surface,
        node: &VNode,
    ) -> Result<ElementId, PatchError> {
        if let Some(content) = node.text() {
            let id = surface.create_text(content);
            node.bind_element(id);
            return Ok(id);
        }
        let sel = node.sel().unwrap_or_default();
        let id = surface.create_element(sel);
        node.bind_element(id);
        for module in &self.modules {
            module.create(surface, &self.empty, node)?;
        }
        for child in node.children() {
            let child_el = self.create_node(surface, child)?;
            surface.insert_before(id, child_el, None)?;
        }
        Ok(id)
    }

    /// Fires `insert` slots through a freshly attached subtree, pre-order.
    fn notify_inserted(&self, surface: &mut dyn Surface, node: &VNode) -> Result<(), PatchError> {
        if !node.is_element() {
            return Ok(());
        }
        for module in &self.modules {
            module.insert(surface, node)?;
        }
        for child in node.children() {
            self.notify_inserted(surface, child)?;
        }
        Ok(())
    }

    /// Fires `destroy` slots through a doomed subtree, pre-order.
    fn destroy_recursive(&self, surface: &mut dyn Surface, node: &VNode) -> Result<(), PatchError> {
        if !node.is_element() {
            return Ok(());
        }
        for module in &self.modules {
            module.destroy(surface, node)?;
        }
        for child in node.children() {
            self.destroy_recursive(surface, child)?;
        }
        Ok(())
    }

    /// Destroys `node`'s subtree, runs `remove` slots on its root, and
    /// detaches it from `parent`.
    fn remove_node(
        &self,
        surface: &mut dyn Surface,
        parent: ElementId,
        node: &VNode,
    ) -> Result<(), PatchError> {
        let el = bound(node)?;
        if node.is_element() {
            self.destroy_recursive(surface, node)?;
            let mut signalled = 0usize;
            for module in &self.modules {
                let mut done = || signalled += 1;
                module.remove(surface, node, &mut done)?;
            }
            // The resource model is synchronous: detachment happens now
            // either way, a module that never signalled just gets noted.
            if signalled < self.modules.len() {
                debug!(
                    "{} of {} modules did not signal removal of <{}>",
                    self.modules.len() - signalled,
                    self.modules.len(),
                    node.label()
                );
            }
        }
        trace!("detach <{}> ({el})", node.label());
        surface.remove_child(parent, el)?;
        Ok(())
    }
}

fn bound(node: &VNode) -> Result<ElementId, PatchError> {
    node.element().ok_or_else(|| PatchError::MissingElement {
        node: node.label(),
    })
}

fn build_key_map(
    old: &[Option<VNode>],
    start: usize,
    end: usize,
    validate: bool,
) -> HashMap<Key, usize> {
    let mut map = HashMap::default();
    for index in start..=end {
        if let Some(node) = &old[index] {
            if let Some(key) = node.key() {
                if map.insert(key.clone(), index).is_some() && validate {
                    warn!("duplicate key \"{key}\" among siblings");
                }
            }
        }
    }
    map
}
