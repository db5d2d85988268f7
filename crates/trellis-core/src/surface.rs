//! The live surface: an addressable tree of elements the engine mutates.
//!
//! The reconciliation algorithm only ever needs a small fixed operation set,
//! so any concrete rendering target (a browser document, a native widget
//! tree, a terminal grid) can sit behind [`Surface`] without the engine
//! changing. Attribute-level mutation goes through a single namespaced entry
//! point, [`Surface::apply`]; the engine itself only performs structural
//! operations.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use log::trace;

use crate::vnode::{Listener, PropValue};

/// Opaque handle to a live element.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ElementId(usize);

impl ElementId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One attribute-namespace mutation.
#[derive(Clone, Debug)]
pub enum AttrEdit {
    AddClass(String),
    RemoveClass(String),
    SetStyle(String, String),
    RemoveStyle(String),
    SetProp(String, PropValue),
    RemoveProp(String),
    AddListener(String, Listener),
    RemoveListener(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    Missing { id: ElementId },
    NotAChild { parent: ElementId, child: ElementId },
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::Missing { id } => write!(f, "element {id} missing"),
            SurfaceError::NotAChild { parent, child } => {
                write!(f, "element {child} is not a child of {parent}")
            }
        }
    }
}

impl std::error::Error for SurfaceError {}

/// The fixed operation set of a live surface.
pub trait Surface {
    fn create_element(&mut self, sel: &str) -> ElementId;
    fn create_text(&mut self, content: &str) -> ElementId;

    /// Inserts `child` under `parent`, before `before` (append when `None`).
    /// A child already attached elsewhere is moved, not duplicated.
    fn insert_before(
        &mut self,
        parent: ElementId,
        child: ElementId,
        before: Option<ElementId>,
    ) -> Result<(), SurfaceError>;

    fn remove_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), SurfaceError>;

    fn set_text(&mut self, node: ElementId, content: &str) -> Result<(), SurfaceError>;

    fn parent(&self, node: ElementId) -> Result<Option<ElementId>, SurfaceError>;

    fn next_sibling(&self, node: ElementId) -> Result<Option<ElementId>, SurfaceError>;

    /// Applies one attribute-namespace mutation to `node`.
    fn apply(&mut self, node: ElementId, edit: AttrEdit) -> Result<(), SurfaceError>;
}

/// One element of the in-memory surface.
#[derive(Debug)]
pub struct ElementRecord {
    sel: Option<String>,
    text: Option<String>,
    classes: IndexSet<String>,
    styles: IndexMap<String, String>,
    props: IndexMap<String, PropValue>,
    listeners: IndexMap<String, Listener>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl ElementRecord {
    fn element(sel: &str) -> Self {
        Self {
            sel: Some(sel.to_owned()),
            text: None,
            classes: IndexSet::new(),
            styles: IndexMap::new(),
            props: IndexMap::new(),
            listeners: IndexMap::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    fn text_node(content: &str) -> Self {
        Self {
            sel: None,
            text: Some(content.to_owned()),
            classes: IndexSet::new(),
            styles: IndexMap::new(),
            props: IndexMap::new(),
            listeners: IndexMap::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn sel(&self) -> Option<&str> {
        self.sel.as_deref()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.contains(name)
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    pub fn style(&self, name: &str) -> Option<&str> {
        self.styles.get(name).map(String::as_str)
    }

    pub fn prop(&self, name: &str) -> Option<&PropValue> {
        self.props.get(name)
    }

    pub fn listener(&self, event: &str) -> Option<&Listener> {
        self.listeners.get(event)
    }
}

/// Running totals of structural mutations, for diagnostics and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurfaceStats {
    pub created: usize,
    pub inserted: usize,
    pub removed: usize,
    pub text_set: usize,
}

/// An in-memory [`Surface`] backed by a slab of element records.
///
/// This is the surface the test suites drive; it doubles as a reference for
/// what a real rendering target must implement.
#[derive(Default)]
pub struct MemorySurface {
    nodes: Vec<Option<ElementRecord>>,
    stats: SurfaceStats,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, id: ElementId) -> Result<&ElementRecord, SurfaceError> {
        self.nodes
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(SurfaceError::Missing { id })
    }

    fn record_mut(&mut self, id: ElementId) -> Result<&mut ElementRecord, SurfaceError> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(SurfaceError::Missing { id })
    }

    fn push(&mut self, record: ElementRecord) -> ElementId {
        let id = ElementId(self.nodes.len());
        self.nodes.push(Some(record));
        self.stats.created += 1;
        id
    }

    /// Detaches `child` from whatever parent currently holds it.
    fn detach(&mut self, child: ElementId) -> Result<(), SurfaceError> {
        let parent = self.record(child)?.parent;
        if let Some(parent) = parent {
            let record = self.record_mut(parent)?;
            record.children.retain(|c| *c != child);
            self.record_mut(child)?.parent = None;
        }
        Ok(())
    }

    pub fn stats(&self) -> SurfaceStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = SurfaceStats::default();
    }

    /// Renders the subtree under `root` as an indented listing.
    pub fn dump_tree(&self, root: ElementId) -> String {
        let mut output = String::new();
        self.dump_node(&mut output, root, 0);
        output
    }

    fn dump_node(&self, output: &mut String, id: ElementId, depth: usize) {
        let indent = "  ".repeat(depth);
        match self.record(id) {
            Ok(record) => {
                let label = record
                    .sel()
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("{:?}", record.text().unwrap_or("")));
                output.push_str(&format!("{indent}[{id}] {label}\n"));
                for child in record.children.clone() {
                    self.dump_node(output, child, depth + 1);
                }
            }
            Err(_) => {
                output.push_str(&format!("{indent}[{id}] (missing)\n"));
            }
        }
    }
}

impl Surface for MemorySurface {
    fn create_element(&mut self, sel: &str) -> ElementId {
        let id = self.push(ElementRecord::element(sel));
        trace!("create element {id} <{sel}>");
        id
    }

    fn create_text(&mut self, content: &str) -> ElementId {
        let id = self.push(ElementRecord::text_node(content));
        trace!("create text {id} {content:?}");
        id
    }

    fn insert_before(
        &mut self,
        parent: ElementId,
        child: ElementId,
        before: Option<ElementId>,
    ) -> Result<(), SurfaceError> {
        self.record(parent)?;
        self.detach(child)?;
        let position = match before {
            Some(anchor) => {
                let record = self.record(parent)?;
                record
                    .children
                    .iter()
                    .position(|c| *c == anchor)
                    .ok_or(SurfaceError::NotAChild {
                        parent,
                        child: anchor,
                    })?
            }
            None => self.record(parent)?.children.len(),
        };
        self.record_mut(parent)?.children.insert(position, child);
        self.record_mut(child)?.parent = Some(parent);
        self.stats.inserted += 1;
        trace!("insert {child} under {parent} at {position}");
        Ok(())
    }

    fn remove_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), SurfaceError> {
        let record = self.record_mut(parent)?;
        let position = record
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or(SurfaceError::NotAChild { parent, child })?;
        record.children.remove(position);
        self.record_mut(child)?.parent = None;
        self.stats.removed += 1;
        trace!("remove {child} from {parent}");
        Ok(())
    }

    fn set_text(&mut self, node: ElementId, content: &str) -> Result<(), SurfaceError> {
        let record = self.record_mut(node)?;
        record.text = Some(content.to_owned());
        self.stats.text_set += 1;
        Ok(())
    }

    fn parent(&self, node: ElementId) -> Result<Option<ElementId>, SurfaceError> {
        Ok(self.record(node)?.parent)
    }

    fn next_sibling(&self, node: ElementId) -> Result<Option<ElementId>, SurfaceError> {
        let parent = match self.record(node)?.parent {
            Some(parent) => parent,
            None => return Ok(None),
        };
        let siblings = &self.record(parent)?.children;
        let position = siblings
            .iter()
            .position(|c| *c == node)
            .ok_or(SurfaceError::NotAChild {
                parent,
                child: node,
            })?;
        Ok(siblings.get(position + 1).copied())
    }

    fn apply(&mut self, node: ElementId, edit: AttrEdit) -> Result<(), SurfaceError> {
        let record = self.record_mut(node)?;
        match edit {
            AttrEdit::AddClass(name) => {
                record.classes.insert(name);
            }
            AttrEdit::RemoveClass(name) => {
                record.classes.shift_remove(&name);
            }
            AttrEdit::SetStyle(name, value) => {
                record.styles.insert(name, value);
            }
            AttrEdit::RemoveStyle(name) => {
                record.styles.shift_remove(&name);
            }
            AttrEdit::SetProp(name, value) => {
                record.props.insert(name, value);
            }
            AttrEdit::RemoveProp(name) => {
                record.props.shift_remove(&name);
            }
            AttrEdit::AddListener(event, listener) => {
                record.listeners.insert(event, listener);
            }
            AttrEdit::RemoveListener(event) => {
                record.listeners.shift_remove(&event);
            }
        }
        Ok(())
    }
}
