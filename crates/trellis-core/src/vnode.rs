//! The virtual tree value model.
//!
//! A [`VNode`] is a cheap shared handle describing either an element (a
//! selector plus an attribute bag and children) or a piece of text. Nodes
//! carry no behavior; the [`Patcher`](crate::patch::Patcher) walks two trees
//! and decides what to mutate. Once a node has been committed to a live
//! surface its realized element is recorded on the node itself, and from
//! then on that binding is the only channel through which mutations reach
//! the surface.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::surface::ElementId;

/// Sibling identity for keyed reconciliation.
///
/// Keys must be unique among one sibling list; a node without a key is
/// matched by position only.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Str(String),
    Num(i64),
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.to_owned())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Num(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Num(value as i64)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => write!(f, "{s}"),
            Key::Num(n) => write!(f, "{n}"),
        }
    }
}

/// A plain property value.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

/// An event listener handle.
///
/// Listeners are compared by identity when diffing, so a stable handle
/// (e.g. one memoized across renders) never causes a re-attach.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn()>);

impl Listener {
    pub fn new(f: impl Fn() + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self) {
        (self.0)()
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0))
    }
}

/// The attribute bag of an element node: four closed namespaces plus the
/// sibling key. The patch engine never looks inside the namespaces; each is
/// diffed by its owning module.
#[derive(Clone, Default)]
pub struct VNodeData {
    key: Option<Key>,
    class: IndexMap<String, bool>,
    style: IndexMap<String, String>,
    props: IndexMap<String, PropValue>,
    on: IndexMap<String, Listener>,
}

impl VNodeData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn class(mut self, name: impl Into<String>, on: bool) -> Self {
        self.class.insert(name.into(), on);
        self
    }

    pub fn style(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.insert(name.into(), value.into());
        self
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    pub fn on(mut self, event: impl Into<String>, listener: Listener) -> Self {
        self.on.insert(event.into(), listener);
        self
    }

    pub fn classes(&self) -> &IndexMap<String, bool> {
        &self.class
    }

    pub fn styles(&self) -> &IndexMap<String, String> {
        &self.style
    }

    pub fn props(&self) -> &IndexMap<String, PropValue> {
        &self.props
    }

    pub fn listeners(&self) -> &IndexMap<String, Listener> {
        &self.on
    }
}

struct VNodeInner {
    sel: Option<String>,
    data: VNodeData,
    children: Vec<VNode>,
    text: Option<String>,
    key: Option<Key>,
    element: Cell<Option<ElementId>>,
}

/// A node of the virtual tree.
///
/// Handles are cheap to clone; the committed tree held by a component
/// instance and the tree being patched share nodes freely. Reference
/// identity (`VNode::ptr_eq`) is what the patch engine's no-op fast path
/// keys on.
#[derive(Clone)]
pub struct VNode {
    inner: Rc<VNodeInner>,
}

impl VNode {
    /// The element selector, absent for text nodes.
    pub fn sel(&self) -> Option<&str> {
        self.inner.sel.as_deref()
    }

    /// The text content, absent for element nodes.
    pub fn text(&self) -> Option<&str> {
        self.inner.text.as_deref()
    }

    pub fn key(&self) -> Option<&Key> {
        self.inner.key.as_ref()
    }

    pub fn data(&self) -> &VNodeData {
        &self.inner.data
    }

    /// Ordered children; empty for text nodes and childless elements.
    pub fn children(&self) -> &[VNode] {
        &self.inner.children
    }

    pub fn is_text(&self) -> bool {
        self.inner.text.is_some()
    }

    pub fn is_element(&self) -> bool {
        self.inner.sel.is_some()
    }

    /// The realized live element, once committed.
    pub fn element(&self) -> Option<ElementId> {
        self.inner.element.get()
    }

    pub(crate) fn bind_element(&self, id: ElementId) {
        self.inner.element.set(Some(id));
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    /// Depth-first search of the subtree for a node carrying `key`.
    pub fn descendant_by_key(&self, key: &Key) -> Option<VNode> {
        if self.key() == Some(key) {
            return Some(self.clone());
        }
        self.children()
            .iter()
            .find_map(|child| child.descendant_by_key(key))
    }

    /// A short label for diagnostics: the selector, or `#text`.
    pub(crate) fn label(&self) -> String {
        match self.sel() {
            Some(sel) => sel.to_owned(),
            None => String::from("#text"),
        }
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("VNode");
        if let Some(sel) = self.sel() {
            s.field("sel", &sel);
        }
        if let Some(text) = self.text() {
            s.field("text", &text);
        }
        if let Some(key) = self.key() {
            s.field("key", key);
        }
        if let Some(element) = self.element() {
            s.field("element", &element);
        }
        if !self.children().is_empty() {
            s.field("children", &self.children().len());
        }
        s.finish()
    }
}

/// Builds an element node.
pub fn h(sel: impl Into<String>, data: VNodeData, children: Vec<VNode>) -> VNode {
    let key = data.key.clone();
    VNode {
        inner: Rc::new(VNodeInner {
            sel: Some(sel.into()),
            data,
            children,
            text: None,
            key,
            element: Cell::new(None),
        }),
    }
}

/// Builds a text node.
pub fn text(content: impl Into<String>) -> VNode {
    VNode {
        inner: Rc::new(VNodeInner {
            sel: None,
            data: VNodeData::default(),
            children: Vec::new(),
            text: Some(content.into()),
            key: None,
            element: Cell::new(None),
        }),
    }
}

/// Builds a text node carrying a sibling key.
pub fn keyed_text(key: impl Into<Key>, content: impl Into<String>) -> VNode {
    VNode {
        inner: Rc::new(VNodeInner {
            sel: None,
            data: VNodeData::default(),
            children: Vec::new(),
            text: Some(content.into()),
            key: Some(key.into()),
            element: Cell::new(None),
        }),
    }
}

/// A synthetic empty node bound to an existing live element.
///
/// This is the starting point for a first patch: the placeholder never
/// matches a real tree in the same-node test, so the engine takes the
/// replace path and the placeholder's element is removed once the real tree
/// is in place.
pub fn placeholder(element: ElementId) -> VNode {
    let node = h("", VNodeData::default(), Vec::new());
    node.bind_element(element);
    node
}
