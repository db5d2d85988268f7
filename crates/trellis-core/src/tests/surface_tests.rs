use crate::surface::{AttrEdit, MemorySurface, Surface, SurfaceError};
use crate::vnode::{Listener, PropValue};

fn surface_with_children(count: usize) -> (MemorySurface, crate::ElementId, Vec<crate::ElementId>) {
    let mut surface = MemorySurface::new();
    let parent = surface.create_element("ul");
    let mut children = Vec::new();
    for index in 0..count {
        let child = surface.create_element(&format!("li{index}"));
        surface.insert_before(parent, child, None).unwrap();
        children.push(child);
    }
    (surface, parent, children)
}

#[test]
fn append_and_anchor_insertion() {
    let (mut surface, parent, children) = surface_with_children(2);
    let extra = surface.create_element("li2");
    surface
        .insert_before(parent, extra, Some(children[1]))
        .unwrap();
    assert_eq!(
        surface.record(parent).unwrap().children(),
        &[children[0], extra, children[1]]
    );
}

#[test]
fn inserting_an_attached_child_moves_it() {
    let (mut surface, parent, children) = surface_with_children(3);
    // Move the last child to the front.
    surface
        .insert_before(parent, children[2], Some(children[0]))
        .unwrap();
    assert_eq!(
        surface.record(parent).unwrap().children(),
        &[children[2], children[0], children[1]]
    );
    assert_eq!(surface.parent(children[2]).unwrap(), Some(parent));
}

#[test]
fn remove_detaches_and_clears_parent() {
    let (mut surface, parent, children) = surface_with_children(2);
    surface.remove_child(parent, children[0]).unwrap();
    assert_eq!(surface.record(parent).unwrap().children(), &[children[1]]);
    assert_eq!(surface.parent(children[0]).unwrap(), None);
}

#[test]
fn removing_a_stranger_is_an_error() {
    let (mut surface, parent, _children) = surface_with_children(1);
    let stranger = surface.create_element("div");
    assert_eq!(
        surface.remove_child(parent, stranger),
        Err(SurfaceError::NotAChild {
            parent,
            child: stranger
        })
    );
}

#[test]
fn next_sibling_walks_the_child_list() {
    let (surface, _parent, children) = surface_with_children(3);
    assert_eq!(surface.next_sibling(children[0]).unwrap(), Some(children[1]));
    assert_eq!(surface.next_sibling(children[2]).unwrap(), None);
}

#[test]
fn set_text_overwrites_content() {
    let mut surface = MemorySurface::new();
    let node = surface.create_text("before");
    surface.set_text(node, "after").unwrap();
    assert_eq!(surface.record(node).unwrap().text(), Some("after"));
}

#[test]
fn attribute_edits_round_through_the_record() {
    let mut surface = MemorySurface::new();
    let el = surface.create_element("input");
    surface.apply(el, AttrEdit::AddClass("focused".into())).unwrap();
    surface
        .apply(el, AttrEdit::SetStyle("width".into(), "10px".into()))
        .unwrap();
    surface
        .apply(el, AttrEdit::SetProp("value".into(), PropValue::Str("x".into())))
        .unwrap();
    surface
        .apply(el, AttrEdit::AddListener("press".into(), Listener::new(|| {})))
        .unwrap();

    let record = surface.record(el).unwrap();
    assert!(record.has_class("focused"));
    assert_eq!(record.style("width"), Some("10px"));
    assert_eq!(record.prop("value"), Some(&PropValue::Str("x".into())));
    assert!(record.listener("press").is_some());

    surface
        .apply(el, AttrEdit::RemoveClass("focused".into()))
        .unwrap();
    surface.apply(el, AttrEdit::RemoveListener("press".into())).unwrap();
    let record = surface.record(el).unwrap();
    assert!(!record.has_class("focused"));
    assert!(record.listener("press").is_none());
}

#[test]
fn missing_elements_surface_as_errors() {
    let surface = MemorySurface::new();
    let ghost = {
        let mut other = MemorySurface::new();
        other.create_element("div")
    };
    assert_eq!(
        surface.record(ghost).unwrap_err(),
        SurfaceError::Missing { id: ghost }
    );
}

#[test]
fn dump_tree_lists_the_subtree() {
    let (mut surface, parent, _children) = surface_with_children(2);
    let note = surface.create_text("hi");
    surface.insert_before(parent, note, None).unwrap();
    let dump = surface.dump_tree(parent);
    assert!(dump.contains("ul"));
    assert!(dump.contains("li0"));
    assert!(dump.contains("li1"));
    assert!(dump.contains("hi"));
}
