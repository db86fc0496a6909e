//! `patch` (§4.4.1): the core dispatch, plus mount/unmount for the variants
//! that don't need a full component lifecycle (Element/Text/Comment/
//! Static/Fragment). Component mount/update lives in
//! [`crate::renderer::component_patch`]; Teleport/Suspense are out of scope
//! (spec.md §1: "their integration points with the renderer are named;
//! their internals are not specified").

use crate::renderer::children::{diff_keyed, diff_unkeyed, ChildOp};
use crate::renderer::host::{HostBackend, HostHandle};
use crate::renderer::instance::{AppContext, ComponentInstance};
use crate::vnode::{node_ref, same_vnode_type, Children, PropValue, ShapeFlags, SpecialKind, VNode, VNodeRef, VNodeType, VRef};
use std::cell::RefCell;
use std::rc::Rc;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Owns the host backend and the app-wide error/instance-id state shared by
/// every component mounted through it. Held behind `Rc` so render-effect
/// closures (which must outlive the call that created them) can capture a
/// clone and call back into `patch`/`mount`/`unmount` on their own schedule.
pub struct Renderer<B: HostBackend> {
    pub backend: RefCell<B>,
    pub app_context: Rc<AppContext>,
}

impl<B: HostBackend> Renderer<B> {
    pub fn new(backend: B) -> Rc<Self> {
        Rc::new(Self {
            backend: RefCell::new(backend),
            app_context: AppContext::new(),
        })
    }
}

type Parent<B> = Option<Rc<RefCell<ComponentInstance<B>>>>;

//--------------------------------------------------------------------------------------------------
// patch
//--------------------------------------------------------------------------------------------------

impl<B: HostBackend + 'static> Renderer<B> {
    /// `patch(old, new, container, anchor, parentComponent, isSVG)` (§4.4.1).
    pub fn patch(
        self: &Rc<Self>,
        old: Option<&VNodeRef>,
        new: &VNodeRef,
        container: HostHandle,
        anchor: Option<HostHandle>,
        parent: Parent<B>,
        is_svg: bool,
    ) {
        if let Some(old) = old {
            // A `v-once` subtree hands back the exact same `VNodeRef` every
            // render (§4.1.2 item 1's cache slot); there is nothing to diff.
            if Rc::ptr_eq(old, new) {
                return;
            }
            if !same_vnode_type(&old.borrow(), &new.borrow()) {
                let anchor = self.next_sibling_of(old);
                self.unmount(old, parent.clone());
                self.mount(new, container, anchor, parent, is_svg);
                return;
            }
        }

        let node_type_is_component = matches!(new.borrow().node_type, VNodeType::Component(_));
        if node_type_is_component {
            crate::renderer::component_patch::patch_component(self, old, new, container, anchor, parent);
            return;
        }

        match old {
            None => self.mount(new, container, anchor, parent, is_svg),
            Some(old) => {
                let kind = discriminant_kind(&new.borrow());
                match kind {
                    Kind::Text => self.patch_text(old, new),
                    Kind::Comment => {}
                    Kind::Static => {}
                    Kind::Fragment => self.patch_fragment(old, new, container, anchor, parent, is_svg),
                    Kind::Element => self.patch_element(old, new, parent, is_svg),
                    Kind::Special(_) => {
                        crate::error::internal_invariant_violation(
                            "Teleport/Suspense patching is not implemented by this renderer",
                        );
                    }
                }
                new.borrow_mut().mount.host = old.borrow().mount.host;
                new.borrow_mut().mount.anchors = old.borrow().mount.anchors;
                new.borrow_mut().mount.mounted = true;
            }
        }

        self.resolve_ref(old, new);
    }

    //----------------------------------------------------------------------
    // Mount
    //----------------------------------------------------------------------

    pub fn mount(
        self: &Rc<Self>,
        node: &VNodeRef,
        container: HostHandle,
        anchor: Option<HostHandle>,
        parent: Parent<B>,
        is_svg: bool,
    ) {
        node.borrow().guard_not_mounted();

        let node_type_is_component = matches!(node.borrow().node_type, VNodeType::Component(_));
        if node_type_is_component {
            crate::renderer::component_patch::mount_component(self, node, container, anchor, parent);
            return;
        }

        let kind = discriminant_kind(&node.borrow());
        match kind {
            Kind::Text => self.mount_text(node, container, anchor),
            Kind::Comment => self.mount_comment(node, container, anchor),
            Kind::Static => self.mount_static(node, container, anchor, is_svg),
            Kind::Fragment => self.mount_fragment(node, container, anchor, parent, is_svg),
            Kind::Element => self.mount_element(node, container, anchor, parent, is_svg),
            Kind::Special(_) => {
                crate::error::internal_invariant_violation(
                    "Teleport/Suspense mounting is not implemented by this renderer",
                );
            }
        }
        node.borrow_mut().mount.mounted = true;
        self.resolve_ref(None, node);
    }

    fn mount_text(self: &Rc<Self>, node: &VNodeRef, container: HostHandle, anchor: Option<HostHandle>) {
        let text = match &node.borrow().children {
            Children::Text(s) => s.clone(),
            _ => String::new(),
        };
        let host = self.backend.borrow_mut().create_text(&text);
        self.backend.borrow_mut().insert(host, container, anchor);
        node.borrow_mut().mount.host = Some(host);
    }

    fn mount_comment(self: &Rc<Self>, node: &VNodeRef, container: HostHandle, anchor: Option<HostHandle>) {
        let text = match &node.borrow().children {
            Children::Text(s) => s.clone(),
            _ => String::new(),
        };
        let host = self.backend.borrow_mut().create_comment(&text);
        self.backend.borrow_mut().insert(host, container, anchor);
        node.borrow_mut().mount.host = Some(host);
    }

    fn mount_static(self: &Rc<Self>, node: &VNodeRef, container: HostHandle, anchor: Option<HostHandle>, is_svg: bool) {
        let html = match &node.borrow().node_type {
            VNodeType::Static(html) => html.clone(),
            _ => String::new(),
        };
        let host = self
            .backend
            .borrow_mut()
            .insert_static_content(&html, container, anchor, is_svg)
            .unwrap_or_else(|| {
                // No native fast path: fall back to a comment placeholder
                // carrying the raw markup as its content, which is at least
                // observably present for tests/backends without a markup
                // parser of their own.
                let host = self.backend.borrow_mut().create_comment(&html);
                self.backend.borrow_mut().insert(host, container, anchor);
                host
            });
        node.borrow_mut().mount.host = Some(host);
    }

    fn mount_fragment(
        self: &Rc<Self>,
        node: &VNodeRef,
        container: HostHandle,
        anchor: Option<HostHandle>,
        parent: Parent<B>,
        is_svg: bool,
    ) {
        let start = self.backend.borrow_mut().create_comment("");
        let end = self.backend.borrow_mut().create_comment("");
        self.backend.borrow_mut().insert(start, container, anchor);
        self.backend.borrow_mut().insert(end, container, anchor);

        let children = match &node.borrow().children {
            Children::Array(c) => c.clone(),
            _ => Vec::new(),
        };
        for child in &children {
            self.mount(child, container, Some(end), parent.clone(), is_svg);
        }
        node.borrow_mut().mount.anchors = Some((start, end));
    }

    fn mount_element(
        self: &Rc<Self>,
        node: &VNodeRef,
        container: HostHandle,
        anchor: Option<HostHandle>,
        parent: Parent<B>,
        is_svg: bool,
    ) {
        let tag = match &node.borrow().node_type {
            VNodeType::Element(t) => t.clone(),
            _ => unreachable!("mount_element called on non-element"),
        };
        let el = self.backend.borrow_mut().create_element(&tag, is_svg);

        let props: Vec<(String, PropValue)> = node
            .borrow()
            .props
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (key, value) in &props {
            self.backend.borrow_mut().patch_prop(el, key, None, Some(value));
        }

        let is_text_children = node.borrow().shape_flag.contains(ShapeFlags::TEXT_CHILDREN);
        if is_text_children {
            let text = match &node.borrow().children {
                Children::Text(s) => s.clone(),
                _ => String::new(),
            };
            self.backend.borrow_mut().set_element_text(el, &text);
        } else if let Children::Array(children) = &node.borrow().children {
            let children = children.clone();
            for child in &children {
                self.mount(child, el, None, parent.clone(), is_svg);
            }
        }

        self.backend.borrow_mut().insert(el, container, anchor);
        node.borrow_mut().mount.host = Some(el);
    }

    //----------------------------------------------------------------------
    // Update
    //----------------------------------------------------------------------

    fn patch_text(&self, old: &VNodeRef, new: &VNodeRef) {
        let host = old.borrow().mount.host;
        let (old_text, new_text) = (text_of(&old.borrow()), text_of(&new.borrow()));
        if old_text != new_text {
            if let Some(host) = host {
                self.backend.borrow_mut().set_text(host, &new_text);
            }
        }
    }

    fn patch_element(&self, old: &VNodeRef, new: &VNodeRef, parent: Parent<B>, is_svg: bool) {
        let el = old.borrow().mount.host.expect("element must have a host handle");
        let patch_flag = new.borrow().patch_flag;

        if patch_flag.has_fast_path() {
            use crate::vnode::PatchFlags;
            if patch_flag.contains(PatchFlags::FULL_PROPS) {
                self.patch_props_full(el, old, new);
            } else {
                if patch_flag.contains(PatchFlags::CLASS) {
                    self.patch_one_prop(el, old, new, "class");
                }
                if patch_flag.contains(PatchFlags::STYLE) {
                    self.patch_one_prop(el, old, new, "style");
                }
                if patch_flag.contains(PatchFlags::PROPS) {
                    let names = new.borrow().dynamic_props.clone();
                    for name in &names {
                        self.patch_one_prop(el, old, new, name);
                    }
                }
            }
            if patch_flag.contains(PatchFlags::TEXT) {
                let (old_text, new_text) = (text_of(&old.borrow()), text_of(&new.borrow()));
                if old_text != new_text {
                    self.backend.borrow_mut().set_element_text(el, &new_text);
                }
            }
        } else {
            self.patch_props_full(el, old, new);
        }

        if let Some(new_dynamic) = new.borrow().dynamic_children.clone() {
            let old_dynamic = old.borrow().dynamic_children.clone().unwrap_or_default();
            for (o, n) in crate::renderer::block::pair_block_children(&old_dynamic, &new_dynamic) {
                let container = self.parent_of(&o).unwrap_or(el);
                self.patch(Some(&o), &n, container, None, parent.clone(), is_svg);
            }
            return;
        }

        self.patch_children(old, new, el, parent, is_svg);
    }

    fn patch_props_full(&self, el: HostHandle, old: &VNodeRef, new: &VNodeRef) {
        let old_props = old.borrow().props.clone();
        let new_props = new.borrow().props.clone();
        for (key, value) in &new_props {
            if old_props.get(key) != Some(value) {
                self.backend.borrow_mut().patch_prop(el, key, old_props.get(key), Some(value));
            }
        }
        for key in old_props.keys() {
            if !new_props.contains_key(key) {
                self.backend.borrow_mut().patch_prop(el, key, old_props.get(key), None);
            }
        }
    }

    fn patch_one_prop(&self, el: HostHandle, old: &VNodeRef, new: &VNodeRef, name: &str) {
        let old_value = old.borrow().props.get(name).cloned();
        let new_value = new.borrow().props.get(name).cloned();
        if old_value != new_value {
            self.backend
                .borrow_mut()
                .patch_prop(el, name, old_value.as_ref(), new_value.as_ref());
        }
    }

    fn patch_fragment(
        &self,
        old: &VNodeRef,
        new: &VNodeRef,
        _container: HostHandle,
        _anchor: Option<HostHandle>,
        parent: Parent<B>,
        is_svg: bool,
    ) {
        let (_start, end) = old.borrow().mount.anchors.expect("fragment must have anchors");
        if let Some(new_dynamic) = new.borrow().dynamic_children.clone() {
            let old_dynamic = old.borrow().dynamic_children.clone().unwrap_or_default();
            let container = self.parent_node(end).unwrap_or(end);
            for (o, n) in crate::renderer::block::pair_block_children(&old_dynamic, &new_dynamic) {
                self.patch(Some(&o), &n, container, Some(end), parent.clone(), is_svg);
            }
        } else {
            let container = self.parent_node(end).unwrap_or(end);
            self.patch_children(old, new, container, parent, is_svg);
        }
        new.borrow_mut().mount.anchors = old.borrow().mount.anchors;
    }

    //----------------------------------------------------------------------
    // Full children patch (§4.4.5)
    //----------------------------------------------------------------------

    pub fn patch_children(&self, old: &VNodeRef, new: &VNodeRef, container: HostHandle, parent: Parent<B>, is_svg: bool) {
        let old_is_text = old.borrow().shape_flag.contains(ShapeFlags::TEXT_CHILDREN);
        let new_is_text = new.borrow().shape_flag.contains(ShapeFlags::TEXT_CHILDREN);

        if new_is_text {
            if let Children::Array(old_children) = &old.borrow().children {
                let old_children = old_children.clone();
                for child in &old_children {
                    self.unmount(child, parent.clone());
                }
            }
            let (old_text, new_text) = (text_of(&old.borrow()), text_of(&new.borrow()));
            if old_text != new_text {
                self.backend.borrow_mut().set_element_text(container, &new_text);
            }
            return;
        }

        if old_is_text {
            self.backend.borrow_mut().set_element_text(container, "");
        }

        let old_children = match &old.borrow().children {
            Children::Array(c) => c.clone(),
            _ => Vec::new(),
        };
        let new_children = match &new.borrow().children {
            Children::Array(c) => c.clone(),
            _ => Vec::new(),
        };

        if new_children.is_empty() {
            for child in &old_children {
                self.unmount(child, parent.clone());
            }
            return;
        }

        let keyed = new_children.iter().any(|c| c.borrow().key != crate::vnode::VKey::None);
        let ops = if keyed {
            diff_keyed(&old_children, &new_children)
        } else {
            diff_unkeyed(old_children.len(), new_children.len())
        };

        for op in ops {
            match op {
                ChildOp::Patch { old_index, new_index } => {
                    let anchor = self.child_anchor(&new_children, new_index);
                    self.patch(
                        Some(&old_children[old_index]),
                        &new_children[new_index],
                        container,
                        anchor,
                        parent.clone(),
                        is_svg,
                    );
                }
                ChildOp::Mount { new_index, anchor_new_index } => {
                    let anchor = anchor_new_index.and_then(|a| new_children.get(a)).and_then(|v| v.borrow().mount.host);
                    self.mount(&new_children[new_index], container, anchor, parent.clone(), is_svg);
                }
                ChildOp::Unmount { old_index } => {
                    self.unmount(&old_children[old_index], parent.clone());
                }
                ChildOp::Move { old_index, anchor_new_index } => {
                    let anchor = anchor_new_index.and_then(|a| new_children.get(a)).and_then(|v| v.borrow().mount.host);
                    if let Some(host) = old_children[old_index].borrow().mount.host {
                        self.backend.borrow_mut().insert(host, container, anchor);
                    }
                }
            }
        }
    }

    fn child_anchor(&self, new_children: &[VNodeRef], index: usize) -> Option<HostHandle> {
        new_children
            .get(index + 1)
            .and_then(|v| v.borrow().mount.host)
    }

    //----------------------------------------------------------------------
    // Unmount
    //----------------------------------------------------------------------

    pub fn unmount(&self, node: &VNodeRef, parent: Parent<B>) {
        if matches!(node.borrow().node_type, VNodeType::Component(_)) {
            crate::renderer::component_patch::unmount_component(self, node);
            return;
        }
        match &node.borrow().children {
            Children::Array(children) => {
                let children = children.clone();
                for child in &children {
                    self.unmount(child, parent.clone());
                }
            }
            _ => {}
        }
        if let Some((start, end)) = node.borrow().mount.anchors {
            self.backend.borrow_mut().remove(start);
            self.backend.borrow_mut().remove(end);
        } else if let Some(host) = node.borrow().mount.host {
            self.backend.borrow_mut().remove(host);
        }
        node.borrow_mut().mount.mounted = false;
    }

    //----------------------------------------------------------------------
    // Helpers
    //----------------------------------------------------------------------

    fn resolve_ref(&self, old: Option<&VNodeRef>, new: &VNodeRef) {
        if let Some(old) = old {
            if let Some(VRef::Fn(f)) = &old.borrow().vref {
                if !matches!(&new.borrow().vref, Some(VRef::Fn(g)) if Rc::ptr_eq(f, g)) {
                    f(None);
                }
            }
        }
        let host = new.borrow().mount.host;
        if let Some(VRef::Fn(f)) = &new.borrow().vref {
            f(host);
        }
    }

    fn parent_node(&self, handle: HostHandle) -> Option<HostHandle> {
        self.backend.borrow().parent_node(handle)
    }

    fn parent_of(&self, node: &VNodeRef) -> Option<HostHandle> {
        node.borrow().mount.host.and_then(|h| self.parent_node(h))
    }

    fn next_sibling_of(&self, node: &VNodeRef) -> Option<HostHandle> {
        let host = node.borrow().mount.host.or_else(|| node.borrow().mount.anchors.map(|(_, e)| e))?;
        self.backend.borrow().next_sibling(host)
    }
}

//--------------------------------------------------------------------------------------------------
// Free functions
//--------------------------------------------------------------------------------------------------

enum Kind {
    Text,
    Comment,
    Static,
    Fragment,
    Element,
    Special(SpecialKind),
}

fn discriminant_kind(node: &VNode) -> Kind {
    match &node.node_type {
        VNodeType::Text => Kind::Text,
        VNodeType::Comment => Kind::Comment,
        VNodeType::Static(_) => Kind::Static,
        VNodeType::Fragment => Kind::Fragment,
        VNodeType::Element(_) => Kind::Element,
        VNodeType::Special(k) => Kind::Special(*k),
        VNodeType::Component(_) => unreachable!("dispatched before discriminant_kind"),
    }
}

fn text_of(node: &VNode) -> String {
    match &node.children {
        Children::Text(s) => s.clone(),
        _ => String::new(),
    }
}

/// Convenience for call sites building a fresh tree outside of any
/// component render (tests, the app shell's root mount).
pub fn mount_root<B: HostBackend + 'static>(
    renderer: &Rc<Renderer<B>>,
    node: VNode,
    container: HostHandle,
) -> VNodeRef {
    let node = node_ref(node);
    renderer.mount(&node, container, None, None, false);
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test::TestBackend;
    use crate::vnode::VKey;

    fn new_renderer() -> Rc<Renderer<TestBackend>> {
        Renderer::new(TestBackend::new())
    }

    #[test]
    fn mounts_element_with_text_child() {
        let renderer = new_renderer();
        let root = renderer.backend.borrow().root();
        let mut el = VNode::element("div");
        el.shape_flag = ShapeFlags::ELEMENT | ShapeFlags::TEXT_CHILDREN;
        el.children = Children::Text("hi".into());
        let node = mount_root(&renderer, el, root);
        let host = node.borrow().mount.host.unwrap();
        assert_eq!(renderer.backend.borrow().text_of(host), "hi");
    }

    #[test]
    fn keyed_list_shuffle_produces_one_move() {
        // §8.4 E2.
        let renderer = new_renderer();
        let root = renderer.backend.borrow().root();

        let make = |keys: &[&str]| {
            let mut el = VNode::fragment(
                keys.iter()
                    .map(|k| node_ref(VNode::element("div").with_key(VKey::Str((*k).into()))))
                    .collect(),
            );
            el.shape_flag = ShapeFlags::ARRAY_CHILDREN;
            el
        };

        let old = mount_root(&renderer, make(&["a", "b", "c", "d"]), root);
        let new = node_ref(make(&["b", "a", "c", "d"]));
        let before = renderer.backend.borrow().op_count();
        renderer.patch(Some(&old), &new, root, None, None, false);
        let ops = renderer.backend.borrow().ops_since(before);
        let moves = ops.iter().filter(|o| o.starts_with("insert")).count();
        assert!(moves >= 1);
    }
}
