//! An in-memory host backend with no real rendering surface, used to drive
//! reconciler tests without a terminal.

use crate::renderer::host::{HostBackend, HostHandle};
use crate::vnode::PropValue;
use std::collections::HashMap;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

enum Kind {
    Root,
    Element(String),
    Text,
    Comment,
}

struct Node {
    kind: Kind,
    parent: Option<HostHandle>,
    children: Vec<HostHandle>,
    text: String,
    props: HashMap<String, PropValue>,
}

/// Logs every mutating call as a string so tests can assert on op counts
/// and kinds without a real DOM/terminal to inspect.
pub struct TestBackend {
    nodes: HashMap<HostHandle, Node>,
    next_id: HostHandle,
    root: HostHandle,
    ops: Vec<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl TestBackend {
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            0,
            Node {
                kind: Kind::Root,
                parent: None,
                children: Vec::new(),
                text: String::new(),
                props: HashMap::new(),
            },
        );
        Self {
            nodes,
            next_id: 1,
            root: 0,
            ops: Vec::new(),
        }
    }

    pub fn root(&self) -> HostHandle {
        self.root
    }

    pub fn text_of(&self, handle: HostHandle) -> String {
        self.nodes.get(&handle).map(|n| n.text.clone()).unwrap_or_default()
    }

    pub fn tag_of(&self, handle: HostHandle) -> Option<String> {
        match self.nodes.get(&handle).map(|n| &n.kind) {
            Some(Kind::Element(tag)) => Some(tag.clone()),
            _ => None,
        }
    }

    pub fn children_of(&self, handle: HostHandle) -> Vec<HostHandle> {
        self.nodes.get(&handle).map(|n| n.children.clone()).unwrap_or_default()
    }

    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    pub fn ops_since(&self, mark: usize) -> Vec<String> {
        self.ops[mark..].to_vec()
    }

    fn alloc(&mut self, kind: Kind) -> HostHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                kind,
                parent: None,
                children: Vec::new(),
                text: String::new(),
                props: HashMap::new(),
            },
        );
        id
    }

    fn detach(&mut self, node: HostHandle) {
        let parent = self.nodes.get(&node).and_then(|n| n.parent);
        if let Some(parent) = parent {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.retain(|&c| c != node);
            }
        }
    }
}

impl Default for TestBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HostBackend for TestBackend {
    fn create_element(&mut self, tag: &str, _is_svg: bool) -> HostHandle {
        self.ops.push(format!("create_element:{tag}"));
        self.alloc(Kind::Element(tag.to_string()))
    }

    fn create_text(&mut self, s: &str) -> HostHandle {
        self.ops.push("create_text".to_string());
        let id = self.alloc(Kind::Text);
        self.nodes.get_mut(&id).unwrap().text = s.to_string();
        id
    }

    fn create_comment(&mut self, s: &str) -> HostHandle {
        self.ops.push("create_comment".to_string());
        let id = self.alloc(Kind::Comment);
        self.nodes.get_mut(&id).unwrap().text = s.to_string();
        id
    }

    fn set_text(&mut self, node: HostHandle, s: &str) {
        self.ops.push("set_text".to_string());
        if let Some(n) = self.nodes.get_mut(&node) {
            n.text = s.to_string();
        }
    }

    fn set_element_text(&mut self, el: HostHandle, s: &str) {
        self.ops.push("set_element_text".to_string());
        if let Some(n) = self.nodes.get_mut(&el) {
            n.children.clear();
            n.text = s.to_string();
        }
    }

    fn insert(&mut self, node: HostHandle, parent: HostHandle, anchor: Option<HostHandle>) {
        self.ops.push(format!("insert:{node}->{parent}"));
        self.detach(node);
        if let Some(n) = self.nodes.get_mut(&node) {
            n.parent = Some(parent);
        }
        if let Some(p) = self.nodes.get_mut(&parent) {
            match anchor.and_then(|a| p.children.iter().position(|&c| c == a)) {
                Some(idx) => p.children.insert(idx, node),
                None => p.children.push(node),
            }
        }
    }

    fn remove(&mut self, node: HostHandle) {
        self.ops.push(format!("remove:{node}"));
        self.detach(node);
        self.nodes.remove(&node);
    }

    fn parent_node(&self, node: HostHandle) -> Option<HostHandle> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    fn next_sibling(&self, node: HostHandle) -> Option<HostHandle> {
        let parent = self.parent_node(node)?;
        let siblings = &self.nodes.get(&parent)?.children;
        let idx = siblings.iter().position(|&c| c == node)?;
        siblings.get(idx + 1).copied()
    }

    fn patch_prop(&mut self, el: HostHandle, key: &str, _old: Option<&PropValue>, new: Option<&PropValue>) {
        self.ops.push(format!("patch_prop:{key}"));
        if let Some(n) = self.nodes.get_mut(&el) {
            match new {
                Some(v) => {
                    n.props.insert(key.to_string(), v.clone());
                }
                None => {
                    n.props.remove(key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_remove_track_parentage() {
        let mut backend = TestBackend::new();
        let root = backend.root();
        let el = backend.create_element("div", false);
        backend.insert(el, root, None);
        assert_eq!(backend.parent_node(el), Some(root));
        backend.remove(el);
        assert_eq!(backend.parent_node(el), None);
    }

    #[test]
    fn next_sibling_respects_insertion_order() {
        let mut backend = TestBackend::new();
        let root = backend.root();
        let a = backend.create_element("a", false);
        let b = backend.create_element("b", false);
        backend.insert(a, root, None);
        backend.insert(b, root, None);
        assert_eq!(backend.next_sibling(a), Some(b));
    }
}
