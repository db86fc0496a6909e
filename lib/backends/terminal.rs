//! Terminal host backend (§6.1), grounded in the teacher's double-buffered
//! cell diffing (`buffer::DoubleBuffer`) and optimized command emission
//! (`terminal::TerminalRenderer`).
//!
//! Per spec.md's Non-goals ("Visual layout, CSS engine behavior... are
//! non-goals"), this backend does not carry over the teacher's flex-box
//! layout engine: nodes stack top-to-bottom in document order, each taking
//! its declared `width`/`height` props (defaulting to the parent's
//! remaining width and one row of text height). This is the one deliberate
//! feature drop from the teacher surface — see DESIGN.md.

use crate::buffer::{Cell, DoubleBuffer};
use crate::renderer::host::{HostBackend, HostHandle};
use crate::style::Color;
use crate::terminal::TerminalRenderer;
use crate::vnode::PropValue;
use std::collections::HashMap;
use std::io;

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

impl Node {
    fn width(&self) -> Option<u16> {
        match self.props.get("width") {
            Some(PropValue::Int(n)) => Some((*n).max(0) as u16),
            _ => None,
        }
    }

    fn height(&self) -> Option<u16> {
        match self.props.get("height") {
            Some(PropValue::Int(n)) => Some((*n).max(0) as u16),
            _ => None,
        }
    }

    fn fg(&self) -> Option<Color> {
        match self.props.get("color") {
            Some(PropValue::Str(name)) => color_from_name(name),
            _ => None,
        }
    }

    fn bg(&self) -> Option<Color> {
        match self.props.get("background") {
            Some(PropValue::Str(name)) => color_from_name(name),
            _ => None,
        }
    }
}

/// Maps a CSS-style color name/hex literal onto the teacher's 16-color
/// `Color` enum — there is no `CSS engine` here (spec.md Non-goal), just
/// enough name resolution for `style`/`color` props to reach a cell.
fn color_from_name(name: &str) -> Option<Color> {
    match name.to_ascii_lowercase().as_str() {
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "white" => Some(Color::White),
        _ if name.starts_with('#') => Color::from_hex(name).ok(),
        _ => None,
    }
}

/// A tree-shaped host backend drawing into a `DoubleBuffer` each frame.
pub struct TerminalBackend {
    nodes: HashMap<HostHandle, Node>,
    next_id: HostHandle,
    root: HostHandle,
    buffer: DoubleBuffer,
    renderer: TerminalRenderer,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl TerminalBackend {
    pub fn new(width: u16, height: u16) -> Self {
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
            buffer: DoubleBuffer::new(width, height),
            renderer: TerminalRenderer::new(),
        }
    }

    pub fn root(&self) -> HostHandle {
        self.root
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.buffer.resize(width, height);
    }

    /// Draws the current tree into the back buffer, diffs against the front
    /// buffer, and writes the minimal set of terminal commands — the
    /// teacher's flicker-free rendering pipeline (`buffer.rs`'s module doc).
    pub fn flush(&mut self) -> io::Result<()> {
        self.buffer.clear_back();
        let (width, _) = self.buffer.back_buffer_mut().dimensions();
        self.draw_children(self.root, 0, 0, width);
        let updates = self.buffer.diff();
        self.renderer.apply_updates(updates)?;
        self.buffer.swap();
        Ok(())
    }

    fn draw_children(&mut self, handle: HostHandle, x: u16, mut y: u16, available_width: u16) -> u16 {
        let children = self.nodes.get(&handle).map(|n| n.children.clone()).unwrap_or_default();
        for child in children {
            y = self.draw_node(child, x, y, available_width);
        }
        y
    }

    fn draw_node(&mut self, handle: HostHandle, x: u16, y: u16, available_width: u16) -> u16 {
        let Some(node) = self.nodes.get(&handle) else { return y };
        let width = node.width().unwrap_or(available_width).min(available_width);
        let (fg, bg) = (node.fg(), node.bg());

        match &node.kind {
            Kind::Text | Kind::Comment => {
                let text = node.text.clone();
                self.buffer.back_buffer_mut().write_str(x, y, &text, fg, bg);
                y + 1
            }
            Kind::Element(_) => {
                let height = node.height();
                if let Some(bg) = bg {
                    if let Some(h) = height {
                        self.buffer.back_buffer_mut().fill_rect(x, y, width, h, Cell::empty().with_bg(bg));
                    }
                }
                self.draw_children(handle, x, y, width)
            }
            Kind::Root => self.draw_children(handle, x, y, width),
        }
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

impl HostBackend for TerminalBackend {
    fn create_element(&mut self, tag: &str, _is_svg: bool) -> HostHandle {
        self.alloc(Kind::Element(tag.to_string()))
    }

    fn create_text(&mut self, s: &str) -> HostHandle {
        let id = self.alloc(Kind::Text);
        self.nodes.get_mut(&id).unwrap().text = s.to_string();
        id
    }

    fn create_comment(&mut self, s: &str) -> HostHandle {
        let id = self.alloc(Kind::Comment);
        self.nodes.get_mut(&id).unwrap().text = s.to_string();
        id
    }

    fn set_text(&mut self, node: HostHandle, s: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.text = s.to_string();
        }
    }

    fn set_element_text(&mut self, el: HostHandle, s: &str) {
        if let Some(n) = self.nodes.get_mut(&el) {
            n.children.clear();
            n.text = s.to_string();
        }
    }

    fn insert(&mut self, node: HostHandle, parent: HostHandle, anchor: Option<HostHandle>) {
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
    fn draws_text_node_into_buffer() {
        let mut backend = TerminalBackend::new(20, 3);
        let root = backend.root();
        let text = backend.create_text("hi");
        backend.insert(text, root, None);
        backend.flush().unwrap();
    }
}
