//! The Virtual Node Model (§3.1): a tagged-union tree node carrying shape
//! and patch flags, an optional key/ref, and the block-children view that
//! lets the reconciler skip static subtrees.

mod flags;

pub use flags::{PatchFlags, ShapeFlags};

use crate::component::ComponentDescriptor;
use crate::renderer::host::HostHandle;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A value a prop/attribute can hold. Event handlers are a distinguished
/// variant so `patchProp` can tell them apart from plain attributes without
/// a name-based convention.
#[derive(Clone)]
pub enum PropValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Handler(Rc<dyn Fn(&PropValue)>),
}

impl std::fmt::Debug for PropValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropValue::Null => write!(f, "Null"),
            PropValue::Bool(b) => write!(f, "Bool({b:?})"),
            PropValue::Int(i) => write!(f, "Int({i:?})"),
            PropValue::Float(v) => write!(f, "Float({v:?})"),
            PropValue::Str(s) => write!(f, "Str({s:?})"),
            PropValue::Handler(_) => write!(f, "Handler(..)"),
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Null, PropValue::Null) => true,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Int(a), PropValue::Int(b)) => a == b,
            (PropValue::Float(a), PropValue::Float(b)) => a == b,
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            // Handlers compare by pointer identity — two closures are never
            // structurally equal, so treat distinct allocations as changed.
            (PropValue::Handler(a), PropValue::Handler(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

pub type Props = HashMap<String, PropValue>;

/// Either a single stable identity or the empty key (unkeyed).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum VKey {
    None,
    Int(i64),
    Str(String),
}

/// An identity binding resolved after mount/update (§3.1 `ref`).
pub enum VRef {
    Str(String),
    Fn(Rc<dyn Fn(Option<HostHandle>)>),
}

/// The canonical handle for a node inside a mounted tree. Shared (not just
/// owned) so the block view (`dynamic_children`) can hold references into
/// `children` without duplicating nodes (§3.1: "it is a view, not a
/// separate tree"). Grounded in the teacher's own `Rc<RefCell<_>>`
/// tree-node ownership (`render_tree/node.rs`).
pub type VNodeRef = Rc<RefCell<VNode>>;

pub fn node_ref(node: VNode) -> VNodeRef {
    Rc::new(RefCell::new(node))
}

/// Component-only children: named slot functions from slot-props to child
/// VNodes (§4.5/§6.2 `renderSlot`).
pub type SlotFn = Rc<dyn Fn(&Props) -> Vec<VNodeRef>>;
pub type Slots = HashMap<String, SlotFn>;

/// The shape `children` may take, keyed to `ShapeFlags` (§3.1).
pub enum Children {
    None,
    Text(String),
    Array(Vec<VNodeRef>),
    Slots(Slots),
}

/// Backend-special variants dispatched to a handler the reconciler does not
/// otherwise understand (§4.4.1 step 2).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialKind {
    Teleport,
    Suspense,
}

/// The tagged-union payload (§3.1 `type`).
pub enum VNodeType {
    Element(String),
    Text,
    Comment,
    /// An opaque pre-rendered fragment materialized once via
    /// `insertStaticContent` and never diffed again (§3.1 `Static`).
    Static(String),
    Fragment,
    Component(Rc<ComponentDescriptor>),
    Special(SpecialKind),
}

/// Mutable per-node bookkeeping populated after mount (§3.1 "backend handle").
#[derive(Default)]
pub struct MountState {
    pub host: Option<HostHandle>,
    /// Fragment boundary markers: (start, end) comment/text anchors.
    pub anchors: Option<(HostHandle, HostHandle)>,
    pub mounted: bool,
    /// For `Component` vnodes: the backend-specific `Rc<RefCell<ComponentInstance<B>>>`,
    /// erased here so the host-agnostic VNode tree need not be generic over
    /// the backend type `B`. `renderer::component_patch` downcasts this back
    /// to the concrete instance type it already knows `B` to be — a single,
    /// well-contained type-erasure boundary rather than threading `B`
    /// through every tree type.
    pub instance: Option<Rc<dyn std::any::Any>>,
}

/// The VNode itself. Held behind `Rc<RefCell<_>>` so the reconciler can hand
/// out shared references (block views, ref-cell bindings) while still
/// mutating `mount` in place during patch.
pub struct VNode {
    pub node_type: VNodeType,
    pub key: VKey,
    pub vref: Option<VRef>,
    pub props: Props,
    pub children: Children,
    pub shape_flag: ShapeFlags,
    pub patch_flag: PatchFlags,
    pub dynamic_props: Vec<String>,
    /// The block view (§3.1 `dynamicChildren`): references into `children`,
    /// populated by the codegen executor's block-tracking scope. `None`
    /// means this node is not a block.
    pub dynamic_children: Option<Vec<VNodeRef>>,
    pub mount: MountState,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl VNode {
    pub fn new(node_type: VNodeType, shape_flag: ShapeFlags) -> Self {
        Self {
            node_type,
            key: VKey::None,
            vref: None,
            props: Props::new(),
            children: Children::None,
            shape_flag,
            patch_flag: PatchFlags::empty(),
            dynamic_props: Vec::new(),
            dynamic_children: None,
            mount: MountState::default(),
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        let mut n = Self::new(VNodeType::Text, ShapeFlags::empty());
        n.children = Children::Text(s.into());
        n
    }

    pub fn comment(s: impl Into<String>) -> Self {
        let mut n = Self::new(VNodeType::Comment, ShapeFlags::empty());
        n.children = Children::Text(s.into());
        n
    }

    pub fn element(tag: impl Into<String>) -> Self {
        Self::new(VNodeType::Element(tag.into()), ShapeFlags::ELEMENT)
    }

    pub fn fragment(children: Vec<VNodeRef>) -> Self {
        let mut n = Self::new(VNodeType::Fragment, ShapeFlags::empty());
        n.children = Children::Array(children);
        n
    }

    pub fn with_key(mut self, key: VKey) -> Self {
        self.key = key;
        self
    }

    pub fn is_mounted(&self) -> bool {
        self.mount.mounted
    }

    /// §3.1 invariant: "A VNode is mounted at most once; remounting requires
    /// a fresh copy." Debug builds hard-fail on violation; release builds
    /// log and proceed, treating it as a fresh mount (Open Question #3).
    pub fn guard_not_mounted(&self) {
        if self.mount.mounted {
            debug_assert!(
                !self.mount.mounted,
                "attempted to mount an already-mounted VNode"
            );
            crate::diagnostics::log_error!("attempted to mount an already-mounted VNode; proceeding as a fresh mount");
        }
    }
}

/// "Same type" per §4.4.1 step 1: same `type` payload discriminant (and, for
/// elements/components, same tag/descriptor identity) and same key.
pub fn same_vnode_type(a: &VNode, b: &VNode) -> bool {
    if a.key != b.key {
        return false;
    }
    match (&a.node_type, &b.node_type) {
        (VNodeType::Element(t1), VNodeType::Element(t2)) => t1 == t2,
        (VNodeType::Text, VNodeType::Text) => true,
        (VNodeType::Comment, VNodeType::Comment) => true,
        (VNodeType::Static(_), VNodeType::Static(_)) => true,
        (VNodeType::Fragment, VNodeType::Fragment) => true,
        (VNodeType::Component(d1), VNodeType::Component(d2)) => Rc::ptr_eq(d1, d2),
        (VNodeType::Special(k1), VNodeType::Special(k2)) => k1 == k2,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_type_requires_matching_key() {
        let a = VNode::element("div").with_key(VKey::Str("a".into()));
        let b = VNode::element("div").with_key(VKey::Str("b".into()));
        assert!(!same_vnode_type(&a, &b));
        let c = VNode::element("div").with_key(VKey::Str("a".into()));
        assert!(same_vnode_type(&a, &c));
    }

    #[test]
    fn different_element_tags_are_not_same_type() {
        let a = VNode::element("div");
        let b = VNode::element("span");
        assert!(!same_vnode_type(&a, &b));
    }
}
