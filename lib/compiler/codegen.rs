//! The render-program's codegen tree (§4.1.3, §6.2): *data*, not generated
//! Rust source. `compiler::program::execute` walks this tree directly
//! against a render context each time the owning component re-renders.

use crate::compiler::expr::Expr;
use crate::component::ComponentDescriptor;
use crate::vnode::{PatchFlags, ShapeFlags};
use std::rc::Rc;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum TextPart {
    Static(String),
    Dynamic(Expr),
}

#[derive(Debug, Clone)]
pub enum PropEntry {
    Static { name: String, value: String },
    Bind { name: String, value: Expr, camel: bool, prop: bool },
    /// `@event="expr-or-statement"`. The parsed expression already captures
    /// both the "inline statement" and "method handler" forms (§4.1.2's
    /// directive transform table distinguishes them only to decide whether
    /// to wrap with `$event`; this evaluator always binds the DOM-less
    /// event payload as the implicit `$event` local instead).
    On { event: String, handler: Expr, stop: bool, prevent: bool },
    /// No-argument `v-bind="obj"` merge form.
    Spread(Expr),
}

#[derive(Clone)]
pub struct VNodeCallNode {
    pub tag: String,
    pub is_component: bool,
    /// Resolved at compile time from the registry passed to `compile` when
    /// the tag names a known user component (§4.1.1's classification rule).
    pub component: Option<Rc<ComponentDescriptor>>,
    /// `:is="expr"`/`is="expr"` — resolved against the render-time registry
    /// instead, since the name isn't known until the expression evaluates.
    pub dynamic_component: Option<Expr>,
    pub props: Vec<PropEntry>,
    pub children: Vec<CodegenNode>,
    /// `v-slot="x"` written directly on a component tag: the default slot's
    /// body is rendered with `x` bound to the slot's props (§4.5).
    pub slot_scope: Option<String>,
    pub patch_flag: PatchFlags,
    pub dynamic_props: Vec<String>,
    pub shape_flag: ShapeFlags,
    pub key: Option<Expr>,
    pub is_block: bool,
}

impl std::fmt::Debug for VNodeCallNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VNodeCallNode")
            .field("tag", &self.tag)
            .field("is_component", &self.is_component)
            .field("props", &self.props)
            .field("children", &self.children)
            .field("slot_scope", &self.slot_scope)
            .field("patch_flag", &self.patch_flag)
            .field("dynamic_props", &self.dynamic_props)
            .field("shape_flag", &self.shape_flag)
            .field("key", &self.key)
            .field("is_block", &self.is_block)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct IfCodegen {
    pub branches: Vec<(Option<Expr>, Box<CodegenNode>)>,
}

#[derive(Debug, Clone)]
pub struct ForCodegen {
    pub source: Expr,
    pub value_alias: String,
    pub key_alias: Option<String>,
    pub index_alias: Option<String>,
    pub key_expr: Option<Expr>,
    pub body: Box<CodegenNode>,
}

#[derive(Debug, Clone)]
pub enum CodegenNode {
    Element(VNodeCallNode),
    Text(Vec<TextPart>),
    Comment(String),
    Fragment(Vec<CodegenNode>),
    If(IfCodegen),
    For(ForCodegen),
    /// Wraps a node so it renders (and caches) at most once (§4.1.2 item 1).
    Once(Box<CodegenNode>, usize),
    /// A reference into the render program's hoist table (§4.1.2's static
    /// hoisting pass).
    Hoisted(usize),
    /// A `<slot name="..." :prop="...">fallback</slot>` outlet inside a
    /// component's own template (§4.5 `renderSlot`).
    Slot { name: Expr, props: Vec<PropEntry>, fallback: Box<CodegenNode> },
}

/// A fully static subtree, extracted once so repeated renders don't re-walk
/// an AST that can never change (§4.1.2's hoisting pass).
#[derive(Debug, Clone)]
pub struct HoistedNode {
    pub node: CodegenNode,
}
