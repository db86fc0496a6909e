//! The transform stage (§4.1.2): walks the parser's AST and produces the
//! codegen tree `compiler::program::execute` later interprets.
//!
//! This compiler evaluates expressions at render time against a dynamic
//! scope chain (`compiler::expr::Scope`) rather than generating source
//! text, so the fixed-order node transforms collapse to one recursive
//! dispatch instead of Vue's separate enter/exit visitor passes — there is
//! no codegen-source ordering constraint to preserve, only "children before
//! parent" data dependencies, which plain recursion already gives for free.

pub mod directives;
pub mod element;
pub mod hoist;
pub mod text;
pub mod v_for;
pub mod v_if;
pub mod v_once;

use crate::compiler::ast::AstNode;
use crate::compiler::codegen::CodegenNode;
use crate::compiler::errors::ErrorSink;
use crate::component::ComponentDescriptor;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The transform's shared accumulator: user components known to the
/// compile call, the hoist table being built, and an id source for
/// `v-once` cache slots.
pub struct TransformCtx<'a> {
    pub components: &'a HashMap<String, Rc<ComponentDescriptor>>,
    pub sink: &'a ErrorSink,
    once_ids: Cell<usize>,
}

impl<'a> TransformCtx<'a> {
    pub fn new(components: &'a HashMap<String, Rc<ComponentDescriptor>>, sink: &'a ErrorSink) -> Self {
        Self { components, sink, once_ids: Cell::new(0) }
    }

    pub fn next_once_id(&self) -> usize {
        let id = self.once_ids.get();
        self.once_ids.set(id + 1);
        id
    }
}

//--------------------------------------------------------------------------------------------------
// Dispatch
//--------------------------------------------------------------------------------------------------

/// Transforms one AST node. Text/Interpolation runs are merged by
/// [`transform_children`], which callers should prefer over calling this
/// directly on a raw child list.
pub fn transform_node(node: &AstNode, ctx: &TransformCtx) -> CodegenNode {
    match node {
        AstNode::Element(el) => element::transform_element(el, ctx),
        AstNode::Text(s) => text::transform_text(s),
        AstNode::Interpolation(expr) => text::transform_interpolation(expr, ctx),
        AstNode::Comment(s) => CodegenNode::Comment(s.clone()),
        AstNode::If(if_node) => v_if::transform_if(if_node, ctx),
        AstNode::For(for_node) => v_for::transform_for(for_node, ctx),
    }
}

/// Transforms a child list, merging adjacent text/interpolation runs into a
/// single compound `Text` node (§4.1.2 item 8) before recursing into the
/// rest.
pub fn transform_children(children: &[AstNode], ctx: &TransformCtx) -> Vec<CodegenNode> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < children.len() {
        match &children[i] {
            AstNode::Text(_) | AstNode::Interpolation(_) => {
                let start = i;
                while i < children.len() && matches!(children[i], AstNode::Text(_) | AstNode::Interpolation(_)) {
                    i += 1;
                }
                out.push(text::transform_text_run(&children[start..i], ctx));
            }
            other => {
                out.push(transform_node(other, ctx));
                i += 1;
            }
        }
    }
    out
}

/// Wraps a transformed child list as a single codegen node: the node
/// itself if there is exactly one, else an implicit `Fragment` (used for
/// `v-if`/`v-else` branch bodies and `v-for` bodies, both of which keep
/// their own root as a block rather than being hoisted, §4.1.2).
pub fn transform_children_as_single(children: &[AstNode], ctx: &TransformCtx) -> CodegenNode {
    let mut nodes = transform_children(children, ctx);
    if nodes.len() == 1 {
        nodes.pop().unwrap()
    } else {
        CodegenNode::Fragment(nodes)
    }
}
