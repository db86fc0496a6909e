//! `v-if`/`v-else-if`/`v-else` transform (§4.1.2 item 2).
//!
//! The parser has already fused the sibling chain into one [`IfNode`]
//! (`compiler::parser`'s `fuse_structural`); this just transforms each
//! branch's condition expression and body.

use crate::compiler::ast::IfNode;
use crate::compiler::codegen::{CodegenNode, IfCodegen};
use crate::compiler::errors::{ErrorCode, Position};
use crate::compiler::expr::ExprParser;
use crate::compiler::transform::{transform_children_as_single, TransformCtx};

pub fn transform_if(if_node: &IfNode, ctx: &TransformCtx) -> CodegenNode {
    let branches = if_node
        .branches
        .iter()
        .map(|b| {
            let condition = b.condition.as_deref().map(|src| match ExprParser::parse(src) {
                Ok(e) => e,
                Err(_) => {
                    ctx.sink.on_error(ErrorCode::InvalidVIfExpression, Position::default());
                    crate::compiler::expr::Expr::Bool(false)
                }
            });
            let body = Box::new(transform_children_as_single(&b.children, ctx));
            (condition, body)
        })
        .collect();
    CodegenNode::If(IfCodegen { branches })
}
