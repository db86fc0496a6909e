//! `v-for` transform (§4.1.2 item 3).

use crate::compiler::ast::ForNode;
use crate::compiler::codegen::{CodegenNode, ForCodegen};
use crate::compiler::errors::{ErrorCode, Position};
use crate::compiler::expr::ExprParser;
use crate::compiler::transform::{transform_children_as_single, TransformCtx};

pub fn transform_for(for_node: &ForNode, ctx: &TransformCtx) -> CodegenNode {
    let source = match ExprParser::parse(&for_node.source) {
        Ok(e) => e,
        Err(_) => {
            ctx.sink.on_error(ErrorCode::InvalidVForExpression, Position::default());
            crate::compiler::expr::Expr::Null
        }
    };
    let key_expr = for_node.key_expr.as_deref().and_then(|s| ExprParser::parse(s).ok());
    let body = Box::new(transform_children_as_single(&for_node.children, ctx));
    CodegenNode::For(ForCodegen {
        source,
        value_alias: for_node.value_alias.clone(),
        key_alias: for_node.key_alias.clone(),
        index_alias: for_node.index_alias.clone(),
        key_expr,
        body,
    })
}
