//! Text/interpolation transform (§4.1.2 item 8).

use crate::compiler::ast::AstNode;
use crate::compiler::codegen::{CodegenNode, TextPart};
use crate::compiler::errors::{ErrorCode, Position};
use crate::compiler::expr::ExprParser;
use crate::compiler::transform::TransformCtx;

pub fn transform_text(s: &str) -> CodegenNode {
    CodegenNode::Text(vec![TextPart::Static(s.to_string())])
}

pub fn transform_interpolation(src: &str, ctx: &TransformCtx) -> CodegenNode {
    match ExprParser::parse(src) {
        Ok(expr) => CodegenNode::Text(vec![TextPart::Dynamic(expr)]),
        Err(_) => {
            ctx.sink.on_error(ErrorCode::InvalidExpression, Position::default());
            CodegenNode::Text(vec![TextPart::Static(String::new())])
        }
    }
}

/// Merges a contiguous run of `Text`/`Interpolation` siblings into one
/// compound `Text` codegen node (§4.1.2 item 8).
pub fn transform_text_run(nodes: &[AstNode], ctx: &TransformCtx) -> CodegenNode {
    let mut parts = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            AstNode::Text(s) => parts.push(TextPart::Static(s.clone())),
            AstNode::Interpolation(src) => match ExprParser::parse(src) {
                Ok(expr) => parts.push(TextPart::Dynamic(expr)),
                Err(_) => {
                    ctx.sink.on_error(ErrorCode::InvalidExpression, Position::default());
                    parts.push(TextPart::Static(String::new()));
                }
            },
            _ => unreachable!("transform_text_run called with a non-text node"),
        }
    }
    CodegenNode::Text(parts)
}
