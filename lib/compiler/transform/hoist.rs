//! Static hoisting (§4.1.2's hoisting pass): after the rest of the
//! transform runs, walk the codegen tree bottom-up and extract every fully
//! static subtree into the render program's hoist table, replacing it with
//! a `CodegenNode::Hoisted(idx)` reference.
//!
//! `v-if`/`v-for` branch bodies are never hoisted *themselves* — a branch
//! body participates in block tracking even when every node inside it
//! happens to be static — but their static descendants still are.

use crate::compiler::codegen::{CodegenNode, ForCodegen, HoistedNode, IfCodegen, PropEntry, TextPart};

pub fn hoist(root: CodegenNode) -> (CodegenNode, Vec<HoistedNode>) {
    let mut hoists = Vec::new();
    let root = walk(root, &mut hoists, false);
    (root, hoists)
}

fn walk(node: CodegenNode, hoists: &mut Vec<HoistedNode>, branch_root: bool) -> CodegenNode {
    let recursed = match node {
        CodegenNode::Element(mut call) => {
            call.children = call.children.into_iter().map(|c| walk(c, hoists, false)).collect();
            CodegenNode::Element(call)
        }
        CodegenNode::Fragment(children) => {
            CodegenNode::Fragment(children.into_iter().map(|c| walk(c, hoists, false)).collect())
        }
        CodegenNode::If(IfCodegen { branches }) => CodegenNode::If(IfCodegen {
            branches: branches.into_iter().map(|(cond, body)| (cond, Box::new(walk(*body, hoists, true)))).collect(),
        }),
        CodegenNode::For(ForCodegen { source, value_alias, key_alias, index_alias, key_expr, body }) => {
            CodegenNode::For(ForCodegen {
                source,
                value_alias,
                key_alias,
                index_alias,
                key_expr,
                body: Box::new(walk(*body, hoists, true)),
            })
        }
        CodegenNode::Once(inner, id) => CodegenNode::Once(Box::new(walk(*inner, hoists, branch_root)), id),
        CodegenNode::Slot { name, props, fallback } => {
            CodegenNode::Slot { name, props, fallback: Box::new(walk(*fallback, hoists, true)) }
        }
        other @ (CodegenNode::Text(_) | CodegenNode::Comment(_) | CodegenNode::Hoisted(_)) => other,
    };

    let eligible = !branch_root
        && matches!(recursed, CodegenNode::Element(_) | CodegenNode::Fragment(_) | CodegenNode::Text(_) | CodegenNode::Comment(_))
        && is_fully_static(&recursed);

    if eligible {
        let idx = hoists.len();
        hoists.push(HoistedNode { node: recursed });
        CodegenNode::Hoisted(idx)
    } else {
        recursed
    }
}

fn is_fully_static(node: &CodegenNode) -> bool {
    match node {
        CodegenNode::Text(parts) => parts.iter().all(|p| matches!(p, TextPart::Static(_))),
        CodegenNode::Comment(_) => true,
        CodegenNode::Hoisted(_) => true,
        CodegenNode::Fragment(children) => children.iter().all(is_fully_static),
        CodegenNode::Element(call) => {
            !call.is_component
                && call.dynamic_component.is_none()
                && call.key.is_none()
                && call.patch_flag.is_empty()
                && call.props.iter().all(|p| matches!(p, PropEntry::Static { .. }))
                && call.children.iter().all(is_fully_static)
        }
        CodegenNode::If(_) | CodegenNode::For(_) | CodegenNode::Once(_, _) | CodegenNode::Slot { .. } => false,
    }
}
