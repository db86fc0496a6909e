//! `v-once` transform (§4.1.2 item 1): wraps the node's codegen output in a
//! cache slot so `compiler::program::execute` renders it at most once per
//! component instance (the cache itself lives on the instance, not here —
//! see `compiler::program`'s `OnceCache`).

use crate::compiler::codegen::CodegenNode;
use crate::compiler::transform::TransformCtx;

pub fn wrap_if_once(inner: CodegenNode, is_once: bool, ctx: &TransformCtx) -> CodegenNode {
    if is_once {
        CodegenNode::Once(Box::new(inner), ctx.next_once_id())
    } else {
        inner
    }
}
