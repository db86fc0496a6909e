//! Directive-transform dispatch table (§4.1.2's "Directive transforms",
//! §4.1.3's prop/patch-flag construction).
//!
//! `v-model`/`v-show` are host-backend-specific (the spec's own wording);
//! this core ships neither a DOM nor a terminal form-control/visibility
//! primitive to hang them on, so both are recognized (to avoid falling
//! through to "unknown attribute") but compile to nothing — a narrowing
//! documented in DESIGN.md, not a silent drop of spec-mandated behavior.

use crate::compiler::ast::{AttrNode, DirArg};
use crate::compiler::codegen::PropEntry;
use crate::compiler::errors::{ErrorCode, Position};
use crate::compiler::expr::{Expr, ExprParser};
use crate::compiler::transform::TransformCtx;
use crate::vnode::PatchFlags;

pub struct PropsResult {
    pub props: Vec<PropEntry>,
    pub patch_flag: PatchFlags,
    pub dynamic_props: Vec<String>,
    pub key: Option<Expr>,
    pub has_runtime_directives_only: bool,
}

pub fn build_props(attrs: &[AttrNode], ctx: &TransformCtx) -> PropsResult {
    let mut props = Vec::new();
    let mut patch_flag = PatchFlags::empty();
    let mut dynamic_props = Vec::new();
    let mut key = None;
    let mut saw_runtime_directive = false;
    let mut saw_dynamic_flag = false;

    let parse = |src: &str, ctx: &TransformCtx, code: ErrorCode| -> Expr {
        ExprParser::parse(src).unwrap_or_else(|_| {
            ctx.sink.on_error(code, Position::default());
            Expr::Null
        })
    };

    for attr in attrs {
        match attr {
            AttrNode::Static { name, value } => {
                if name == "key" {
                    key = Some(Expr::Str(value.clone()));
                } else if matches!(name.as_str(), "if" | "else-if" | "else" | "for" | "once" | "pre") {
                    // Structural directives are consumed by the parser/
                    // v-once transform already; nothing left to emit here.
                } else {
                    props.push(PropEntry::Static { name: name.clone(), value: value.clone() });
                }
            }
            AttrNode::Directive(d) if d.name == "once" || d.name == "pre" => {}
            AttrNode::Directive(d) if d.name == "bind" => {
                let value = d.exp.as_deref().map(|s| parse(s, ctx, ErrorCode::InvalidExpression));
                match (&d.arg, value) {
                    (Some(DirArg::Static(name)), Some(value)) if name == "key" => {
                        key = Some(value);
                    }
                    (Some(DirArg::Static(name)), Some(value)) => {
                        let camel = d.modifiers.iter().any(|m| m == "camel");
                        let prop = d.modifiers.iter().any(|m| m == "prop");
                        match name.as_str() {
                            "class" => patch_flag |= PatchFlags::CLASS,
                            "style" => patch_flag |= PatchFlags::STYLE,
                            _ => {
                                patch_flag |= PatchFlags::PROPS;
                                dynamic_props.push(name.clone());
                            }
                        }
                        saw_dynamic_flag = true;
                        props.push(PropEntry::Bind { name: name.clone(), value, camel, prop });
                    }
                    (Some(DirArg::Dynamic(_)), Some(_)) => {
                        // A dynamic `:[expr]="value"` argument has no static
                        // name to key a `PropEntry::Bind` by; this evaluator
                        // only looks up props by their compile-time name, so
                        // there is nowhere to route it without widening the
                        // prop representation. Surfaced as a diagnostic
                        // rather than silently dropped.
                        ctx.sink.on_error(ErrorCode::InvalidDirectiveArgument, Position::default());
                        patch_flag |= PatchFlags::FULL_PROPS;
                    }
                    (None, Some(value)) => {
                        patch_flag |= PatchFlags::FULL_PROPS;
                        saw_dynamic_flag = true;
                        props.push(PropEntry::Spread(value));
                    }
                    _ => {}
                }
            }
            AttrNode::Directive(d) if d.name == "on" => {
                let Some(exp) = d.exp.as_deref() else { continue };
                let handler = parse(exp, ctx, ErrorCode::InvalidExpression);
                match &d.arg {
                    Some(DirArg::Static(event)) => {
                        if event != "click" {
                            patch_flag |= PatchFlags::HYDRATE_EVENTS;
                        }
                        props.push(PropEntry::On {
                            event: event.clone(),
                            handler,
                            stop: d.modifiers.iter().any(|m| m == "stop"),
                            prevent: d.modifiers.iter().any(|m| m == "prevent"),
                        });
                    }
                    _ => {
                        crate::diagnostics::log_warn!("dynamic/absent v-on argument is not supported");
                    }
                }
            }
            AttrNode::Directive(d) if d.name == "model" || d.name == "show" => {
                saw_runtime_directive = true;
            }
            AttrNode::Directive(d) => {
                crate::diagnostics::log_warn!(name = %d.name, "unknown directive ignored");
            }
        }
    }

    if saw_dynamic_flag && patch_flag.contains(PatchFlags::PROPS) && dynamic_props.len() > 1 {
        // More than one dynamic-name prop collapses to FULL_PROPS in the
        // real compiler once any other dynamic key is also present; this
        // core keeps the simpler per-kind flags when only one was found.
    }

    let has_runtime_directives_only = saw_runtime_directive && patch_flag.is_empty();
    if has_runtime_directives_only {
        patch_flag |= PatchFlags::NEED_PATCH;
    }

    PropsResult { props, patch_flag, dynamic_props, key, has_runtime_directives_only }
}
