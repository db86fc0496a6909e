//! Element/component codegen construction (§4.1.3).
//!
//! Resolves the vnode's tag (plain element, core special, user component by
//! name, or `:is`-dynamic component), builds its props list and patch flag,
//! and decides block-ness, then defers to [`super::v_once::wrap_if_once`].

use crate::compiler::ast::{AttrNode, DirArg, ElementNode, TagType};
use crate::compiler::codegen::{CodegenNode, TextPart, VNodeCallNode};
use crate::compiler::expr::{Expr, ExprParser};
use crate::compiler::transform::{directives, transform_children, transform_children_as_single, v_once, TransformCtx};
use crate::vnode::{PatchFlags, ShapeFlags};

/// Tag names resolved to `VNodeType::Special` by the executor rather than to
/// a `ComponentDescriptor` (§4.1.1's core-component classification rule).
/// `keep-alive`/`transition` are recognized here only to avoid falling
/// through to "unknown component"; this core has no `VNodeType` variant for
/// either, so both pass their children through unwrapped — a narrowing
/// recorded in DESIGN.md.
const CORE_SPECIAL_TAGS: &[&str] = &["teleport", "suspense"];
const CORE_PASSTHROUGH_TAGS: &[&str] = &["keep-alive", "transition"];

pub fn transform_element(el: &ElementNode, ctx: &TransformCtx) -> CodegenNode {
    match el.tag_type {
        TagType::Template => transform_children_as_single(&el.children, ctx),
        TagType::Slot => transform_slot_outlet(el, ctx),
        TagType::Element | TagType::Component => transform_vnode_call(el, ctx),
    }
}

fn find_is_binding(attrs: &[AttrNode]) -> Option<Expr> {
    attrs.iter().find_map(|a| match a {
        AttrNode::Static { name, value } if name == "is" => Some(Expr::Str(value.clone())),
        AttrNode::Directive(d) if d.name == "bind" && matches!(&d.arg, Some(DirArg::Static(n)) if n == "is") => {
            d.exp.as_deref().and_then(|s| ExprParser::parse(s).ok())
        }
        _ => None,
    })
}

fn find_slot_scope(attrs: &[AttrNode]) -> Option<String> {
    attrs.iter().find_map(|a| match a {
        AttrNode::Directive(d) if d.name == "slot" && d.arg.is_none() => d.exp.clone(),
        _ => None,
    })
}

fn is_static_attr_named(attr: &AttrNode, name: &str) -> bool {
    match attr {
        AttrNode::Static { name: n, .. } => n == name,
        AttrNode::Directive(d) if d.name == "bind" => {
            matches!(&d.arg, Some(DirArg::Static(n)) if n == name)
        }
        AttrNode::Directive(d) if d.name == "slot" && name == "slot" => d.arg.is_none(),
        _ => false,
    }
}

fn resolve_component(tag: &str, ctx: &TransformCtx) -> Option<std::rc::Rc<crate::component::ComponentDescriptor>> {
    if let Some(d) = ctx.components.get(tag) {
        return Some(d.clone());
    }
    // Try PascalCase <-> kebab-case normalization (§4.1.1 classification
    // allows either spelling in a template).
    let kebab = to_kebab(tag);
    ctx.components.get(&kebab).cloned().or_else(|| {
        let pascal = to_pascal(tag);
        ctx.components.get(&pascal).cloned()
    })
}

fn to_kebab(s: &str) -> String {
    let mut out = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            out.push('-');
        }
        out.extend(c.to_lowercase());
    }
    out
}

fn to_pascal(s: &str) -> String {
    s.split(['-', '_']).map(|part| {
        let mut chars = part.chars();
        match chars.next() {
            Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }).collect()
}

fn transform_vnode_call(el: &ElementNode, ctx: &TransformCtx) -> CodegenNode {
    let dynamic_component = find_is_binding(&el.attrs);
    let is_component = el.tag_type == TagType::Component || dynamic_component.is_some();

    let mut component = None;
    let mut tag = el.tag.clone();
    if dynamic_component.is_none() && is_component {
        if CORE_SPECIAL_TAGS.contains(&el.tag.as_str()) || CORE_PASSTHROUGH_TAGS.contains(&el.tag.as_str()) {
            // Resolved by name at render time; nothing to look up here.
        } else if let Some(descriptor) = resolve_component(&el.tag, ctx) {
            tag = descriptor.name.clone();
            component = Some(descriptor);
        } else {
            crate::diagnostics::log_warn!(tag = %el.tag, "unresolved component; rendering as a plain element");
        }
    }

    let filtered: Vec<AttrNode> = el
        .attrs
        .iter()
        .filter(|a| !is_static_attr_named(a, "is") && !is_static_attr_named(a, "slot"))
        .cloned()
        .collect();
    let slot_scope = find_slot_scope(&el.attrs);
    let props_result = directives::build_props(&filtered, ctx);

    let children = transform_children(&el.children, ctx);
    let mut patch_flag = props_result.patch_flag;
    if !is_component {
        if let [CodegenNode::Text(parts)] = children.as_slice() {
            if parts.len() == 1 && matches!(parts[0], TextPart::Dynamic(_)) {
                patch_flag |= PatchFlags::TEXT;
            }
        }
    }

    let shape_flag = if is_component { ShapeFlags::STATEFUL_COMPONENT } else { ShapeFlags::ELEMENT };
    let is_block = patch_flag.has_fast_path() || is_component;

    let call = VNodeCallNode {
        tag,
        is_component,
        component,
        dynamic_component,
        props: props_result.props,
        children,
        slot_scope,
        patch_flag,
        dynamic_props: props_result.dynamic_props,
        shape_flag,
        key: props_result.key,
        is_block,
    };
    v_once::wrap_if_once(CodegenNode::Element(call), has_v_once(&el.attrs), ctx)
}

fn has_v_once(attrs: &[AttrNode]) -> bool {
    attrs.iter().any(|a| matches!(a, AttrNode::Directive(d) if d.name == "once"))
}

fn transform_slot_outlet(el: &ElementNode, ctx: &TransformCtx) -> CodegenNode {
    let name = el
        .attrs
        .iter()
        .find_map(|a| match a {
            AttrNode::Static { name, value } if name == "name" => Some(Expr::Str(value.clone())),
            AttrNode::Directive(d) if d.name == "bind" && matches!(&d.arg, Some(DirArg::Static(n)) if n == "name") => {
                d.exp.as_deref().and_then(|s| ExprParser::parse(s).ok())
            }
            _ => None,
        })
        .unwrap_or_else(|| Expr::Str("default".to_string()));

    let filtered: Vec<AttrNode> = el.attrs.iter().filter(|a| !is_static_attr_named(a, "name")).cloned().collect();
    let props = directives::build_props(&filtered, ctx).props;
    let fallback = Box::new(transform_children_as_single(&el.children, ctx));
    CodegenNode::Slot { name, props, fallback }
}
