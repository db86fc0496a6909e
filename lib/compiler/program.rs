//! Render-program execution (§4.1.2, §4.4.7): interprets a compiled
//! [`RenderProgram`] against a render-time [`Scope`] rather than generating
//! Rust source for it (§2's "codegen as data" decision).

use crate::compiler::codegen::{CodegenNode, ForCodegen, HoistedNode, IfCodegen, PropEntry, TextPart, VNodeCallNode};
use crate::compiler::expr::{display, eval, truthy, value_to_prop, Expr, ExprContext, Scope};
use crate::component::ComponentDescriptor;
use crate::reactivity::{Store, Value};
use crate::vnode::{
    node_ref, Children, PropValue, Props, ShapeFlags, SlotFn, Slots, SpecialKind, VKey, VNode, VNodeRef, VNodeType,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A compiled template: the transformed codegen tree, its hoisted static
/// subtrees (§4.1.2), and the component registry resolved at compile time
/// (kept alive for `:is`-dynamic lookups at render time).
pub struct RenderProgram {
    pub root: CodegenNode,
    pub hoists: Vec<HoistedNode>,
    pub registry: Rc<HashMap<String, Rc<ComponentDescriptor>>>,
}

/// Per-component-instance `v-once` cache (§4.1.2 item 1): the same
/// `VNodeRef` is handed back on every render after the first.
#[derive(Default)]
pub struct OnceCache {
    slots: RefCell<HashMap<usize, VNodeRef>>,
}

impl OnceCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_or_insert(&self, id: usize, build: impl FnOnce() -> VNodeRef) -> VNodeRef {
        if let Some(existing) = self.slots.borrow().get(&id) {
            return existing.clone();
        }
        let built = build();
        self.slots.borrow_mut().insert(id, built.clone());
        built
    }
}

/// The render context for a template-compiled component (§4.4.7): reads
/// resolve through `setup_state` first, falling through to `props`, so a
/// local `ref`/computed declared in `setup` shadows a same-named prop
/// exactly as plain JS field lookup would.
pub struct CompositeCtx {
    pub props: Rc<Store>,
    pub setup_state: Rc<Store>,
    pub slots: Slots,
}

impl ExprContext for CompositeCtx {
    fn get(&self, name: &str) -> Value {
        if self.setup_state.has(name) {
            self.setup_state.get(name)
        } else {
            self.props.get(name)
        }
    }

    fn set(&self, name: &str, value: Value) -> bool {
        if self.setup_state.has(name) {
            self.setup_state.set(name, value);
            true
        } else {
            self.props.set(name, value);
            false
        }
    }

    fn slot(&self, name: &str, props: &Props) -> Option<Vec<VNodeRef>> {
        self.slots.get(name).map(|f| f(props))
    }

    fn as_owned(&self) -> Rc<dyn ExprContext> {
        Rc::new(CompositeCtx { props: self.props.clone(), setup_state: self.setup_state.clone(), slots: self.slots.clone() })
    }
}

//--------------------------------------------------------------------------------------------------
// Entry point
//--------------------------------------------------------------------------------------------------

pub fn execute(program: &Rc<RenderProgram>, ctx: &dyn ExprContext, once_cache: &Rc<OnceCache>) -> VNode {
    let exec = Exec::new(program.clone(), once_cache.clone());
    let scope = Scope::root(ctx);
    // A whole-template `v-once` can't hand back a shared `VNodeRef` at the
    // top level (the fixed render signature always returns an owned
    // `VNode`), so the cache is bypassed for the literal root only; nested
    // `v-once` nodes still share identity normally.
    let root_node = match &program.root {
        CodegenNode::Once(inner, _) => inner.as_ref(),
        other => other,
    };
    let root_ref = exec.build_ref(root_node, &scope);
    Rc::try_unwrap(root_ref)
        .map(|cell| cell.into_inner())
        .unwrap_or_else(|_| panic!("top-level render produced a shared VNodeRef"))
}

//--------------------------------------------------------------------------------------------------
// Executor
//--------------------------------------------------------------------------------------------------

struct Exec {
    program: Rc<RenderProgram>,
    once_cache: Rc<OnceCache>,
    /// Block-tracking stack (§3.1/§4.1.3 "block tree"): each frame is the
    /// flat `dynamicChildren` view a `is_block` element is currently
    /// collecting. `track` pushes into the innermost open frame; plain
    /// (non-block) wrapper elements push no frame of their own, so a
    /// dynamic descendant bubbles straight through them to the nearest
    /// block ancestor, exactly as Vue's compiler-generated block tree does.
    block_stack: RefCell<Vec<Vec<VNodeRef>>>,
    /// `v-for`/`v-if` output can't join a block's flat view: a `v-for`
    /// contributes a variable number of entries per render and a `v-if`
    /// branch contributes zero or one depending on which arm wins, so
    /// positional pairing across renders (`block::pair_block_children`)
    /// would silently misalign. `track` is a no-op while this is above
    /// zero; a block a `v-for`/`v-if` result itself opens for its *own*
    /// descendants is unaffected, only its bubbling into an ancestor's
    /// frame is suppressed.
    suspended: Cell<u32>,
}

impl Exec {
    fn new(program: Rc<RenderProgram>, once_cache: Rc<OnceCache>) -> Self {
        Self { program, once_cache, block_stack: RefCell::new(Vec::new()), suspended: Cell::new(0) }
    }

    fn push_block(&self) {
        self.block_stack.borrow_mut().push(Vec::new());
    }

    fn pop_block(&self) -> Vec<VNodeRef> {
        self.block_stack.borrow_mut().pop().unwrap_or_default()
    }

    fn track(&self, node: &VNodeRef) {
        if self.suspended.get() > 0 {
            return;
        }
        if let Some(frame) = self.block_stack.borrow_mut().last_mut() {
            frame.push(node.clone());
        }
    }

    fn build_ref(&self, node: &CodegenNode, scope: &Scope) -> VNodeRef {
        match node {
            CodegenNode::Hoisted(idx) => {
                let hoisted = &self.program.hoists[*idx].node;
                self.build_ref(hoisted, scope)
            }
            CodegenNode::Once(inner, id) => self.once_cache.get_or_insert(*id, || self.build_ref(inner, scope)),
            CodegenNode::Text(parts) => node_ref(VNode::text(self.eval_text(parts, scope))),
            CodegenNode::Comment(s) => node_ref(VNode::comment(s.clone())),
            CodegenNode::Fragment(children) => {
                let built = self.build_children_list(children, scope);
                node_ref(VNode::fragment(built))
            }
            CodegenNode::If(if_codegen) => {
                self.suspended.set(self.suspended.get() + 1);
                let result = match pick_if_branch(if_codegen, scope) {
                    Some(body) => self.build_ref(body, scope),
                    None => node_ref(VNode::comment("v-if")),
                };
                self.suspended.set(self.suspended.get() - 1);
                result
            }
            CodegenNode::For(for_codegen) => {
                self.suspended.set(self.suspended.get() + 1);
                let items = self.build_for_items(for_codegen, scope);
                self.suspended.set(self.suspended.get() - 1);
                node_ref(VNode::fragment(items))
            }
            CodegenNode::Slot { name, props, fallback } => self.build_slot_outlet(name, props, fallback, scope),
            CodegenNode::Element(call) => self.build_element(call, scope),
        }
    }

    fn eval_text(&self, parts: &[TextPart], scope: &Scope) -> String {
        let mut s = String::new();
        for p in parts {
            match p {
                TextPart::Static(t) => s.push_str(t),
                TextPart::Dynamic(e) => s.push_str(&display(&eval(e, scope))),
            }
        }
        s
    }

    fn build_for_items(&self, f: &ForCodegen, scope: &Scope) -> Vec<VNodeRef> {
        let source = eval(&f.source, scope);
        let mut out = Vec::new();
        match source {
            Value::List(items) => {
                for (i, item_val) in items.into_iter().enumerate() {
                    self.push_for_item(f, scope, i as i64, Value::Int(i as i64), item_val, &mut out);
                }
            }
            Value::Store(s) => {
                for (i, key) in s.keys().into_iter().enumerate() {
                    let item_val = s.get(&key);
                    self.push_for_item(f, scope, i as i64, Value::Str(key), item_val, &mut out);
                }
            }
            _ => {}
        }
        out
    }

    fn push_for_item(&self, f: &ForCodegen, scope: &Scope, index: i64, key_val: Value, item_val: Value, out: &mut Vec<VNodeRef>) {
        let mut bindings = vec![(f.value_alias.clone(), item_val)];
        if let Some(key_alias) = &f.key_alias {
            bindings.push((key_alias.clone(), key_val.clone()));
        }
        if let Some(index_alias) = &f.index_alias {
            bindings.push((index_alias.clone(), Value::Int(index)));
        }
        let child_scope = scope.child(bindings);
        let vref = self.build_ref(&f.body, &child_scope);
        let key = match &f.key_expr {
            Some(expr) => value_to_vkey(&eval(expr, &child_scope)),
            None => value_to_vkey(&key_val),
        };
        vref.borrow_mut().key = key;
        out.push(vref);
    }

    fn build_children_list(&self, nodes: &[CodegenNode], scope: &Scope) -> Vec<VNodeRef> {
        let mut out = Vec::new();
        for node in nodes {
            match node {
                CodegenNode::For(f) => {
                    self.suspended.set(self.suspended.get() + 1);
                    out.extend(self.build_for_items(f, scope));
                    self.suspended.set(self.suspended.get() - 1);
                }
                CodegenNode::If(if_codegen) => {
                    self.suspended.set(self.suspended.get() + 1);
                    if let Some(body) = pick_if_branch(if_codegen, scope) {
                        out.push(self.build_ref(body, scope));
                    }
                    self.suspended.set(self.suspended.get() - 1);
                }
                other => {
                    let built = self.build_ref(other, scope);
                    if let CodegenNode::Text(parts) = other {
                        if parts.iter().any(|p| matches!(p, TextPart::Dynamic(_))) {
                            self.track(&built);
                        }
                    }
                    out.push(built);
                }
            }
        }
        out
    }

    fn build_element(&self, call: &VNodeCallNode, scope: &Scope) -> VNodeRef {
        if let Some(dyn_expr) = &call.dynamic_component {
            let name = match eval(dyn_expr, scope) {
                Value::Str(s) => s,
                other => display(&other),
            };
            if let Some(descriptor) = self.program.registry.get(&name) {
                return self.build_component(call, descriptor.clone(), scope);
            }
            crate::diagnostics::log_warn!(name = %name, "unresolved dynamic component");
            return self.build_plain_element(&name, call, scope);
        }

        if call.is_component {
            if let Some(descriptor) = &call.component {
                return self.build_component(call, descriptor.clone(), scope);
            }
            match call.tag.as_str() {
                "teleport" => return self.build_special(SpecialKind::Teleport, call, scope),
                "suspense" => return self.build_special(SpecialKind::Suspense, call, scope),
                _ => {
                    // `keep-alive`/`transition`, or an unresolved name that
                    // already warned during compilation: pass children
                    // through unwrapped rather than dropping them.
                    let built = self.build_children_list(&call.children, scope);
                    return node_ref(VNode::fragment(built));
                }
            }
        }

        self.build_plain_element(&call.tag, call, scope)
    }

    fn build_plain_element(&self, tag: &str, call: &VNodeCallNode, scope: &Scope) -> VNodeRef {
        let mut vnode = VNode::element(tag.to_string());
        vnode.props = self.build_props(&call.props, scope);
        vnode.patch_flag = call.patch_flag;
        vnode.dynamic_props = call.dynamic_props.clone();
        if let Some(key_expr) = &call.key {
            vnode.key = value_to_vkey(&eval(key_expr, scope));
        }
        let is_single_text = matches!(call.children.as_slice(), [CodegenNode::Text(_)]);
        // A block's own array-children view only makes sense when there's an
        // array to view; the single-dynamic-text-child case is collapsed to
        // `Children::Text` above and patched directly via the TEXT patch
        // flag instead. A direct `v-for`/`v-if` child also disqualifies this
        // element from opening its own block (see `Exec::suspended`) — its
        // array would vary in length or presence between renders.
        let opens_block = call.is_block && !is_single_text && !has_direct_for_or_if(&call.children);
        if opens_block {
            self.push_block();
        }
        if is_single_text {
            vnode.shape_flag |= ShapeFlags::TEXT_CHILDREN;
            if let [CodegenNode::Text(parts)] = call.children.as_slice() {
                vnode.children = Children::Text(self.eval_text(parts, scope));
            }
        } else if !call.children.is_empty() {
            let built = self.build_children_list(&call.children, scope);
            vnode.shape_flag |= ShapeFlags::ARRAY_CHILDREN;
            vnode.children = Children::Array(built);
        }
        if opens_block {
            vnode.dynamic_children = Some(self.pop_block());
        }
        let vref = node_ref(vnode);
        if call.is_block {
            self.track(&vref);
        }
        vref
    }

    fn build_component(&self, call: &VNodeCallNode, descriptor: Rc<ComponentDescriptor>, scope: &Scope) -> VNodeRef {
        let mut vnode = VNode::new(VNodeType::Component(descriptor), ShapeFlags::STATEFUL_COMPONENT);
        vnode.props = self.build_props(&call.props, scope);
        vnode.patch_flag = call.patch_flag;
        vnode.dynamic_props = call.dynamic_props.clone();
        if let Some(key_expr) = &call.key {
            vnode.key = value_to_vkey(&eval(key_expr, scope));
        }
        vnode.shape_flag |= ShapeFlags::SLOTS_CHILDREN;
        vnode.children = Children::Slots(self.build_slots(call, scope));
        // A component's own children are lazy slot closures (built when the
        // child actually renders its slots), not an eager array, so there is
        // no block view for `build_component` to open here. The component
        // vnode itself is still always tracked into whatever ancestor block
        // is open — a component's output can change independent of its own
        // props, so it must always be revisited, matching Vue's rule that
        // component vnodes are always considered dynamic.
        let vref = node_ref(vnode);
        self.track(&vref);
        vref
    }

    fn build_special(&self, kind: SpecialKind, call: &VNodeCallNode, scope: &Scope) -> VNodeRef {
        let mut vnode = VNode::new(VNodeType::Special(kind), ShapeFlags::empty());
        vnode.props = self.build_props(&call.props, scope);
        if !call.children.is_empty() {
            let built = self.build_children_list(&call.children, scope);
            vnode.shape_flag |= ShapeFlags::ARRAY_CHILDREN;
            vnode.children = Children::Array(built);
        }
        node_ref(vnode)
    }

    /// Only the default slot is modeled: the parser folds `<template #foo>`
    /// content into the same child list as plain children rather than
    /// extracting per-name slot bodies, so there is nothing here to key a
    /// second slot function by.
    fn build_slots(&self, call: &VNodeCallNode, scope: &Scope) -> Slots {
        let mut slots = Slots::new();
        if call.children.is_empty() {
            return slots;
        }
        let owned_ctx = scope.ctx.as_owned();
        let locals = scope.flatten_locals();
        let body: Rc<[CodegenNode]> = call.children.clone().into();
        let slot_scope_name = call.slot_scope.clone();
        let program = self.program.clone();
        let once_cache = self.once_cache.clone();

        let slot_fn: SlotFn = Rc::new(move |slot_props: &Props| -> Vec<VNodeRef> {
            let mut combined_locals = locals.clone();
            if let Some(name) = &slot_scope_name {
                let store = Store::from_fields(slot_props.iter().map(|(k, v)| (k.clone(), prop_to_value(v))).collect());
                combined_locals.push((name.clone(), Value::Store(store)));
            }
            let base = Scope::root(owned_ctx.as_ref());
            let scope = base.child(combined_locals);
            let exec = Exec::new(program.clone(), once_cache.clone());
            exec.build_children_list(&body, &scope)
        });
        slots.insert("default".to_string(), slot_fn);
        slots
    }

    fn build_slot_outlet(&self, name: &Expr, props: &[PropEntry], fallback: &CodegenNode, scope: &Scope) -> VNodeRef {
        let name_val = match eval(name, scope) {
            Value::Str(s) => s,
            other => display(&other),
        };
        let slot_props = self.build_props(props, scope);
        if let Some(children) = scope.ctx.slot(&name_val, &slot_props) {
            return node_ref(VNode::fragment(children));
        }
        self.build_ref(fallback, scope)
    }

    fn build_props(&self, entries: &[PropEntry], scope: &Scope) -> Props {
        let mut props = Props::new();
        for entry in entries {
            match entry {
                PropEntry::Static { name, value } => {
                    props.insert(name.clone(), PropValue::Str(value.clone()));
                }
                PropEntry::Bind { name, value, camel, .. } => {
                    let key = if *camel { to_camel(name) } else { name.clone() };
                    props.insert(key, value_to_prop(&eval(value, scope)));
                }
                PropEntry::On { event, handler, .. } => {
                    let name = format!("on{}", capitalize(event));
                    let handler = handler.clone();
                    let owned_ctx = scope.ctx.as_owned();
                    let locals = scope.flatten_locals();
                    props.insert(
                        name,
                        PropValue::Handler(Rc::new(move |payload: &PropValue| {
                            let base = Scope::root(owned_ctx.as_ref());
                            let with_locals = if locals.is_empty() { base } else { base.child(locals.clone()) };
                            let with_event = with_locals.child(vec![("$event".to_string(), prop_to_value(payload))]);
                            eval(&handler, &with_event);
                        })),
                    );
                }
                PropEntry::Spread(expr) => {
                    if let Value::Store(store) = eval(expr, scope) {
                        for key in store.keys() {
                            let v = store.get(&key);
                            props.insert(key, value_to_prop(&v));
                        }
                    }
                }
            }
        }
        props
    }
}

fn has_direct_for_or_if(children: &[CodegenNode]) -> bool {
    children.iter().any(|c| matches!(c, CodegenNode::For(_) | CodegenNode::If(_)))
}

fn pick_if_branch(if_codegen: &IfCodegen, scope: &Scope) -> Option<&CodegenNode> {
    for (cond, body) in &if_codegen.branches {
        match cond {
            None => return Some(body),
            Some(e) if truthy(&eval(e, scope)) => return Some(body),
            Some(_) => {}
        }
    }
    None
}

fn value_to_vkey(v: &Value) -> VKey {
    match v {
        Value::Int(n) => VKey::Int(*n),
        Value::Str(s) => VKey::Str(s.clone()),
        _ => VKey::None,
    }
}

fn prop_to_value(v: &PropValue) -> Value {
    match v {
        PropValue::Null => Value::Null,
        PropValue::Bool(b) => Value::Bool(*b),
        PropValue::Int(i) => Value::Int(*i),
        PropValue::Float(f) => Value::Float(*f),
        PropValue::Str(s) => Value::Str(s.clone()),
        PropValue::Handler(_) => Value::Null,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn to_camel(s: &str) -> String {
    let mut out = String::new();
    let mut upper_next = false;
    for ch in s.chars() {
        if ch == '-' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{compile, CompileOptions};
    use crate::reactivity::Store;
    use crate::vnode::{Children, Slots};

    fn run(template: &str, bindings: &[(&str, Value)]) -> VNode {
        let program = Rc::new(compile(template, &CompileOptions::default()).expect("template should compile"));
        let setup_state = Store::new();
        for (name, value) in bindings {
            setup_state.set(name, value.clone());
        }
        let ctx = CompositeCtx { props: Store::new(), setup_state, slots: Slots::new() };
        execute(&program, &ctx, &Rc::new(OnceCache::new()))
    }

    #[test]
    fn a_block_element_collects_only_its_dynamic_descendants() {
        let root = run(
            r#"<div :class="c"><p>static</p><span :class="c">{{ x }}</span></div>"#,
            &[("c", Value::Str("wrap".to_string())), ("x", Value::Int(1))],
        );
        let dynamic = root.dynamic_children.as_ref().expect("root has a dynamic class, should open a block");
        // The static <p> never appears; only the <span> (itself dynamic) does.
        assert_eq!(dynamic.len(), 1);
    }

    #[test]
    fn a_direct_v_for_child_disqualifies_its_parent_from_opening_a_block() {
        let root = run(
            r#"<ul :class="c"><li v-for="item in items">{{ item }}</li></ul>"#,
            &[("c", Value::Str("list".to_string())), ("items", Value::List(vec![Value::Int(1), Value::Int(2)]))],
        );
        assert!(root.dynamic_children.is_none(), "a v-for sibling must fall back to the full children diff");
        match &root.children {
            Children::Array(items) => assert_eq!(items.len(), 2),
            _ => panic!("expected an array of for-items"),
        }
    }

    #[test]
    fn a_v_if_branch_is_never_tracked_into_the_enclosing_block() {
        let root = run(
            r#"<div :class="c"><span v-if="show" :class="c">yes</span></div>"#,
            &[("c", Value::Str("wrap".to_string())), ("show", Value::Bool(true))],
        );
        // The span qualifies as its own dynamic node, but since it came from
        // a v-if branch it must not be folded into the parent's flat view —
        // the branch could just as easily have produced nothing this render.
        let dynamic = root.dynamic_children.as_ref().expect("root has a dynamic class, should open a block");
        assert!(dynamic.is_empty());
    }
}
