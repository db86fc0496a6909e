//! Component mount/update (§4.4.3) and the render effect (§4.4.6).
//!
//! `VNode` stays generic-free by erasing the backend-specific
//! `Rc<RefCell<ComponentInstance<B>>>` behind `Any` in `MountState.instance`;
//! every function here is the one place that downcasts it back.

use crate::compiler::program::{CompositeCtx, OnceCache, RenderProgram};
use crate::compiler::CompileOptions;
use crate::component::{ComponentDescriptor, SetupContext, SetupResult};
use crate::error::ErrorSource;
use crate::reactivity::{EffectOptions, RawEffect, Store, Value};
use crate::renderer::host::{HostBackend, HostHandle};
use crate::renderer::instance::{AppContext, ComponentInstance, Hook};
use crate::renderer::patch::Renderer;
use crate::renderer::props::{split_props, update_props_dynamic, update_props_full};
use crate::scheduler::{queue_job, SchedulerJob};
use crate::vnode::{node_ref, Children, PatchFlags, PropValue, Slots, VNodeRef, VNodeType};
use std::cell::RefCell;
use std::rc::Rc;

type Instance<B> = Rc<RefCell<ComponentInstance<B>>>;
type Parent<B> = Option<Instance<B>>;

fn to_store_value(v: &PropValue) -> Value {
    match v {
        PropValue::Null => Value::Null,
        PropValue::Bool(b) => Value::Bool(*b),
        PropValue::Int(i) => Value::Int(*i),
        PropValue::Float(f) => Value::Float(*f),
        PropValue::Str(s) => Value::Str(s.clone()),
        PropValue::Handler(_) => Value::Null,
    }
}

fn instance_of<B: 'static>(node: &VNodeRef) -> Instance<B> {
    let any = node
        .borrow()
        .mount
        .instance
        .clone()
        .expect("component vnode has no attached instance");
    any.downcast::<RefCell<ComponentInstance<B>>>()
        .expect("type-erased component instance did not match the expected backend type")
}

//--------------------------------------------------------------------------------------------------
// Mount
//--------------------------------------------------------------------------------------------------

pub fn mount_component<B: HostBackend + 'static>(
    renderer: &Rc<Renderer<B>>,
    node: &VNodeRef,
    container: HostHandle,
    anchor: Option<HostHandle>,
    parent: Parent<B>,
) {
    let descriptor = match &node.borrow().node_type {
        VNodeType::Component(d) => d.clone(),
        _ => unreachable!("mount_component called on a non-component vnode"),
    };
    let raw_props = node.borrow().props.clone();
    let slots = match &node.borrow().children {
        Children::Slots(s) => s.clone(),
        _ => Slots::new(),
    };

    let instance = ComponentInstance::new(descriptor.clone(), parent.as_ref(), renderer.app_context.clone());
    instance.borrow().fire_hook(Hook::BeforeCreate);

    let (props, attrs) = split_props(&raw_props, &descriptor.props_options);
    for (k, v) in &props {
        instance.borrow().props.set(k, to_store_value(v));
    }
    for (k, v) in &attrs {
        instance.borrow().attrs.set(k, to_store_value(v));
    }
    instance.borrow_mut().slots = slots.clone();

    let emit_attrs = instance.borrow().attrs.clone();
    let emit = Rc::new(move |event: &str, args: Vec<PropValue>| {
        let mut name = String::from("on");
        let mut chars = event.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.extend(chars);
        }
        if let PropValue::Handler(f) = from_store_value(emit_attrs.get(&name)) {
            f(args.first().unwrap_or(&PropValue::Null));
        }
    });
    let setup_ctx = SetupContext {
        attrs: instance.borrow().attrs.clone(),
        slots,
        emit,
    };

    let setup_props = instance.borrow().props.clone();
    let setup_result = (descriptor.setup)(&setup_props, &setup_ctx);
    match setup_result {
        SetupResult::Render(render_fn) => {
            *instance.borrow().render_fn.borrow_mut() = Some(render_fn);
        }
        SetupResult::State(state) => {
            for (k, v) in state {
                instance.borrow().setup_state.set(&k, to_store_value(&v));
            }
        }
    }
    if instance.borrow().render_fn.borrow().is_none() {
        if let Some(render_fn) = descriptor.render.clone() {
            *instance.borrow().render_fn.borrow_mut() = Some(render_fn);
        } else if let Some(template) = descriptor.template.clone() {
            match compile_template(&descriptor, &template, &renderer.app_context) {
                Some(program) => {
                    let render_fn = build_template_render_fn(&instance, program);
                    *instance.borrow().render_fn.borrow_mut() = Some(render_fn);
                }
                None => {
                    crate::error::internal_invariant_violation(format!(
                        "component {:?} template failed to compile",
                        descriptor.name
                    ));
                }
            }
        }
    }

    instance.borrow().fire_hook(Hook::Created);
    node.borrow_mut().mount.instance = Some(instance.clone());

    install_render_effect(renderer, &instance, node, container, anchor, true);

    let mounted = *instance.borrow().is_mounted.borrow();
    if mounted {
        instance.borrow().fire_hook(Hook::Mounted);
    }
}

/// Compiles `descriptor.template` at most once (§4.4.3 step 3), caching the
/// resulting program on the descriptor so every instance of this component
/// shares it.
fn compile_template(descriptor: &Rc<ComponentDescriptor>, template: &str, app_context: &Rc<AppContext>) -> Option<Rc<RenderProgram>> {
    if let Some(cached) = descriptor.compiled_program.borrow().clone() {
        return Some(cached);
    }
    let options = CompileOptions {
        raw_text_tags: Vec::new(),
        rcdata_tags: Vec::new(),
        components: app_context.components.borrow().clone(),
    };
    match crate::compiler::compile(template, &options) {
        Ok(program) => {
            let program = Rc::new(program);
            *descriptor.compiled_program.borrow_mut() = Some(program.clone());
            Some(program)
        }
        Err(errors) => {
            for e in &errors {
                crate::diagnostics::log_error!(error = %e, "template failed to compile");
            }
            None
        }
    }
}

/// Builds the render closure for a template-compiled component. Ignores the
/// `&Rc<Store>` the fixed render signature hands it in favor of reading
/// props/setup-state/slots straight off the instance, captured by weak
/// reference — the combined context a compiled template needs (props
/// shadowed by setup state, §4.4.7) doesn't fit in a single `Store`.
fn build_template_render_fn<B: HostBackend + 'static>(
    instance: &Instance<B>,
    program: Rc<RenderProgram>,
) -> Rc<dyn Fn(&Rc<Store>) -> crate::vnode::VNode> {
    let instance_weak = Rc::downgrade(instance);
    let once_cache = Rc::new(OnceCache::new());
    Rc::new(move |_ctx_store: &Rc<Store>| {
        let instance = instance_weak.upgrade().expect("component instance dropped before its own render");
        let instance = instance.borrow();
        let ctx = CompositeCtx { props: instance.props.clone(), setup_state: instance.setup_state.clone(), slots: instance.slots.clone() };
        crate::compiler::program::execute(&program, &ctx, &once_cache)
    })
}

fn install_render_effect<B: HostBackend + 'static>(
    renderer: &Rc<Renderer<B>>,
    instance: &Instance<B>,
    node: &VNodeRef,
    container: HostHandle,
    anchor: Option<HostHandle>,
    is_initial: bool,
) {
    let renderer = renderer.clone();
    let instance_weak = Rc::downgrade(instance);
    let node = node.clone();
    let first_run = Rc::new(RefCell::new(is_initial));

    let body = move || {
        let Some(instance) = instance_weak.upgrade() else { return };
        let is_first = *first_run.borrow();

        if is_first {
            instance.borrow().fire_hook(Hook::BeforeMount);
        } else {
            instance.borrow().fire_hook(Hook::BeforeUpdate);
        }

        let render_fn = instance.borrow().render_fn.borrow().clone();
        let Some(render_fn) = render_fn else {
            crate::error::internal_invariant_violation("component has no render function at render time");
            return;
        };
        let ctx_store = instance.borrow().setup_state.clone();
        let new_tree = crate::error::invoke_with_error_handling(
            ErrorSource::Render,
            &[],
            None,
            || Ok::<_, String>(render_fn(&ctx_store)),
        );
        let Some(new_tree) = new_tree else { return };
        let new_tree = node_ref(new_tree);

        let old_tree = instance.borrow().sub_tree.borrow().clone();
        match &old_tree {
            None => renderer.mount(&new_tree, container, anchor, Some(instance.clone()), false),
            Some(old_tree) => {
                let target_container = old_tree
                    .borrow()
                    .mount
                    .host
                    .and_then(|h| renderer.backend.borrow().parent_node(h))
                    .unwrap_or(container);
                renderer.patch(Some(old_tree), &new_tree, target_container, anchor, Some(instance.clone()), false);
            }
        }
        *instance.borrow().sub_tree.borrow_mut() = Some(new_tree.clone());

        let host = new_tree.borrow().mount.host.or_else(|| new_tree.borrow().mount.anchors.map(|(s, _)| s));
        node.borrow_mut().mount.host = host;
        node.borrow_mut().mount.mounted = true;

        if is_first {
            *first_run.borrow_mut() = false;
            *instance.borrow().is_mounted.borrow_mut() = true;
        } else {
            instance.borrow().fire_hook(Hook::Updated);
        }
    };

    let effect_id_cell: Rc<RefCell<Option<u64>>> = Rc::new(RefCell::new(None));
    let scheduler_id = effect_id_cell.clone();
    let instance_for_job = instance.clone();
    let scheduler_fn: Box<dyn Fn(Rc<RawEffect>)> = Box::new(move |effect| {
        let job = SchedulerJob::new(*scheduler_id.borrow(), move || effect.run());
        *instance_for_job.borrow().pending_render_job.borrow_mut() = Some(job.clone());
        queue_job(job);
    });

    let raw = RawEffect::new(
        body,
        EffectOptions {
            lazy: true,
            scheduler: Some(scheduler_fn),
            ..Default::default()
        },
    );
    *effect_id_cell.borrow_mut() = Some(raw.id);
    *instance.borrow().render_effect.borrow_mut() = Some(raw.clone());
    raw.run();
}

fn from_store_value(v: Value) -> PropValue {
    match v {
        Value::Null => PropValue::Null,
        Value::Bool(b) => PropValue::Bool(b),
        Value::Int(i) => PropValue::Int(i),
        Value::Float(f) => PropValue::Float(f),
        Value::Str(s) => PropValue::Str(s),
        Value::List(_) | Value::Store(_) => PropValue::Null,
    }
}

//--------------------------------------------------------------------------------------------------
// Update
//--------------------------------------------------------------------------------------------------

pub fn patch_component<B: HostBackend + 'static>(
    renderer: &Rc<Renderer<B>>,
    old: Option<&VNodeRef>,
    new: &VNodeRef,
    container: HostHandle,
    anchor: Option<HostHandle>,
    parent: Parent<B>,
) {
    match old {
        None => mount_component(renderer, new, container, anchor, parent),
        Some(old) => update_component(renderer, old, new),
    }
}

fn update_component<B: HostBackend + 'static>(_renderer: &Rc<Renderer<B>>, old: &VNodeRef, new: &VNodeRef) {
    let instance = instance_of::<B>(old);
    new.borrow_mut().mount.instance = Some(instance.clone() as Rc<dyn std::any::Any>);

    let old_props = old.borrow().props.clone();
    let new_props = new.borrow().props.clone();
    let old_slots_len = match &old.borrow().children {
        Children::Slots(s) => s.len(),
        _ => 0,
    };
    let new_slots_len = match &new.borrow().children {
        Children::Slots(s) => s.len(),
        _ => 0,
    };
    let should_update = crate::component::should_update_component(&old_props, &new_props, old_slots_len != new_slots_len);

    if !should_update {
        new.borrow_mut().mount.host = old.borrow().mount.host;
        new.borrow_mut().mount.anchors = old.borrow().mount.anchors;
        new.borrow_mut().mount.mounted = true;
        return;
    }

    let options = instance.borrow().descriptor.props_options.clone();
    if new.borrow().patch_flag.contains(PatchFlags::PROPS) && !new.borrow().patch_flag.contains(PatchFlags::FULL_PROPS) {
        let names = new.borrow().dynamic_props.clone();
        update_props_dynamic(&instance.borrow().props, &instance.borrow().attrs, &new_props, &names, &options);
    } else {
        update_props_full(&instance.borrow().props, &instance.borrow().attrs, &new_props, &old_props, &options);
    }
    if let Children::Slots(s) = &new.borrow().children {
        instance.borrow_mut().slots = s.clone();
    }

    // A parent-initiated update always supersedes a pending self-queued
    // render for this same instance — cancel it so the child doesn't also
    // re-render itself a second time once the scheduler drains (§4.4.3/§5).
    if let Some(job) = instance.borrow().pending_render_job.borrow_mut().take() {
        crate::scheduler::invalidate_job(&job);
    }

    let effect = instance.borrow().render_effect.borrow().clone();
    if let Some(effect) = effect {
        effect.run();
    }
}

//--------------------------------------------------------------------------------------------------
// Unmount
//--------------------------------------------------------------------------------------------------

pub fn unmount_component<B: HostBackend + 'static>(renderer: &Renderer<B>, node: &VNodeRef) {
    let instance = instance_of::<B>(node);
    instance.borrow().fire_hook(Hook::BeforeUnmount);

    let sub_tree = instance.borrow().sub_tree.borrow().clone();
    if let Some(sub_tree) = sub_tree {
        renderer.unmount(&sub_tree, Some(instance.clone()));
    }

    if let Some(effect) = instance.borrow().render_effect.borrow().clone() {
        effect.stop();
    }

    *instance.borrow().is_unmounted.borrow_mut() = true;
    instance.borrow().fire_hook(Hook::Unmounted);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test::TestBackend;
    use crate::component::ComponentDescriptor;
    use crate::reactivity::Store;
    use crate::vnode::{ShapeFlags, VNode};
    use std::collections::HashMap;

    fn counter_descriptor() -> Rc<ComponentDescriptor> {
        ComponentDescriptor::new("Counter", |_props, _ctx| {
            let mut state = HashMap::new();
            state.insert("count".to_string(), PropValue::Int(0));
            SetupResult::State(state)
        })
        .with_render(|ctx: &Rc<Store>| {
            let mut el = VNode::element("div");
            el.shape_flag = ShapeFlags::ELEMENT | ShapeFlags::TEXT_CHILDREN;
            el.children = Children::Text(format!("{:?}", ctx.get("count")));
            el
        })
    }

    #[test]
    fn mounts_component_and_runs_setup() {
        let renderer = Renderer::new(TestBackend::new());
        let root = renderer.backend.borrow().root();
        let mut node = VNode::new(VNodeType::Component(counter_descriptor()), ShapeFlags::STATEFUL_COMPONENT);
        node.children = Children::None;
        let node = node_ref(node);
        renderer.mount(&node, root, None, None, false);
        assert!(node.borrow().mount.mounted);
        assert!(node.borrow().mount.host.is_some());
    }

    #[test]
    fn unmount_stops_render_effect() {
        let renderer = Renderer::new(TestBackend::new());
        let root = renderer.backend.borrow().root();
        let node = node_ref(VNode::new(VNodeType::Component(counter_descriptor()), ShapeFlags::STATEFUL_COMPONENT));
        renderer.mount(&node, root, None, None, false);
        let instance = instance_of::<TestBackend>(&node);
        renderer.unmount(&node, None);
        assert!(*instance.borrow().is_unmounted.borrow());
        assert!(!instance.borrow().render_effect.borrow().as_ref().unwrap().is_active());
    }
}
