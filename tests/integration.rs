//! End-to-end coverage of the compile -> execute -> mount -> patch pipeline.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use vireo::compiler::expr::{ExprContext, Scope};
use vireo::compiler::program::{execute, CompositeCtx, OnceCache};
use vireo::prelude::*;
use vireo::vnode::{Children, Slots};

//--------------------------------------------------------------------------------------------------
// Compile -> execute, no backend involved
//--------------------------------------------------------------------------------------------------

#[test]
fn compiles_and_executes_a_static_interpolation() {
    let program = compile("<div class=\"greeting\">hello {{ name }}</div>", &CompileOptions::default())
        .expect("template should compile");
    let program = Rc::new(program);

    let props = Store::new();
    let setup_state = Store::new();
    setup_state.set("name", "vireo".into());
    let ctx = CompositeCtx { props, setup_state, slots: Slots::new() };

    let vnode = execute(&program, &ctx, &Rc::new(OnceCache::new()));

    match vnode.node_type {
        VNodeType::Element(ref tag) => assert_eq!(tag, "div"),
        _ => panic!("expected an element root"),
    }
    match &vnode.children {
        Children::Text(text) => assert_eq!(text, "hello vireo"),
        other => panic!("expected text children, got a different shape: {}", matches_name(other)),
    }
}

fn matches_name(children: &Children) -> &'static str {
    match children {
        Children::None => "None",
        Children::Text(_) => "Text",
        Children::Array(_) => "Array",
        Children::Slots(_) => "Slots",
    }
}

#[test]
fn conditional_directive_picks_the_right_branch() {
    let program = Rc::new(
        compile(
            "<div><span v-if=\"show\">yes</span><span v-else>no</span></div>",
            &CompileOptions::default(),
        )
        .expect("template should compile"),
    );

    let render = |show: bool| {
        let setup_state = Store::new();
        setup_state.set("show", show.into());
        let ctx = CompositeCtx { props: Store::new(), setup_state, slots: Slots::new() };
        execute(&program, &ctx, &Rc::new(OnceCache::new()))
    };

    let shown = render(true);
    assert_text_of_only_child(&shown, "yes");

    let hidden = render(false);
    assert_text_of_only_child(&hidden, "no");
}

fn assert_text_of_only_child(vnode: &VNode, expected: &str) {
    let child = match &vnode.children {
        Children::Array(children) => children.first().expect("root has a child").clone(),
        other => panic!("expected an array of children, got: {}", matches_name(other)),
    };
    match &child.borrow().children {
        Children::Text(text) => assert_eq!(text, expected),
        other => panic!("expected text children, got: {}", matches_name(other)),
    }
}

//--------------------------------------------------------------------------------------------------
// Expression scope resolution
//--------------------------------------------------------------------------------------------------

struct MapCtx(RefCell<HashMap<String, Value>>);
impl ExprContext for MapCtx {
    fn get(&self, name: &str) -> Value {
        self.0.borrow().get(name).cloned().unwrap_or(Value::Null)
    }
    fn set(&self, name: &str, value: Value) -> bool {
        self.0.borrow_mut().insert(name.to_string(), value);
        true
    }
    fn as_owned(&self) -> Rc<dyn ExprContext> {
        Rc::new(MapCtx(RefCell::new(self.0.borrow().clone())))
    }
}

#[test]
fn v_for_alias_shadows_outer_scope_without_mutating_it() {
    let mut fields = HashMap::new();
    fields.insert("item".to_string(), Value::Str("outer".to_string()));
    let ctx = MapCtx(RefCell::new(fields));
    let root = Scope::root(&ctx);
    let inner = root.child(vec![("item".to_string(), Value::Str("inner".to_string()))]);

    assert_eq!(inner.get("item"), Value::Str("inner".to_string()));
    assert_eq!(root.get("item"), Value::Str("outer".to_string()));
}

//--------------------------------------------------------------------------------------------------
// Full app: mount against the in-memory test backend, then drive a reactive update
//--------------------------------------------------------------------------------------------------

#[test]
fn mounting_a_template_component_creates_the_expected_host_tree() {
    let descriptor = ComponentDescriptor::new("Greeting", |_props, _ctx| {
        let mut state = HashMap::new();
        state.insert("name".to_string(), PropValue::Str("world".to_string()));
        SetupResult::State(state)
    })
    .with_template("<div>hi {{ name }}</div>");

    let app = App::with_backend(TestBackend::new());
    app.mount(descriptor);
    vireo::scheduler::flush_now();

    let backend = app.backend();
    let root = backend.root();
    let children = backend.children_of(root);
    assert_eq!(children.len(), 1, "expected a single mounted root element");
    assert_eq!(backend.tag_of(children[0]).as_deref(), Some("div"));
    assert_eq!(backend.text_of(children[0]), "hi world");
}

#[test]
fn a_signal_write_schedules_a_re_render_through_the_app() {
    let count = Signal::new(0i64);
    let render_count = count.clone();

    let descriptor = ComponentDescriptor::new("Counter", move |_props, _ctx| {
        let count = render_count.clone();
        SetupResult::Render(Rc::new(move |_store| {
            let n = count.get();
            let mut node = VNode::new(VNodeType::Element("div".to_string()), ShapeFlags::ELEMENT | ShapeFlags::TEXT_CHILDREN);
            node.children = Children::Text(n.to_string());
            node
        }))
    });

    let app = App::with_backend(TestBackend::new());
    app.mount(descriptor);
    vireo::scheduler::flush_now();

    let backend = app.backend();
    let root_child = backend.children_of(backend.root())[0];
    assert_eq!(backend.text_of(root_child), "0");
    drop(backend);

    count.set(5);
    vireo::scheduler::flush_now();

    let backend = app.backend();
    let root_child = backend.children_of(backend.root())[0];
    assert_eq!(backend.text_of(root_child), "5");
}
