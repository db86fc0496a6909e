//! The public component descriptor (§3.3, §4.4.3) consumed by the renderer.
//!
//! Rust has no runtime reflection over function arity, so the "0/1/2-arg
//! setup variants" in §4.4.3 step 2 collapse to one signature: `setup`
//! always receives `(&SetupContext) -> SetupResult`. Downstream code that
//! wants the 0-arg ergonomics simply ignores the context.

use crate::compiler::program::RenderProgram;
use crate::reactivity::Store;
use crate::vnode::{Props, Slots, VNode};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A declared prop's type constraints, used by `resolvePropValue` (§4.4.8).
#[derive(Clone, Default)]
pub struct PropOption {
    pub required: bool,
    pub is_boolean: bool,
    /// True when the prop's declared type list contains `String` *after*
    /// `Boolean` (§4.4.8's `booleanIndex < stringIndex` rule) — governs the
    /// "empty string or name-equal string casts to `true`" special case.
    pub boolean_before_string: bool,
    pub default: Option<Rc<dyn Fn() -> crate::vnode::PropValue>>,
    pub validator: Option<Rc<dyn Fn(&crate::vnode::PropValue) -> bool>>,
}

pub type PropsOptions = HashMap<String, PropOption>;

/// What a `setup` function may hand back (§4.4.3 step 2).
pub enum SetupResult {
    /// A render function, replacing the template-compiled one.
    Render(Rc<dyn Fn(&Rc<Store>) -> VNode>),
    /// A plain state record, wrapped into the instance's setup-state store.
    State(HashMap<String, crate::vnode::PropValue>),
}

/// Context passed to `setup` (§4.4.3 step 2's `{attrs, slots, emit}`).
pub struct SetupContext {
    pub attrs: Rc<Store>,
    pub slots: Slots,
    pub emit: Rc<dyn Fn(&str, Vec<crate::vnode::PropValue>)>,
}

/// A component's static descriptor: its props schema, setup function, and
/// (if not runtime-compiled from a template) its render function.
///
/// Two descriptors are "the same component" (for `same_vnode_type`, §4.4.1)
/// iff they are the same `Rc` allocation — components are registered once
/// and referenced by `Rc` clone thereafter, mirroring the teacher's
/// `Asset.component.<validId>` resolution producing one shared definition.
pub struct ComponentDescriptor {
    pub name: String,
    pub props_options: PropsOptions,
    pub setup: Rc<dyn Fn(&Rc<Store>, &SetupContext) -> SetupResult>,
    /// Present when the component ships a render function directly (no
    /// template to compile) — e.g. a functional component or one whose
    /// `setup` always returns `SetupResult::Render`.
    pub render: Option<Rc<dyn Fn(&Rc<Store>) -> VNode>>,
    /// Present when the component is defined by a template string to be
    /// compiled lazily and cached on first use (§4.4.3 step 3).
    pub template: Option<String>,
    /// The `template` field compiled once and cached across every instance
    /// of this component (§4.4.3 step 3): the codegen tree is immutable
    /// data, safe to share behind an `Rc` once built.
    pub compiled_program: RefCell<Option<Rc<RenderProgram>>>,
}

impl ComponentDescriptor {
    pub fn new(name: impl Into<String>, setup: impl Fn(&Rc<Store>, &SetupContext) -> SetupResult + 'static) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            props_options: PropsOptions::new(),
            setup: Rc::new(setup),
            render: None,
            template: None,
            compiled_program: RefCell::new(None),
        })
    }

    pub fn with_props_options(mut self: Rc<Self>, options: PropsOptions) -> Rc<Self> {
        Rc::get_mut(&mut self)
            .expect("descriptor not shared yet")
            .props_options = options;
        self
    }

    pub fn with_render(mut self: Rc<Self>, render: impl Fn(&Rc<Store>) -> VNode + 'static) -> Rc<Self> {
        Rc::get_mut(&mut self)
            .expect("descriptor not shared yet")
            .render = Some(Rc::new(render));
        self
    }

    pub fn with_template(mut self: Rc<Self>, template: impl Into<String>) -> Rc<Self> {
        Rc::get_mut(&mut self)
            .expect("descriptor not shared yet")
            .template = Some(template.into());
        self
    }
}

/// `shouldUpdateComponent` (§4.4.3 update branch): true iff the props diff
/// is non-empty, slots changed, or the directive set changed. This crate
/// models directives as always-stable per instance, so only props/slots are
/// compared.
pub fn should_update_component(old_props: &Props, new_props: &Props, slots_changed: bool) -> bool {
    if slots_changed {
        return true;
    }
    if old_props.len() != new_props.len() {
        return true;
    }
    old_props.iter().any(|(k, v)| new_props.get(k) != Some(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vnode::PropValue;

    #[test]
    fn should_update_detects_changed_prop() {
        let mut old = Props::new();
        old.insert("name".into(), PropValue::Str("a".into()));
        let mut new = old.clone();
        assert!(!should_update_component(&old, &new, false));
        new.insert("name".into(), PropValue::Str("b".into()));
        assert!(should_update_component(&old, &new, false));
    }

    #[test]
    fn slot_change_forces_update_even_with_identical_props() {
        let props = Props::new();
        assert!(should_update_component(&props, &props, true));
    }
}
