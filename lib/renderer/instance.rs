//! Component instance (§3.3) and app context.

use crate::component::ComponentDescriptor;
use crate::di::ProvideScope;
use crate::error::{AppErrorHandler, CapturedError, ErrorCapturedHook, ErrorSource};
use crate::reactivity::{RawEffect, Store};
use crate::scheduler::SchedulerJob;
use crate::vnode::{Props, VNode, VNodeRef};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The closed set of lifecycle hooks (§6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    BeforeCreate,
    Created,
    BeforeMount,
    Mounted,
    BeforeUpdate,
    Updated,
    BeforeUnmount,
    Unmounted,
    Activated,
    Deactivated,
    RenderTracked,
    RenderTriggered,
}

pub type HookFn = Rc<RefCell<dyn FnMut()>>;

/// State shared by the whole component tree of one app: the configured
/// error handler and a monotonic instance-id counter so ids sort in
/// creation order (which, by construction, is parent-before-child — the
/// same ordering property the scheduler relies on for render effects,
/// §5 "Ordering guarantees").
pub struct AppContext {
    pub error_handler: RefCell<Option<AppErrorHandler>>,
    /// Globally registered components (`app.component(name, descriptor)`),
    /// consulted by template compilation alongside whatever local registry
    /// a particular `compile` call was given.
    pub components: RefCell<HashMap<String, Rc<ComponentDescriptor>>>,
    /// App-level `provide()` bindings (`app.provide(key, value)`), the
    /// ultimate fallback parent scope for the root component instance's own
    /// `ProvideScope` — mirrors `app.provide` seeding `appContext.provides`.
    pub root_provides: Rc<ProvideScope>,
    next_instance_id: RefCell<u64>,
}

impl AppContext {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            error_handler: RefCell::new(None),
            components: RefCell::new(HashMap::new()),
            root_provides: ProvideScope::root(),
            next_instance_id: RefCell::new(1),
        })
    }

    pub fn register_component(&self, name: impl Into<String>, descriptor: Rc<ComponentDescriptor>) {
        self.components.borrow_mut().insert(name.into(), descriptor);
    }

    fn next_id(&self) -> u64 {
        let mut n = self.next_instance_id.borrow_mut();
        let id = *n;
        *n += 1;
        id
    }
}

/// A long-lived record created at mount, destroyed at unmount (§3.3).
pub struct ComponentInstance<B: 'static> {
    pub id: u64,
    pub descriptor: Rc<ComponentDescriptor>,
    pub parent: Option<Weak<RefCell<ComponentInstance<B>>>>,
    pub app_context: Rc<AppContext>,
    pub provides: Rc<ProvideScope>,

    /// Shallow-reactive declared-props store and the separate "leftover"
    /// attrs store (§4.4.3 step 2, §4.4.8).
    pub props: Rc<Store>,
    pub attrs: Rc<Store>,
    pub slots: crate::vnode::Slots,

    /// The setup-state container (§3.3) — present when `setup` returned
    /// `SetupResult::State`.
    pub setup_state: Rc<Store>,

    /// The resolved render function, either user-supplied or compiled from
    /// a template and cached here (§4.4.3 step 3).
    pub render_fn: RefCell<Option<Rc<dyn Fn(&Rc<Store>) -> VNode>>>,

    pub sub_tree: RefCell<Option<VNodeRef>>,
    pub next: RefCell<Option<Props>>,
    /// The per-instance render effect (installed by `component_patch::mount`).
    pub render_effect: RefCell<Option<Rc<RawEffect>>>,
    /// The most recently scheduler-queued render job, if any is still
    /// outstanding. A parent-initiated update (`update_component`) cancels
    /// this via `scheduler::invalidate_job` before running the effect
    /// directly, so the child doesn't also re-render itself from its own
    /// queued job afterward (§4.4.3/§5 ordering guarantee).
    pub pending_render_job: RefCell<Option<SchedulerJob>>,

    pub hooks: RefCell<HashMap<Hook, Vec<HookFn>>>,
    pub error_captured: RefCell<Vec<ErrorCapturedHook>>,

    pub is_mounted: RefCell<bool>,
    pub is_unmounted: RefCell<bool>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl<B: 'static> ComponentInstance<B> {
    pub fn new(
        descriptor: Rc<ComponentDescriptor>,
        parent: Option<&Rc<RefCell<ComponentInstance<B>>>>,
        app_context: Rc<AppContext>,
    ) -> Rc<RefCell<Self>> {
        let provides = match parent {
            Some(p) => ProvideScope::child_of(&p.borrow().provides),
            None => ProvideScope::child_of(&app_context.root_provides),
        };
        Rc::new(RefCell::new(Self {
            id: app_context.next_id(),
            descriptor,
            parent: parent.map(Rc::downgrade),
            app_context,
            provides,
            props: Store::new(),
            attrs: Store::new(),
            slots: crate::vnode::Slots::new(),
            setup_state: Store::new(),
            render_fn: RefCell::new(None),
            sub_tree: RefCell::new(None),
            next: RefCell::new(None),
            render_effect: RefCell::new(None),
            pending_render_job: RefCell::new(None),
            hooks: RefCell::new(HashMap::new()),
            error_captured: RefCell::new(Vec::new()),
            is_mounted: RefCell::new(false),
            is_unmounted: RefCell::new(false),
        }))
    }

    pub fn add_hook(&self, hook: Hook, f: impl FnMut() + 'static) {
        self.hooks
            .borrow_mut()
            .entry(hook)
            .or_default()
            .push(Rc::new(RefCell::new(f)));
    }

    pub fn fire_hook(&self, hook: Hook) {
        let fns = self.hooks.borrow().get(&hook).cloned().unwrap_or_default();
        for f in fns {
            (f.borrow_mut())();
        }
    }

    /// Walks `self` and ancestors invoking `errorCaptured` hooks, nearest
    /// first, stopping at the first hook that returns `true` (§4.4.3, §7).
    pub fn capture_chain(self_rc: &Rc<RefCell<Self>>) -> Vec<ErrorCapturedHook> {
        let mut chain = Vec::new();
        let mut current = Some(self_rc.clone());
        while let Some(inst) = current {
            chain.extend(inst.borrow().error_captured.borrow().iter().cloned());
            current = inst.borrow().parent.as_ref().and_then(Weak::upgrade);
        }
        chain
    }

    pub fn report_error(self_rc: &Rc<RefCell<Self>>, source: ErrorSource, message: impl Into<String>) {
        let error = CapturedError {
            source,
            message: message.into(),
        };
        let chain = Self::capture_chain(self_rc);
        let claimed = chain.iter().any(|hook| (hook.borrow_mut())(&error));
        if !claimed {
            let handler = self_rc.borrow().app_context.error_handler.borrow().clone();
            if let Some(handler) = handler {
                handler(&error);
            } else {
                crate::error::internal_invariant_violation(&error);
            }
        }
    }
}
