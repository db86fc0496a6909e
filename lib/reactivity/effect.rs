//! Effects: re-runnable units of work with automatic dependency tracking.
//!
//! This is the untyped core the rest of the reactivity layer (`Signal`,
//! `Store`, `Computed`, `watch`) is built on. Rust has no transparent object
//! proxies, so tracking is driven by explicit `Dep` handles that tracked
//! containers own per key (see `reactivity::store` and `reactivity::signal`).

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Monotonic effect id. Used both as a dependency-set lookup key and, by the
/// scheduler, as the ascending sort key that guarantees parent-before-child
/// flush ordering (parents are constructed, and so get their effect id,
/// before their children).
pub type EffectId = u64;

fn next_effect_id() -> EffectId {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// A dependency set: every effect currently subscribed to one tracked key.
///
/// Stored by the tracked container that owns the key (`Store`/`Signal`).
/// Holds only weak references so a dep set never keeps an effect alive —
/// ownership of effects flows the other way, from `Effect`/`Computed`/
/// `Watch` handles down to the deps they're subscribed to.
#[derive(Default)]
pub struct Dep {
    subscribers: RefCell<HashMap<EffectId, Weak<RawEffect>>>,
}

impl Dep {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    fn subscribe(&self, effect: &Rc<RawEffect>) {
        self.subscribers
            .borrow_mut()
            .insert(effect.id, Rc::downgrade(effect));
    }

    fn unsubscribe(&self, id: EffectId) {
        self.subscribers.borrow_mut().remove(&id);
    }

    /// Fires every subscriber, computed effects first (§4.2.2: "Run computed
    /// effects first, then plain").
    pub fn trigger(&self) {
        let subs: Vec<Rc<RawEffect>> = self
            .subscribers
            .borrow()
            .values()
            .filter_map(Weak::upgrade)
            .collect();
        let (mut computed, mut plain): (Vec<_>, Vec<_>) =
            subs.into_iter().partition(|e| e.computed.get());
        for e in computed.drain(..) {
            e.notify();
        }
        for e in plain.drain(..) {
            e.notify();
        }
    }
}

/// Options configuring an effect's execution discipline.
#[derive(Default)]
pub struct EffectOptions {
    pub lazy: bool,
    pub computed: bool,
    pub scheduler: Option<Box<dyn Fn(Rc<RawEffect>)>>,
    pub on_track: Option<Box<dyn Fn()>>,
    pub on_trigger: Option<Box<dyn Fn()>>,
    pub on_stop: Option<Box<dyn Fn()>>,
}

/// The untyped effect body plus its bookkeeping. Kept separate from the
/// typed `Effect` handle below so `Computed`/`Watch` can hold a `RawEffect`
/// directly without an extra generic parameter.
pub struct RawEffect {
    pub id: EffectId,
    body: RefCell<Box<dyn FnMut()>>,
    active: Cell<bool>,
    pub(crate) computed: Cell<bool>,
    scheduler: Option<Box<dyn Fn(Rc<RawEffect>)>>,
    on_track: Option<Box<dyn Fn()>>,
    on_trigger: Option<Box<dyn Fn()>>,
    on_stop: Option<Box<dyn Fn()>>,
    /// Dep sets this effect is currently subscribed to — kept so a re-run
    /// can remove itself from all of them before re-tracking (§3.2 invariant:
    /// "Re-running an effect first removes it from all its previous
    /// dependency sets, then re-tracks").
    deps: RefCell<Vec<Rc<Dep>>>,
}

thread_local! {
    static ACTIVE_STACK: RefCell<Vec<Rc<RawEffect>>> = const { RefCell::new(Vec::new()) };
    static TRACKING_ENABLED: Cell<bool> = const { Cell::new(true) };
}

/// Returns the currently-executing effect, if any (the implicit tracker).
fn active_effect() -> Option<Rc<RawEffect>> {
    ACTIVE_STACK.with(|s| s.borrow().last().cloned())
}

/// Globally pauses/resumes dependency tracking (used by deep-watch traversal
/// and read-only containers to read without tracking).
pub fn pause_tracking() -> bool {
    TRACKING_ENABLED.with(|t| t.replace(false))
}

pub fn reset_tracking(previous: bool) {
    TRACKING_ENABLED.with(|t| t.set(previous));
}

pub fn tracking_enabled() -> bool {
    TRACKING_ENABLED.with(|t| t.get())
}

impl RawEffect {
    pub fn new(body: impl FnMut() + 'static, options: EffectOptions) -> Rc<Self> {
        let effect = Rc::new(Self {
            id: next_effect_id(),
            body: RefCell::new(Box::new(body)),
            active: Cell::new(true),
            computed: Cell::new(options.computed),
            scheduler: options.scheduler,
            on_track: options.on_track,
            on_trigger: options.on_trigger,
            on_stop: options.on_stop,
            deps: RefCell::new(Vec::new()),
        });
        if !options.lazy {
            effect.run();
        }
        effect
    }

    /// `track(target, op, key)`'s receiving half: records this effect (if it
    /// is the active tracker) into `dep`, and records `dep` back onto the
    /// effect so cleanup is O(deps).
    pub fn track(dep: &Rc<Dep>) {
        if !tracking_enabled() {
            return;
        }
        let Some(effect) = active_effect() else {
            return;
        };
        dep.subscribe(&effect);
        let already = effect
            .deps
            .borrow()
            .iter()
            .any(|d| Rc::ptr_eq(d, dep));
        if !already {
            effect.deps.borrow_mut().push(dep.clone());
        }
        if let Some(cb) = &effect.on_track {
            cb();
        }
    }

    /// Called by `Dep::trigger`. Suppresses self-notification (§3.2: "An
    /// effect cannot trigger itself") and otherwise either hands off to the
    /// configured scheduler or runs immediately.
    fn notify(self: &Rc<Self>) {
        if !self.active.get() {
            return;
        }
        if let Some(top) = active_effect() {
            if top.id == self.id {
                return;
            }
        }
        if let Some(cb) = &self.on_trigger {
            cb();
        }
        if let Some(scheduler) = &self.scheduler {
            scheduler(self.clone());
        } else {
            self.run();
        }
    }

    /// Executes the effect body under tracking, first cleaning up the
    /// previous run's dependency set (§4.2.3 steps 1–5).
    pub fn run(self: &Rc<Self>) {
        if !self.active.get() {
            // An inactive effect with no scheduler still runs once when invoked
            // directly (non-scheduled case); callers that want a hard no-op
            // should check `is_active` themselves.
        }
        let already_running = ACTIVE_STACK.with(|s| s.borrow().iter().any(|e| e.id == self.id));
        if already_running {
            return;
        }
        self.cleanup();
        ACTIVE_STACK.with(|s| s.borrow_mut().push(self.clone()));
        // Guaranteed-release epilogue (§4.2.3 step 5): pop the stack even if
        // the body unwinds, so a panicking watcher/render callback never
        // leaves a stale "active effect" behind.
        struct PopGuard;
        impl Drop for PopGuard {
            fn drop(&mut self) {
                ACTIVE_STACK.with(|s| {
                    s.borrow_mut().pop();
                });
            }
        }
        let _guard = PopGuard;
        (self.body.borrow_mut())();
    }

    fn cleanup(&self) {
        let deps = self.deps.borrow_mut().split_off(0);
        for dep in deps {
            dep.unsubscribe(self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Deactivates the effect and detaches it from every dep set it belongs
    /// to. Equivalent to the spec's `stop(effect)`.
    pub fn stop(&self) {
        if !self.active.get() {
            return;
        }
        self.cleanup();
        self.active.set(false);
        if let Some(cb) = &self.on_stop {
            cb();
        }
    }
}

/// A typed, user-facing effect handle.
///
/// Dropping this handle does not stop the effect (it may still be kept
/// alive by dep sets via the `Rc` inside); call [`Effect::stop`] explicitly,
/// mirroring the spec's explicit `stop()` cancellation primitive.
pub struct Effect {
    raw: Rc<RawEffect>,
}

impl Effect {
    pub fn new(body: impl FnMut() + 'static) -> Self {
        Self {
            raw: RawEffect::new(body, EffectOptions::default()),
        }
    }

    pub fn with_options(body: impl FnMut() + 'static, options: EffectOptions) -> Self {
        Self {
            raw: RawEffect::new(body, options),
        }
    }

    pub fn raw(&self) -> &Rc<RawEffect> {
        &self.raw
    }

    pub fn run(&self) {
        self.raw.run();
    }

    pub fn stop(&self) {
        self.raw.stop();
    }

    pub fn is_active(&self) -> bool {
        self.raw.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell as StdCell;

    fn dep() -> Rc<Dep> {
        Dep::new()
    }

    #[test]
    fn effect_reruns_on_trigger() {
        let d = dep();
        let runs = Rc::new(StdCell::new(0));
        let runs2 = runs.clone();
        let d2 = d.clone();
        let _effect = Effect::new(move || {
            runs2.set(runs2.get() + 1);
            RawEffect::track(&d2);
        });
        assert_eq!(runs.get(), 1);
        d.trigger();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn dependency_cleanup_after_conditional_read() {
        let cond = dep();
        let a = dep();
        let b = dep();
        let take_a = Rc::new(StdCell::new(true));
        let take_a2 = take_a.clone();
        let (cond2, a2, b2) = (cond.clone(), a.clone(), b.clone());
        let _effect = Effect::new(move || {
            RawEffect::track(&cond2);
            if take_a2.get() {
                RawEffect::track(&a2);
            } else {
                RawEffect::track(&b2);
            }
        });
        assert_eq!(a.subscribers.borrow().len(), 1);
        assert_eq!(b.subscribers.borrow().len(), 0);

        take_a.set(false);
        cond.trigger();
        assert_eq!(a.subscribers.borrow().len(), 0);
        assert_eq!(b.subscribers.borrow().len(), 1);
    }

    #[test]
    fn effect_cannot_trigger_itself() {
        let d = dep();
        let runs = Rc::new(StdCell::new(0));
        let runs2 = runs.clone();
        let d2 = d.clone();
        let _effect = Effect::new(move || {
            runs2.set(runs2.get() + 1);
            RawEffect::track(&d2);
            if runs2.get() < 5 {
                d2.trigger();
            }
        });
        // The first run triggers itself once but the self-notification is
        // suppressed, so total runs stays at 1.
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn stop_detaches_from_all_deps() {
        let d = dep();
        let d2 = d.clone();
        let effect = Effect::new(move || {
            RawEffect::track(&d2);
        });
        assert_eq!(d.subscribers.borrow().len(), 1);
        effect.stop();
        assert_eq!(d.subscribers.borrow().len(), 0);
        assert!(!effect.is_active());
    }
}
