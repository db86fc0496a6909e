//! `Computed<T>`: a lazy, cached effect (§4.2.4).
//!
//! A computed cell is simultaneously a tracked *source* (downstream readers
//! subscribe to it like a signal) and an effect (it reruns when an upstream
//! dependency changes) — but it never recomputes eagerly. Its scheduler
//! just flips a dirty flag and re-triggers its own readers; the getter body
//! only actually runs the next time something reads the value.

use crate::reactivity::effect::{Dep, EffectOptions, RawEffect};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

struct Inner<T> {
    dirty: Cell<bool>,
    value: RefCell<Option<T>>,
    dep: Rc<Dep>,
    raw: RefCell<Option<Rc<RawEffect>>>,
}

pub struct Computed<T> {
    inner: Rc<Inner<T>>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl<T: Clone + 'static> Computed<T> {
    /// `getter` is invoked at most once per dependency-update cycle, and
    /// only when [`Computed::get`] is actually called (§8.1 computed-purity
    /// law).
    pub fn new(mut getter: impl FnMut() -> T + 'static) -> Rc<Self> {
        let inner = Rc::new(Inner {
            dirty: Cell::new(true),
            value: RefCell::new(None),
            dep: Dep::new(),
            raw: RefCell::new(None),
        });

        let inner_for_body = inner.clone();
        let inner_for_scheduler = inner.clone();

        let raw = RawEffect::new(
            move || {
                let value = getter();
                *inner_for_body.value.borrow_mut() = Some(value);
            },
            EffectOptions {
                lazy: true,
                computed: true,
                scheduler: Some(Box::new(move |_self_effect| {
                    // "if !dirty, set dirty=true and trigger downstream SET"
                    if !inner_for_scheduler.dirty.get() {
                        inner_for_scheduler.dirty.set(true);
                        inner_for_scheduler.dep.trigger();
                    }
                })),
                ..Default::default()
            },
        );
        *inner.raw.borrow_mut() = Some(raw);

        Rc::new(Self { inner })
    }

    /// Reads the cached value, recomputing first iff dirty, then tracks the
    /// sentinel `"value"` dependency so callers reading a computed inside
    /// another effect/computed get re-run when it changes.
    pub fn get(&self) -> T {
        if self.inner.dirty.get() {
            let raw = self.inner.raw.borrow().clone().expect("initialized above");
            raw.run();
            self.inner.dirty.set(false);
        }
        RawEffect::track(&self.inner.dep);
        self.inner
            .value
            .borrow()
            .clone()
            .expect("computed getter must run before first read completes")
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactivity::effect::Effect;
    use crate::reactivity::signal::Signal;
    use std::cell::Cell;

    #[test]
    fn recomputes_at_most_once_per_dependency_update() {
        let count = Signal::new(0i32);
        let evals = Rc::new(Cell::new(0));
        let evals2 = evals.clone();
        let count2 = count.clone();
        let plus_one = Computed::new(move || {
            evals2.set(evals2.get() + 1);
            count2.get() + 1
        });

        assert_eq!(evals.get(), 0, "lazy: not yet read");
        assert_eq!(plus_one.get(), 1);
        assert_eq!(evals.get(), 1);
        // Re-reading without a dependency change must not re-evaluate.
        assert_eq!(plus_one.get(), 1);
        assert_eq!(evals.get(), 1);

        count.set(1);
        assert_eq!(evals.get(), 1, "still lazy until actually read");
        assert_eq!(plus_one.get(), 2);
        assert_eq!(evals.get(), 2);
    }

    #[test]
    fn downstream_effect_reruns_when_computed_changes() {
        let count = Signal::new(0i32);
        let count2 = count.clone();
        let plus_one = Computed::new(move || count2.get() + 1);

        let runs = Rc::new(Cell::new(0));
        let runs2 = runs.clone();
        let plus_one2 = plus_one.clone();
        let _effect = Effect::new(move || {
            runs2.set(runs2.get() + 1);
            let _ = plus_one2.get();
        });
        assert_eq!(runs.get(), 1);
        count.set(5);
        assert_eq!(runs.get(), 2);
    }
}
