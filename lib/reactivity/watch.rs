//! Watchers: user-facing effects with explicit source selection, optional
//! immediate invocation, deep traversal, and a choice of flush timing
//! (§4.2.5).

use crate::reactivity::effect::{pause_tracking, reset_tracking, Dep, EffectOptions, RawEffect};
use crate::reactivity::store::Store;
use crate::scheduler::{self, SchedulerJob};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FlushTiming {
    Pre,
    Post,
    Sync,
}

#[derive(Clone)]
pub struct WatchOptions {
    pub immediate: bool,
    pub deep: bool,
    pub flush: FlushTiming,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            immediate: false,
            deep: false,
            flush: FlushTiming::Pre,
        }
    }
}

/// Registers a cleanup that runs the next time the source re-fires, or when
/// the watcher is stopped (§5 Cancellation).
pub struct OnInvalidate<'a> {
    slot: &'a RefCell<Option<Box<dyn FnOnce()>>>,
}

impl OnInvalidate<'_> {
    pub fn register(&self, cleanup: impl FnOnce() + 'static) {
        *self.slot.borrow_mut() = Some(Box::new(cleanup));
    }
}

/// A stop handle: deactivates the underlying effect and drops it from the
/// scheduler's view (no component teardown list here — callers own the
/// handle's lifetime directly, matching the spec's explicit `stop()`).
pub struct WatchHandle {
    raw: Rc<RawEffect>,
    invalidate: Rc<RefCell<Option<Box<dyn FnOnce()>>>>,
}

impl WatchHandle {
    pub fn stop(&self) {
        self.raw.stop();
        if let Some(cleanup) = self.invalidate.borrow_mut().take() {
            cleanup();
        }
    }
}

/// Reads every reachable property of `store`, breaking cycles via a visited
/// set keyed by the store's `Rc` pointer (§4.2.5 step 2, §9 Design Notes).
/// This is what gives `deep: true` its "watch the whole tree" behavior
/// without transparent proxies.
pub fn deep_read(store: &Rc<Store>, visited: &mut HashSet<usize>) {
    let ptr = Rc::as_ptr(store) as usize;
    if !visited.insert(ptr) {
        return;
    }
    for key in store.keys() {
        if let crate::reactivity::store::Value::Store(nested) = store.get(&key) {
            deep_read(&nested, visited);
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// `watch(getter, callback, options)`.
///
/// `getter` is the normalized source (§4.2.5 step 1 — callers combine
/// multiple sources into one getter themselves, e.g. `move || (a.get(), b.get())`).
pub fn watch<T: Clone + PartialEq + 'static>(
    getter: impl Fn() -> T + 'static,
    callback: impl FnMut(&T, &T, &OnInvalidate) + 'static,
    options: WatchOptions,
) -> WatchHandle {
    let old_value: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
    let invalidate_slot: Rc<RefCell<Option<Box<dyn FnOnce()>>>> = Rc::new(RefCell::new(None));
    let deep = options.deep;
    let primed = Rc::new(std::cell::Cell::new(false));
    // Shared so the `immediate` path below can invoke the same callback the
    // effect body calls on later triggers, instead of only being reachable
    // from inside the (moved) body closure.
    let callback: Rc<RefCell<dyn FnMut(&T, &T, &OnInvalidate)>> = Rc::new(RefCell::new(callback));

    let old_value_for_body = old_value.clone();
    let invalidate_for_body = invalidate_slot.clone();
    let primed_for_body = primed.clone();
    let callback_for_body = callback.clone();

    // The raw effect body IS the comparison+callback step (the "runner").
    // Priming (non-immediate first run) and the immediate-invoke case both
    // just call `raw.run()`/this body directly; every later trigger goes
    // back through the scheduler below, which also calls `raw.run()`, so
    // cleanup-then-retrack always happens uniformly through one code path.
    let body = move || {
        let new_value = getter();
        if !primed_for_body.get() {
            // First run ever: seed old_value, never invoke the callback —
            // this covers both the priming path and `immediate` (which
            // fires the callback itself, separately, right after creation).
            primed_for_body.set(true);
            *old_value_for_body.borrow_mut() = Some(new_value);
            return;
        }
        if let Some(cleanup) = invalidate_for_body.borrow_mut().take() {
            cleanup();
        }
        let mut old = old_value_for_body.borrow_mut();
        let changed = deep || old.as_ref() != Some(&new_value);
        if changed {
            let previous = old.clone().unwrap_or_else(|| new_value.clone());
            *old = Some(new_value.clone());
            drop(old);
            let on_invalidate = OnInvalidate {
                slot: &invalidate_for_body,
            };
            (callback_for_body.borrow_mut())(&new_value, &previous, &on_invalidate);
        }
    };

    let scheduler_job_id = Rc::new(RefCell::new(None::<crate::reactivity::effect::EffectId>));
    let scheduler_job_id2 = scheduler_job_id.clone();

    let scheduler_fn: Box<dyn Fn(Rc<RawEffect>)> = match options.flush {
        FlushTiming::Sync => Box::new(move |effect| effect.run()),
        FlushTiming::Pre => Box::new(move |effect| {
            let id = *scheduler_job_id2.borrow();
            scheduler::queue_job(SchedulerJob::new(id, move || effect.run()));
        }),
        FlushTiming::Post => Box::new(move |effect| {
            let id = *scheduler_job_id2.borrow();
            scheduler::queue_post_flush_cb(std::iter::once(SchedulerJob::new(id, move || {
                effect.run()
            })));
        }),
    };

    let raw = RawEffect::new(
        body,
        EffectOptions {
            lazy: true,
            computed: true,
            scheduler: Some(scheduler_fn),
            ..Default::default()
        },
    );
    *scheduler_job_id.borrow_mut() = Some(raw.id);

    // Prime (runs the body once, seeding old_value with no callback fired)
    // then, if immediate, invoke the callback directly with old == new —
    // re-running `raw.run()` would just re-enter the priming branch above
    // and never call back at all, since `primed` gates that branch, not a
    // one-shot latch.
    raw.run();
    if options.immediate {
        let value = old_value.borrow().clone().expect("priming run seeds old_value");
        let on_invalidate = OnInvalidate { slot: &invalidate_slot };
        (callback.borrow_mut())(&value, &value, &on_invalidate);
    }

    WatchHandle {
        raw,
        invalidate: invalidate_slot,
    }
}

/// `watchEffect(fn)` — a self-contained effect supporting `onInvalidate`
/// (§4.2.5 step 1d). Runs synchronously once at creation, then reruns
/// (through the scheduler, per `flush`) whenever any tracked read changes.
pub fn watch_effect(
    mut body: impl FnMut(&OnInvalidate) + 'static,
    flush: FlushTiming,
) -> WatchHandle {
    let invalidate_slot: Rc<RefCell<Option<Box<dyn FnOnce()>>>> = Rc::new(RefCell::new(None));
    let invalidate_for_body = invalidate_slot.clone();

    let runner = move || {
        if let Some(cleanup) = invalidate_for_body.borrow_mut().take() {
            cleanup();
        }
        let on_invalidate = OnInvalidate {
            slot: &invalidate_for_body,
        };
        body(&on_invalidate);
    };
    let runner = Rc::new(RefCell::new(runner));

    let scheduler_job_id = Rc::new(RefCell::new(None::<crate::reactivity::effect::EffectId>));
    let scheduler_job_id2 = scheduler_job_id.clone();

    let scheduler_fn: Box<dyn Fn(Rc<RawEffect>)> = match flush {
        FlushTiming::Sync => {
            let runner_for_sched = runner.clone();
            Box::new(move |_effect| (runner_for_sched.borrow_mut())())
        }
        FlushTiming::Pre => {
            let runner_for_sched = runner.clone();
            Box::new(move |_effect| {
                let id = *scheduler_job_id2.borrow();
                let runner = runner_for_sched.clone();
                scheduler::queue_job(SchedulerJob::new(id, move || (runner.borrow_mut())()));
            })
        }
        FlushTiming::Post => {
            let runner_for_sched = runner.clone();
            Box::new(move |_effect| {
                let id = *scheduler_job_id2.borrow();
                let runner = runner_for_sched.clone();
                scheduler::queue_post_flush_cb(std::iter::once(SchedulerJob::new(id, move || {
                    (runner.borrow_mut())()
                })));
            })
        }
    };

    let runner_for_raw = runner.clone();
    let raw = RawEffect::new(
        move || (runner_for_raw.borrow_mut())(),
        EffectOptions {
            lazy: false,
            computed: true,
            scheduler: Some(scheduler_fn),
            ..Default::default()
        },
    );
    *scheduler_job_id.borrow_mut() = Some(raw.id);

    WatchHandle {
        raw,
        invalidate: invalidate_slot,
    }
}

/// Pauses tracking for the duration of `f`'s execution — used to read a
/// value without establishing a dependency (e.g. inside a scheduler
/// callback that must not itself become reactive).
pub fn untracked<T>(f: impl FnOnce() -> T) -> T {
    let previous = pause_tracking();
    let result = f();
    reset_tracking(previous);
    result
}

/// Marks `dep` tracked without requiring an active effect context — exposed
/// for `deep_read`'s manual traversal call sites that want to piggyback on
/// whatever effect is currently running.
pub fn track_dep(dep: &Rc<Dep>) {
    RawEffect::track(dep);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactivity::signal::Signal;
    use crate::reactivity::store::Value;

    #[test]
    fn non_immediate_watch_does_not_fire_on_creation() {
        let count = Signal::new(0i32);
        let fired = Rc::new(RefCell::new(0));
        let fired2 = fired.clone();
        let count2 = count.clone();
        let _handle = watch(
            move || count2.get(),
            move |_new, _old, _inv| *fired2.borrow_mut() += 1,
            WatchOptions { flush: FlushTiming::Sync, ..Default::default() },
        );
        assert_eq!(*fired.borrow(), 0);

        count.set(1);
        assert_eq!(*fired.borrow(), 1);
    }

    #[test]
    fn immediate_watch_fires_once_on_creation_with_old_equal_to_new() {
        let count = Signal::new(5i32);
        let seen: Rc<RefCell<Vec<(i32, i32)>>> = Rc::new(RefCell::new(Vec::new()));
        let seen2 = seen.clone();
        let count2 = count.clone();
        let _handle = watch(
            move || count2.get(),
            move |new, old, _inv| seen2.borrow_mut().push((*new, *old)),
            WatchOptions { immediate: true, flush: FlushTiming::Sync, ..Default::default() },
        );
        assert_eq!(*seen.borrow(), vec![(5, 5)]);

        count.set(6);
        assert_eq!(*seen.borrow(), vec![(5, 5), (6, 5)]);
    }

    #[test]
    fn watch_effect_runs_immediately_and_on_every_tracked_change() {
        let count = Signal::new(0i32);
        let runs = Rc::new(RefCell::new(0));
        let runs2 = runs.clone();
        let count2 = count.clone();
        let _handle = watch_effect(
            move |_inv| {
                count2.get();
                *runs2.borrow_mut() += 1;
            },
            FlushTiming::Sync,
        );
        assert_eq!(*runs.borrow(), 1);

        count.set(1);
        assert_eq!(*runs.borrow(), 2);
    }

    #[test]
    fn stopped_watch_no_longer_reacts() {
        let count = Signal::new(0i32);
        let fired = Rc::new(RefCell::new(0));
        let fired2 = fired.clone();
        let count2 = count.clone();
        let handle = watch(
            move || count2.get(),
            move |_new, _old, _inv| *fired2.borrow_mut() += 1,
            WatchOptions { flush: FlushTiming::Sync, ..Default::default() },
        );
        handle.stop();
        count.set(1);
        assert_eq!(*fired.borrow(), 0);
    }

    #[test]
    fn deep_read_visits_nested_stores_without_looping_on_cycles() {
        let root = Store::new();
        let child = Store::new();
        child.set("leaf", Value::Int(1));
        root.set("child", Value::Store(child.clone()));
        // A self-reference would loop forever without the visited-set guard.
        child.set("back", Value::Store(root.clone()));

        let mut visited = HashSet::new();
        deep_read(&root, &mut visited);
        assert_eq!(visited.len(), 2);
    }
}
