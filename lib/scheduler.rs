//! Process-wide job scheduler (§4.3).
//!
//! A single-threaded, cooperative queue with a pre-flush list (ordered by
//! ascending job id — parents before children, §5's ordering guarantee) and
//! a post-flush list. There is no OS event loop backing this crate, so the
//! "microtask boundary" the spec describes is approximated: `queue_flush`
//! drains the queue synchronously to quiescence the first time it's called
//! in a given call chain, and any job enqueued *during* that drain (e.g. a
//! watcher writing another signal) is folded into the same flush via the
//! "if new work arrived, recurse" step — so a burst of writes made *while a
//! flush is already draining* coalesces into that same flush, just without a
//! real microtask delay. Ordinary top-level writes (e.g. three sequential
//! `signal.set(...)` calls outside of any flush) do NOT coalesce on their
//! own — each one finds `FLUSH_PENDING`/`FLUSHING` both clear and runs its
//! own synchronous flush to completion before the next write even starts.
//! `batch` (§4.3's explicit transaction form) covers that case: it defers
//! `queue_flush` until the outermost `batch` call returns, so writes made
//! anywhere inside it — including through intermediate function calls —
//! land in one flush. `next_tick` (under the `effects` feature) additionally
//! yields to the async runtime once, for call sites that need a genuine
//! suspension point.

use crate::reactivity::effect::EffectId;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A unit of scheduled work. `id` is the owning effect's id when the job is
/// a render effect or computed scheduler hand-off; jobs with no natural id
/// (arbitrary post-flush callbacks) use `None`, which sorts last.
#[derive(Clone)]
pub struct SchedulerJob {
    pub id: Option<EffectId>,
    body: Rc<RefCell<dyn FnMut()>>,
}

impl SchedulerJob {
    pub fn new(id: Option<EffectId>, body: impl FnMut() + 'static) -> Self {
        Self {
            id,
            body: Rc::new(RefCell::new(body)),
        }
    }

    fn ptr(&self) -> usize {
        Rc::as_ptr(&self.body) as *const () as usize
    }

    fn run(&self) {
        (self.body.borrow_mut())();
    }
}

const RECURSION_LIMIT: u32 = 100;

thread_local! {
    static QUEUE: RefCell<Vec<Option<SchedulerJob>>> = const { RefCell::new(Vec::new()) };
    static POST_QUEUE: RefCell<Vec<SchedulerJob>> = const { RefCell::new(Vec::new()) };
    static FLUSH_PENDING: Cell<bool> = const { Cell::new(false) };
    static FLUSHING: Cell<bool> = const { Cell::new(false) };
    static RECURSION_COUNTS: RefCell<HashMap<usize, u32>> = RefCell::new(HashMap::new());
    /// Nesting depth of active `batch()` calls. While above zero,
    /// `queue_flush` records that a flush is owed instead of running one.
    static BATCH_DEPTH: Cell<u32> = const { Cell::new(0) };
    static BATCH_OWES_FLUSH: Cell<bool> = const { Cell::new(false) };
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// De-dups against the current queue by job identity, appends, and flushes.
pub fn queue_job(job: SchedulerJob) {
    let already_queued = QUEUE.with(|q| {
        q.borrow()
            .iter()
            .flatten()
            .any(|existing| existing.ptr() == job.ptr())
    });
    if !already_queued {
        QUEUE.with(|q| q.borrow_mut().push(Some(job)));
    }
    queue_flush();
}

/// Appends one or more post-flush callbacks and flushes.
pub fn queue_post_flush_cb(cbs: impl IntoIterator<Item = SchedulerJob>) {
    POST_QUEUE.with(|q| q.borrow_mut().extend(cbs));
    queue_flush();
}

/// Removes an already-queued job without shifting the rest of the queue.
pub fn invalidate_job(job: &SchedulerJob) {
    QUEUE.with(|q| {
        let mut q = q.borrow_mut();
        for slot in q.iter_mut() {
            if slot.as_ref().is_some_and(|j| j.ptr() == job.ptr()) {
                *slot = None;
            }
        }
    });
}

fn queue_flush() {
    if BATCH_DEPTH.with(Cell::get) > 0 {
        BATCH_OWES_FLUSH.with(|o| o.set(true));
        return;
    }
    if FLUSH_PENDING.with(Cell::get) || FLUSHING.with(Cell::get) {
        return;
    }
    FLUSH_PENDING.with(|p| p.set(true));
    flush_jobs();
}

/// Runs `f`, deferring every `queue_job`/`queue_post_flush_cb`-triggered
/// flush until `f` returns — including ones made through nested function
/// calls, not just direct writes in `f`'s own body. Nested `batch`
/// calls are transparent: only the outermost one actually defers, and the
/// single coalesced flush runs once it returns. Mirrors the "a burst of
/// synchronous writes still coalesces into one flush" guarantee for writes
/// that aren't already inside an active scheduler drain (§4.3's explicit
/// transaction form of that same guarantee).
pub fn batch<T>(f: impl FnOnce() -> T) -> T {
    BATCH_DEPTH.with(|d| d.set(d.get() + 1));
    let result = f();
    let depth = BATCH_DEPTH.with(|d| {
        let next = d.get() - 1;
        d.set(next);
        next
    });
    if depth == 0 && BATCH_OWES_FLUSH.with(|o| o.replace(false)) {
        queue_flush();
    }
    result
}

/// Sorts by ascending id (parent-before-child, §5), drains the queue under
/// a per-job recursion guard, then drains post-flush callbacks. Recurses if
/// new work arrived while draining.
fn flush_jobs() {
    FLUSH_PENDING.with(|p| p.set(false));
    FLUSHING.with(|f| f.set(true));

    QUEUE.with(|q| {
        q.borrow_mut().sort_by_key(|slot| match slot {
            Some(job) => (0u8, job.id.unwrap_or(u64::MAX)),
            None => (1u8, u64::MAX),
        });
    });

    loop {
        let job = QUEUE.with(|q| {
            let mut q = q.borrow_mut();
            q.iter_mut().find_map(|slot| slot.take())
        });
        let Some(job) = job else { break };
        let count = RECURSION_COUNTS.with(|c| {
            let mut c = c.borrow_mut();
            let entry = c.entry(job.ptr()).or_insert(0);
            *entry += 1;
            *entry
        });
        if count > RECURSION_LIMIT {
            crate::error::internal_invariant_violation(
                "Maximum recursive updates exceeded — a job re-queued itself more than the recursion limit allows",
            );
            continue;
        }
        job.run();
    }
    QUEUE.with(|q| q.borrow_mut().clear());

    flush_post_flush_cbs();

    RECURSION_COUNTS.with(|c| c.borrow_mut().clear());
    FLUSHING.with(|f| f.set(false));

    let more_work = QUEUE.with(|q| !q.borrow().is_empty()) || POST_QUEUE.with(|q| !q.borrow().is_empty());
    if more_work {
        queue_flush();
    }
}

fn flush_post_flush_cbs() {
    let cbs = POST_QUEUE.with(|q| q.borrow_mut().split_off(0));
    for cb in cbs {
        cb.run();
    }
}

/// Test/host-loop hook: forces a flush even if nothing is pending. Real
/// call sites never need this — `queue_job`/`queue_post_flush_cb` already
/// flush — but a host loop with no reactive writes of its own (e.g. one
/// driven purely by external I/O) can use it to drain deferred work.
pub fn flush_now() {
    if !FLUSHING.with(Cell::get) {
        flush_jobs();
    }
}

/// Resolves once the current (and any newly-chained) flush has completed.
/// Under the `effects` feature this is a real suspension point (a single
/// async yield); otherwise flushing is already synchronous by the time this
/// returns, so it degenerates to `Ready` immediately.
#[cfg(feature = "effects")]
pub async fn next_tick() {
    tokio::task::yield_now().await;
}

#[cfg(not(feature = "effects"))]
pub fn next_tick_sync() {
    flush_now();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell as StdRefCell;
    use std::rc::Rc as StdRc;

    #[test]
    fn idempotent_enqueue() {
        let calls = StdRc::new(StdRefCell::new(0));
        let calls2 = calls.clone();
        let job = SchedulerJob::new(Some(1), move || {
            *calls2.borrow_mut() += 1;
        });
        queue_job(job.clone());
        queue_job(job.clone());
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn parent_before_child_ordering() {
        let order = StdRc::new(StdRefCell::new(Vec::new()));
        let order_a = order.clone();
        let order_b = order.clone();
        // Enqueue child (higher id) before parent (lower id) to prove sort,
        // not insertion order, decides execution order.
        let child = SchedulerJob::new(Some(5), move || order_b.borrow_mut().push("child"));
        let parent = SchedulerJob::new(Some(2), move || order_a.borrow_mut().push("parent"));
        FLUSHING.with(|f| f.set(true)); // Queue without triggering a flush mid-setup.
        QUEUE.with(|q| q.borrow_mut().push(Some(child)));
        QUEUE.with(|q| q.borrow_mut().push(Some(parent)));
        FLUSHING.with(|f| f.set(false));
        flush_now();
        assert_eq!(*order.borrow(), vec!["parent", "child"]);
    }

    #[test]
    fn batch_coalesces_sequential_top_level_writes_into_one_flush() {
        // Without `batch`, each `queue_job` call below would see an idle
        // queue and flush synchronously before the next one even runs, so
        // job 1's body would observe an empty queue. Inside `batch`, all
        // three are queued first and the flush only happens once `batch`
        // returns, so job 1's body should still see the other two pending.
        let remaining_when_first_runs = StdRc::new(StdRefCell::new(None::<usize>));
        let remaining2 = remaining_when_first_runs.clone();
        let runs = StdRc::new(StdRefCell::new(0));
        let runs2 = runs.clone();

        batch(|| {
            let runs_a = runs2.clone();
            queue_job(SchedulerJob::new(None, move || {
                *remaining2.borrow_mut() = Some(QUEUE.with(|q| q.borrow().iter().flatten().count()));
                *runs_a.borrow_mut() += 1;
            }));
            let runs_b = runs2.clone();
            queue_job(SchedulerJob::new(None, move || *runs_b.borrow_mut() += 1));
            let runs_c = runs2.clone();
            queue_job(SchedulerJob::new(None, move || *runs_c.borrow_mut() += 1));
        });

        assert_eq!(*runs.borrow(), 3, "all three jobs ran in the single post-batch flush");
        assert_eq!(
            *remaining_when_first_runs.borrow(),
            Some(2),
            "the other two jobs were already queued before the flush started"
        );
    }

    #[test]
    fn invalidate_removes_without_shifting() {
        let calls = StdRc::new(StdRefCell::new(0));
        let calls2 = calls.clone();
        let job = SchedulerJob::new(Some(1), move || *calls2.borrow_mut() += 1);
        FLUSHING.with(|f| f.set(true));
        QUEUE.with(|q| q.borrow_mut().push(Some(job.clone())));
        FLUSHING.with(|f| f.set(false));
        invalidate_job(&job);
        flush_now();
        assert_eq!(*calls.borrow(), 0);
    }
}
