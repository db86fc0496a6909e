//! `Signal<T>`: the spec's ref cell (§3.2) — a single-slot tracked container.
//!
//! Reads track on the sentinel `"value"` key; writes compare by `PartialEq`
//! and, if changed, trigger. Assigning a `Store` into a `Signal<Value>`
//! gives the "nested plain object auto-wrapped" behavior for free since
//! `Store` is always handled by `Rc`.

use crate::reactivity::effect::{Dep, RawEffect};
use std::cell::RefCell;
use std::rc::Rc;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

pub struct Signal<T> {
    value: RefCell<T>,
    dep: Rc<Dep>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl<T: Clone + PartialEq> Signal<T> {
    pub fn new(initial: T) -> Rc<Self> {
        Rc::new(Self {
            value: RefCell::new(initial),
            dep: Dep::new(),
        })
    }

    /// Reads track on the sentinel `"value"` key (§3.2).
    pub fn get(&self) -> T {
        RawEffect::track(&self.dep);
        self.value.borrow().clone()
    }

    /// Writes compare by equality and, if changed, trigger.
    pub fn set(&self, new_value: T) {
        let changed = *self.value.borrow() != new_value;
        if changed {
            *self.value.borrow_mut() = new_value;
            self.dep.trigger();
        }
    }

    /// Updates in place via `f`, triggering iff the result differs from the
    /// previous value. Avoids a redundant clone-compare-clone round trip for
    /// `update`-style call sites (`count.update(|c| c + 1)`).
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let new_value = f(&self.value.borrow());
        self.set(new_value);
    }

    /// Reads without tracking — an escape hatch for code that needs the
    /// current value outside of a reactive computation (e.g. logging).
    pub fn peek(&self) -> T {
        self.value.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactivity::effect::Effect;
    use std::cell::Cell;

    #[test]
    fn write_only_triggers_on_change() {
        let signal = Signal::new(0i32);
        let runs = Rc::new(Cell::new(0));
        let runs2 = runs.clone();
        let signal2 = signal.clone();
        let _effect = Effect::new(move || {
            runs2.set(runs2.get() + 1);
            let _ = signal2.get();
        });
        assert_eq!(runs.get(), 1);
        signal.set(0);
        assert_eq!(runs.get(), 1, "identical value must not retrigger");
        signal.set(1);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn peek_does_not_track() {
        let signal = Signal::new(0i32);
        let runs = Rc::new(Cell::new(0));
        let runs2 = runs.clone();
        let signal2 = signal.clone();
        let _effect = Effect::new(move || {
            runs2.set(runs2.get() + 1);
            let _ = signal2.peek();
        });
        signal.set(42);
        assert_eq!(runs.get(), 1, "peek must not establish a dependency");
    }
}
