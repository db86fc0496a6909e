//! `Store`: the object-shaped tracked container (§3.2, §4.2.1).
//!
//! Rust has no transparent proxies, so reads/writes go through explicit
//! `get`/`set` calls instead of field access — the `track`/`trigger`
//! contract underneath is otherwise identical to the spec.

use crate::reactivity::effect::{Dep, RawEffect};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A dynamically-typed value a `Store` can hold. Closed over the shapes the
/// template layer needs to express (§3.1's props/children payloads): this
/// is the Rust stand-in for "plain object/array" in the spec, not a general
/// purpose `Any`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Store(Rc<Store>),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}
impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}
impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}
impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// The reserved key used for `ITERATE`-bucket tracking: reads that enumerate
/// keys (`has_key`/a full iteration) subscribe here, so ADD/DELETE can
/// invalidate them even though no single key changed (§4.2.2).
const ITERATE_KEY: &str = "\0iterate";

/// The spec's "tracked container" over an object-shaped value.
///
/// `read_only` rejects writes (the read-only variant, §3.2). There is no
/// `shallow` variant: nested `Store`/`List` values are never auto-wrapped in
/// the first place (construction is always explicit, §9's "no transparent
/// proxies"), so there is nothing for a shallow mode to opt out of.
pub struct Store {
    fields: RefCell<HashMap<String, Value>>,
    deps: RefCell<HashMap<String, Rc<Dep>>>,
    read_only: bool,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Store {
    pub fn new() -> Rc<Self> {
        Self::from_fields(HashMap::new())
    }

    pub fn from_fields(fields: HashMap<String, Value>) -> Rc<Self> {
        Rc::new(Self {
            fields: RefCell::new(fields),
            deps: RefCell::new(HashMap::new()),
            read_only: false,
        })
    }

    /// The read-only variant: writes are rejected with a dev-only warning
    /// and are otherwise a no-op (§3.2, §7 internal invariants).
    pub fn read_only(self: &Rc<Self>) -> Rc<Self> {
        Rc::new(Self {
            fields: RefCell::new(self.fields.borrow().clone()),
            deps: RefCell::new(HashMap::new()),
            read_only: true,
        })
    }

    fn dep_for(&self, key: &str) -> Rc<Dep> {
        let mut deps = self.deps.borrow_mut();
        deps.entry(key.to_string()).or_insert_with(Dep::new).clone()
    }

    /// `track(target, GET, key)` + value read.
    pub fn get(&self, key: &str) -> Value {
        RawEffect::track(&self.dep_for(key));
        self.fields.borrow().get(key).cloned().unwrap_or(Value::Null)
    }

    /// `has` — tracked on the key itself, matching the spec's `HAS` op.
    pub fn has(&self, key: &str) -> bool {
        RawEffect::track(&self.dep_for(key));
        self.fields.borrow().contains_key(key)
    }

    /// Key enumeration — tracks the reserved `ITERATE` bucket.
    pub fn keys(&self) -> Vec<String> {
        RawEffect::track(&self.dep_for(ITERATE_KEY));
        self.fields.borrow().keys().cloned().collect()
    }

    /// `trigger(target, ADD|SET, key, new, old)`.
    ///
    /// Writing a read-only store is a no-op diagnostic, never a panic
    /// (§7: "prop mutation attempts... write to read-only proxy" are
    /// internal invariants, not `Result` errors).
    pub fn set(&self, key: &str, value: Value) {
        if self.read_only {
            crate::error::internal_invariant_violation(format!(
                "attempted to write key {key:?} on a read-only store"
            ));
            return;
        }
        let is_add = !self.fields.borrow().contains_key(key);
        let old = self.fields.borrow().get(key).cloned();
        if old.as_ref() == Some(&value) {
            return;
        }
        self.fields.borrow_mut().insert(key.to_string(), value);
        self.dep_for(key).trigger();
        if is_add {
            if let Some(iter_dep) = self.deps.borrow().get(ITERATE_KEY) {
                iter_dep.trigger();
            }
        }
    }

    /// `trigger(target, DELETE, key, ...)`.
    pub fn delete(&self, key: &str) {
        if self.read_only {
            crate::error::internal_invariant_violation(format!(
                "attempted to delete key {key:?} on a read-only store"
            ));
            return;
        }
        let existed = self.fields.borrow_mut().remove(key).is_some();
        if existed {
            self.dep_for(key).trigger();
            if let Some(iter_dep) = self.deps.borrow().get(ITERATE_KEY) {
                iter_dep.trigger();
            }
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// `wrap(x) === wrap(x)` / `wrap(wrap(x)) === wrap(x)` (§8.1 proxy
    /// identity law). Since a `Store` is always handled behind an `Rc`,
    /// cloning the handle already satisfies both laws — there is no
    /// separate "wrap" step to make idempotent.
    pub fn handle(self: &Rc<Self>) -> Rc<Self> {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactivity::effect::Effect;
    use std::cell::Cell;

    #[test]
    fn read_tracks_and_write_triggers() {
        let store = Store::new();
        store.set("count", Value::Int(0));
        let runs = Rc::new(Cell::new(0));
        let runs2 = runs.clone();
        let store2 = store.clone();
        let _effect = Effect::new(move || {
            runs2.set(runs2.get() + 1);
            let _ = store2.get("count");
        });
        assert_eq!(runs.get(), 1);
        store.set("count", Value::Int(1));
        assert_eq!(runs.get(), 2);
        // Unrelated key does not retrigger.
        store.set("other", Value::Int(1));
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn read_only_rejects_writes() {
        let store = Store::new();
        store.set("a", Value::Int(1));
        let ro = store.read_only();
        ro.set("a", Value::Int(2));
        assert_eq!(ro.get("a"), Value::Int(1));
    }

    #[test]
    fn add_triggers_iterate_bucket() {
        let store = Store::new();
        let runs = Rc::new(Cell::new(0));
        let runs2 = runs.clone();
        let store2 = store.clone();
        let _effect = Effect::new(move || {
            runs2.set(runs2.get() + 1);
            let _ = store2.keys();
        });
        assert_eq!(runs.get(), 1);
        store.set("new_key", Value::Bool(true));
        assert_eq!(runs.get(), 2);
    }
}
