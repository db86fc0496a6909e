//! Dependency injection (§4.5): `provide`/`inject` over the component
//! instance tree. Rust has no prototype chain, so ancestor lookup is an
//! explicit parent-pointer walk instead of JS's implicit `Object.create`
//! chain — same observable behavior, different mechanism (§9 Design Notes).

use crate::vnode::PropValue;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// One component instance's own provided bindings, plus a weak link to the
/// parent's provide scope for lookup fallthrough. Weak, not `Rc`, because
/// ownership flows parent-to-child (§9: instances own their children); a
/// strong parent pointer here would be a cycle.
pub struct ProvideScope {
    own: RefCell<HashMap<String, PropValue>>,
    parent: Option<Weak<ProvideScope>>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ProvideScope {
    pub fn root() -> Rc<Self> {
        Rc::new(Self {
            own: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    pub fn child_of(parent: &Rc<Self>) -> Rc<Self> {
        Rc::new(Self {
            own: RefCell::new(HashMap::new()),
            parent: Some(Rc::downgrade(parent)),
        })
    }

    /// `provide(key, value)` — always writes into *this* instance's own map,
    /// never a shared ancestor's, so a provide never clobbers an ancestor's
    /// binding that other siblings also see.
    pub fn provide(&self, key: impl Into<String>, value: PropValue) {
        self.own.borrow_mut().insert(key.into(), value);
    }

    /// `inject(key, default?)` — walks from `self` up through parents,
    /// returning the nearest binding. Falls back to `default` (invoked if
    /// it's a factory) when no ancestor provided `key`.
    pub fn inject(self: &Rc<Self>, key: &str) -> Option<PropValue> {
        if let Some(v) = self.own.borrow().get(key) {
            return Some(v.clone());
        }
        let mut current = self.parent.clone();
        while let Some(weak) = current {
            let Some(scope) = weak.upgrade() else { break };
            if let Some(v) = scope.own.borrow().get(key) {
                return Some(v.clone());
            }
            current = scope.parent.clone();
        }
        None
    }

    pub fn inject_or(self: &Rc<Self>, key: &str, default: impl FnOnce() -> PropValue) -> PropValue {
        self.inject(key).unwrap_or_else(default)
    }

    pub fn inject_or_warn(self: &Rc<Self>, key: &str) -> PropValue {
        self.inject(key).unwrap_or_else(|| {
            crate::diagnostics::log_warn!(key, "injection requested but no matching provide() was found");
            PropValue::Null
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_provide_inject_override() {
        // §8.4 E5: P1(provide foo=a, bar=b) -> P2(provide foo=a') -> C(inject foo, bar)
        let p1 = ProvideScope::root();
        p1.provide("foo", PropValue::Str("a".into()));
        p1.provide("bar", PropValue::Str("b".into()));

        let p2 = ProvideScope::child_of(&p1);
        p2.provide("foo", PropValue::Str("a-prime".into()));

        let c = ProvideScope::child_of(&p2);
        assert_eq!(c.inject("foo"), Some(PropValue::Str("a-prime".into())));
        assert_eq!(c.inject("bar"), Some(PropValue::Str("b".into())));
    }

    #[test]
    fn missing_key_falls_back_to_default() {
        let root = ProvideScope::root();
        let child = ProvideScope::child_of(&root);
        assert!(child.inject("missing").is_none());
        let v = child.inject_or("missing", || PropValue::Int(42));
        assert_eq!(v, PropValue::Int(42));
    }
}
