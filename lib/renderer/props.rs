//! Props update (§4.4.8): splitting raw props into declared props vs attrs,
//! and `resolvePropValue`'s default/boolean-casting pipeline.

use crate::component::{PropOption, PropsOptions};
use crate::reactivity::Store;
use crate::vnode::{PropValue, Props};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn to_store_value(v: &PropValue) -> crate::reactivity::Value {
    match v {
        PropValue::Null => crate::reactivity::Value::Null,
        PropValue::Bool(b) => crate::reactivity::Value::Bool(*b),
        PropValue::Int(i) => crate::reactivity::Value::Int(*i),
        PropValue::Float(f) => crate::reactivity::Value::Float(*f),
        PropValue::Str(s) => crate::reactivity::Value::Str(s.clone()),
        PropValue::Handler(_) => crate::reactivity::Value::Null,
    }
}

/// `resolvePropValue`: default value, then boolean casting, applied in
/// order (§4.4.8).
pub fn resolve_prop_value(name: &str, option: &PropOption, raw: Option<&PropValue>) -> PropValue {
    let mut value = match raw {
        Some(v) => v.clone(),
        None => match &option.default {
            // "invoking a function default without reactivity tracking" —
            // there is nothing to untrack here since the default closure
            // itself doesn't read reactive state through this call path,
            // but callers that build closures capturing signals should
            // invoke them via `reactivity::untracked` themselves.
            Some(f) => f(),
            None => PropValue::Null,
        },
    };

    if option.is_boolean {
        value = match value {
            PropValue::Null => PropValue::Bool(false),
            PropValue::Str(s) if option.boolean_before_string && (s.is_empty() || s == name) => {
                PropValue::Bool(true)
            }
            other => other,
        };
    }

    value
}

/// Splits `raw` into `(props, attrs)` per `options`, applying casting.
pub fn split_props(raw: &Props, options: &PropsOptions) -> (Props, Props) {
    let mut props = Props::new();
    let mut attrs = Props::new();
    for (key, value) in raw {
        if let Some(option) = options.get(key) {
            props.insert(key.clone(), resolve_prop_value(key, option, Some(value)));
        } else {
            attrs.insert(key.clone(), value.clone());
        }
    }
    // Declared props absent from `raw` still need default/boolean casting.
    for (key, option) in options {
        if !raw.contains_key(key) {
            props.insert(key.clone(), resolve_prop_value(key, option, None));
        }
    }
    (props, attrs)
}

/// Full update path (§4.4.8 "otherwise, run the full set"): re-apply every
/// new prop; restore defaults or delete keys that disappeared.
pub fn update_props_full(
    props_store: &std::rc::Rc<Store>,
    attrs_store: &std::rc::Rc<Store>,
    new_raw: &Props,
    old_raw: &Props,
    options: &PropsOptions,
) {
    let (new_props, new_attrs) = split_props(new_raw, options);
    for (key, value) in &new_props {
        props_store.set(key, to_store_value(value));
    }
    for (key, value) in &new_attrs {
        attrs_store.set(key, to_store_value(value));
    }
    for key in old_raw.keys() {
        if new_raw.contains_key(key) {
            continue;
        }
        if let Some(option) = options.get(key) {
            let resolved = resolve_prop_value(key, option, None);
            props_store.set(key, to_store_value(&resolved));
        } else {
            attrs_store.delete(key);
        }
    }
}

/// Fast path (§4.4.8 "iterate only dynamicProps"): patch only the named
/// keys, still routed through the same split/cast logic per key.
pub fn update_props_dynamic(
    props_store: &std::rc::Rc<Store>,
    attrs_store: &std::rc::Rc<Store>,
    new_raw: &Props,
    dynamic_props: &[String],
    options: &PropsOptions,
) {
    for key in dynamic_props {
        let raw_value = new_raw.get(key);
        if let Some(option) = options.get(key) {
            let resolved = resolve_prop_value(key, option, raw_value);
            props_store.set(key, to_store_value(&resolved));
        } else if let Some(value) = raw_value {
            attrs_store.set(key, to_store_value(value));
        } else {
            attrs_store.delete(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_prop_absent_casts_false() {
        let option = PropOption {
            is_boolean: true,
            ..Default::default()
        };
        let v = resolve_prop_value("flag", &option, None);
        assert_eq!(v, PropValue::Bool(false));
    }

    #[test]
    fn boolean_before_string_empty_casts_true() {
        // §8.4 E6: {flag: Boolean, name: [Boolean, String]}, name: "" -> true
        let option = PropOption {
            is_boolean: true,
            boolean_before_string: true,
            ..Default::default()
        };
        let v = resolve_prop_value("name", &option, Some(&PropValue::Str(String::new())));
        assert_eq!(v, PropValue::Bool(true));
    }

    #[test]
    fn e6_props_casting_scenario() {
        let mut options = PropsOptions::new();
        options.insert(
            "flag".into(),
            PropOption {
                is_boolean: true,
                ..Default::default()
            },
        );
        options.insert(
            "name".into(),
            PropOption {
                is_boolean: true,
                boolean_before_string: true,
                ..Default::default()
            },
        );
        let mut raw = Props::new();
        raw.insert("flag".into(), PropValue::Null);
        raw.insert("name".into(), PropValue::Str(String::new()));

        let (props, _attrs) = split_props(&raw, &options);
        assert_eq!(props.get("flag"), Some(&PropValue::Bool(false)));
        assert_eq!(props.get("name"), Some(&PropValue::Bool(true)));
    }
}
