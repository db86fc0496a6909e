//! Shape and patch-flag bitsets (§3.1). Grounded in the bitflags idiom the
//! teacher uses for its own style bitsets (`style::BorderEdges`).

use bitflags::bitflags;

bitflags! {
    /// Classifies a VNode's kind and the shape of its `children` (§3.1).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ShapeFlags: u16 {
        const ELEMENT = 1 << 0;
        const FUNCTIONAL_COMPONENT = 1 << 1;
        const STATEFUL_COMPONENT = 1 << 2;
        const TEXT_CHILDREN = 1 << 3;
        const ARRAY_CHILDREN = 1 << 4;
        const SLOTS_CHILDREN = 1 << 5;
        const TELEPORT = 1 << 6;
        const SUSPENSE = 1 << 7;
        const COMPONENT_SHOULD_KEEP_ALIVE = 1 << 8;
        const COMPONENT_KEPT_ALIVE = 1 << 9;
        const COMPONENT = Self::STATEFUL_COMPONENT.bits() | Self::FUNCTIONAL_COMPONENT.bits();
    }
}

bitflags! {
    /// Names *what* about a VNode could have changed since its previous
    /// render at the same source position (§3.1). The compiler computes
    /// these; the reconciler reads them to choose a fast path (§4.4.2).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PatchFlags: u32 {
        const TEXT = 1 << 0;
        const CLASS = 1 << 1;
        const STYLE = 1 << 2;
        const PROPS = 1 << 3;
        const FULL_PROPS = 1 << 4;
        const HYDRATE_EVENTS = 1 << 5;
        const STABLE_FRAGMENT = 1 << 6;
        const KEYED_FRAGMENT = 1 << 7;
        const UNKEYED_FRAGMENT = 1 << 8;
        const NEED_PATCH = 1 << 9;
        const DYNAMIC_SLOTS = 1 << 10;
        const HOISTED = 1 << 11;
        const BAIL = 1 << 12;
    }
}

impl PatchFlags {
    /// `patchFlag > 0` per §4.4.2 — `HOISTED`/`BAIL` don't count as "has a
    /// fast path" on their own; they're sentinels checked separately.
    pub fn has_fast_path(self) -> bool {
        !self.is_empty() && !self.contains(Self::HOISTED) && !self.contains(Self::BAIL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_shape_union() {
        assert!(ShapeFlags::COMPONENT.contains(ShapeFlags::STATEFUL_COMPONENT));
        assert!(ShapeFlags::COMPONENT.contains(ShapeFlags::FUNCTIONAL_COMPONENT));
    }

    #[test]
    fn hoisted_is_not_a_fast_path() {
        assert!(!PatchFlags::HOISTED.has_fast_path());
        assert!(PatchFlags::TEXT.has_fast_path());
    }
}
