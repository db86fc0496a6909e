//! Block patch (§4.4.4): diff only the flat `dynamicChildren` view instead
//! of the full subtree — O(dynamic nodes) regardless of static structure
//! size.

use crate::vnode::VNodeRef;

/// Pairs old/new block children positionally — a block's `dynamicChildren`
/// array is always structurally aligned between renders of the same source
/// position (§3.1 invariant), so no key matching is needed here; the
/// reconciler's normal `patch` on each pair still delegates to a keyed
/// diff internally if the pair happens to be an array-children container.
/// The alignment only holds because `compiler::program::Exec` never tracks
/// `v-for`/`v-if` output into a block (their entry count isn't stable
/// across renders) — everything that does end up in this array comes from
/// a fixed template position.
pub fn pair_block_children(old_children: &[VNodeRef], new_children: &[VNodeRef]) -> Vec<(VNodeRef, VNodeRef)> {
    old_children
        .iter()
        .zip(new_children.iter())
        .map(|(o, n)| (o.clone(), n.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vnode::{node_ref, VNode};

    #[test]
    fn pairs_by_position_not_key() {
        let old = vec![node_ref(VNode::text("a"))];
        let new = vec![node_ref(VNode::text("b"))];
        let pairs = pair_block_children(&old, &new);
        assert_eq!(pairs.len(), 1);
    }
}
