//! Full children patch (§4.4.5): unkeyed index-by-index diff, and the
//! keyed diff with its longest-increasing-subsequence move-minimization
//! pass.

use crate::vnode::{node_ref, same_vnode_type, VKey, VNode, VNodeRef};

//--------------------------------------------------------------------------------------------------
// Longest increasing subsequence
//--------------------------------------------------------------------------------------------------

/// O(n log n) patience-sort LIS, returning the *indices into `arr`* that
/// form the subsequence (§4.4.5, §8.3 scenario 6). `0` entries in `arr` are
/// the sentinel ("no old counterpart") and are never considered part of the
/// subsequence, matching the reconciler's use where those positions must
/// always mount rather than be treated as stable.
pub fn longest_increasing_subsequence(arr: &[usize]) -> Vec<usize> {
    if arr.is_empty() {
        return Vec::new();
    }
    let mut result: Vec<usize> = Vec::new(); // indices into `arr`, tails of increasing runs
    let mut predecessors: Vec<isize> = vec![-1; arr.len()];

    for i in 0..arr.len() {
        let value = arr[i];
        if value == 0 {
            continue;
        }
        if let Some(&last) = result.last() {
            if arr[last] < value {
                predecessors[i] = last as isize;
                result.push(i);
                continue;
            }
        }
        // Binary search for the first tail >= value, replace it.
        let mut lo = 0usize;
        let mut hi = result.len();
        while lo < hi {
            let mid = (lo + hi) / 2;
            if arr[result[mid]] < value {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        if lo > 0 {
            predecessors[i] = result[lo - 1] as isize;
        }
        if lo < result.len() {
            result[lo] = i;
        } else {
            result.push(i);
        }
    }

    let mut sequence = vec![0usize; result.len()];
    let mut k = *result.last().unwrap_or(&0) as isize;
    for entry in sequence.iter_mut().rev() {
        *entry = k as usize;
        k = predecessors[k as usize];
    }
    sequence
}

//--------------------------------------------------------------------------------------------------
// Diff plans
//--------------------------------------------------------------------------------------------------

/// One instruction the reconciler executes against the host backend. Kept
/// as data (rather than calling back into `patch`/`mount`/`unmount`
/// directly) so the algorithm here is testable without a host backend —
/// `renderer::patch` is the only caller that interprets these against a
/// real tree.
pub enum ChildOp {
    /// Patch the pair at these old/new child indices (recurses into `patch`).
    Patch { old_index: usize, new_index: usize },
    /// Mount new child at `new_index`, inserting before `anchor_new_index`
    /// (a new-children index) or appending if `None`.
    Mount { new_index: usize, anchor_new_index: Option<usize> },
    Unmount { old_index: usize },
    /// Move the already-mounted node originally at `old_index` so it now
    /// sits before `anchor_new_index` (or at the end if `None`).
    Move { old_index: usize, anchor_new_index: Option<usize> },
}

/// Unkeyed diff (§4.4.5): patch index-by-index up to the shorter length,
/// then unmount old's tail or mount new's tail.
pub fn diff_unkeyed(old_len: usize, new_len: usize) -> Vec<ChildOp> {
    let common = old_len.min(new_len);
    let mut ops = Vec::new();
    for i in 0..common {
        ops.push(ChildOp::Patch {
            old_index: i,
            new_index: i,
        });
    }
    if new_len > common {
        for i in common..new_len {
            ops.push(ChildOp::Mount {
                new_index: i,
                anchor_new_index: None,
            });
        }
    } else {
        for i in common..old_len {
            ops.push(ChildOp::Unmount { old_index: i });
        }
    }
    ops
}

fn key_of(v: &VNodeRef) -> VKey {
    v.borrow().key.clone()
}

fn same_type(a: &VNodeRef, b: &VNodeRef) -> bool {
    same_vnode_type(&a.borrow(), &b.borrow())
}

/// The keyed diff (§4.4.5 step 5): five-phase sync-prefix/sync-suffix/
/// pure-add/pure-remove/unknown-middle-with-LIS algorithm.
pub fn diff_keyed(old: &[VNodeRef], new: &[VNodeRef]) -> Vec<ChildOp> {
    let mut ops = Vec::new();
    let (e1_len, e2_len) = (old.len(), new.len());
    let mut i = 0usize;
    let mut e1 = e1_len as isize - 1;
    let mut e2 = e2_len as isize - 1;

    // 1. Sync prefix.
    while i as isize <= e1 && i as isize <= e2 && same_type(&old[i], &new[i]) {
        ops.push(ChildOp::Patch { old_index: i, new_index: i });
        i += 1;
    }

    // 2. Sync suffix.
    while i as isize <= e1 && i as isize <= e2 && same_type(&old[e1 as usize], &new[e2 as usize]) {
        ops.push(ChildOp::Patch {
            old_index: e1 as usize,
            new_index: e2 as usize,
        });
        e1 -= 1;
        e2 -= 1;
    }

    // 3. Pure add.
    if i as isize > e1 && i as isize <= e2 {
        let anchor = if (e2 + 1) < e2_len as isize {
            Some((e2 + 1) as usize)
        } else {
            None
        };
        for new_index in i..=(e2 as usize) {
            ops.push(ChildOp::Mount {
                new_index,
                anchor_new_index: anchor,
            });
        }
        return ops;
    }

    // 4. Pure remove.
    if i as isize > e2 && i as isize <= e1 {
        for old_index in i..=(e1 as usize) {
            ops.push(ChildOp::Unmount { old_index });
        }
        return ops;
    }

    // 5. Unknown middle.
    let s1 = i; // old[s1..=e1]
    let s2 = i; // new[s2..=e2]

    let mut key_to_new_index: std::collections::HashMap<VKey, usize> = std::collections::HashMap::new();
    for new_index in s2..=(e2 as usize) {
        let k = key_of(&new[new_index]);
        if k != VKey::None {
            if key_to_new_index.insert(k.clone(), new_index).is_some() {
                crate::diagnostics::log_warn!(?k, "duplicate key in keyed children; last one wins");
            }
        }
    }

    let to_be_patched = (e2 as usize).saturating_sub(s2) + 1;
    let mut new_index_to_old_index = vec![0usize; to_be_patched];
    let mut max_new_index_so_far = 0usize;
    let mut moved = false;
    let mut patched = 0usize;

    'outer: for old_index in s1..=(e1 as usize) {
        if patched >= to_be_patched {
            ops.push(ChildOp::Unmount { old_index });
            continue;
        }
        let old_key = key_of(&old[old_index]);
        let new_index = if old_key != VKey::None {
            key_to_new_index.get(&old_key).copied()
        } else {
            // No key: scan the remaining new range for a same-type,
            // key-less match.
            let mut found = None;
            for new_index in s2..=(e2 as usize) {
                if new_index_to_old_index[new_index - s2] == 0
                    && key_of(&new[new_index]) == VKey::None
                    && same_type(&old[old_index], &new[new_index])
                {
                    found = Some(new_index);
                    break;
                }
            }
            found
        };

        match new_index {
            None => ops.push(ChildOp::Unmount { old_index }),
            Some(new_index) => {
                new_index_to_old_index[new_index - s2] = old_index + 1;
                if new_index >= max_new_index_so_far {
                    max_new_index_so_far = new_index;
                } else {
                    moved = true;
                }
                ops.push(ChildOp::Patch { old_index, new_index });
                patched += 1;
            }
        }
        if patched >= to_be_patched && old_index < e1 as usize {
            // All new positions claimed; unmount the rest of old directly
            // (mirrors "if all new positions have been patched... unmount
            // the remainder").
            for remaining in (old_index + 1)..=(e1 as usize) {
                ops.push(ChildOp::Unmount { old_index: remaining });
            }
            break 'outer;
        }
    }

    let increasing = if moved {
        longest_increasing_subsequence(&new_index_to_old_index)
    } else {
        Vec::new()
    };
    let lis_set: std::collections::HashSet<usize> = increasing.into_iter().collect();

    // Reverse traversal so the just-processed new child is a valid anchor.
    let mut j = if lis_set.is_empty() { 0 } else { lis_set.len() };
    for k in (0..to_be_patched).rev() {
        let new_index = s2 + k;
        let anchor_new_index = if new_index + 1 < new_index_to_old_index.len() + s2 {
            Some(new_index + 1)
        } else {
            None
        };
        if new_index_to_old_index[k] == 0 {
            ops.push(ChildOp::Mount { new_index, anchor_new_index });
        } else if moved {
            if j == 0 || !lis_set.contains(&k) {
                ops.push(ChildOp::Move {
                    old_index: new_index_to_old_index[k] - 1,
                    anchor_new_index,
                });
            } else {
                j -= 1;
            }
        }
    }

    ops
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lis_on_spec_array() {
        // §8.3 scenario 6: arr = [2,1,5,3,6,4,8,9,7]; acceptable result is
        // the index set [1,3,5,6,7] (whose values 1,3,4,8,9 are strictly
        // increasing and of maximal length 5).
        let arr = vec![2, 1, 5, 3, 6, 4, 8, 9, 7];
        let lis = longest_increasing_subsequence(&arr);
        assert_eq!(lis.len(), 5);
        let values: Vec<usize> = lis.iter().map(|&i| arr[i]).collect();
        for w in values.windows(2) {
            assert!(w[0] < w[1], "LIS must be strictly increasing: {values:?}");
        }
        // Every index must be a real subsequence of the original order.
        for w in lis.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn keyed_middle_reorder_scenario() {
        // §8.3 scenario 3: old [A,B,C,D,E] -> new [A,C,D,B,E].
        let old: Vec<VNodeRef> = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|k| node_ref(VNode::element("div").with_key(VKey::Str((*k).into()))))
            .collect();
        let new: Vec<VNodeRef> = ["A", "C", "D", "B", "E"]
            .iter()
            .map(|k| node_ref(VNode::element("div").with_key(VKey::Str((*k).into()))))
            .collect();
        let ops = diff_keyed(&old, &new);
        let mounts = ops.iter().filter(|o| matches!(o, ChildOp::Mount { .. })).count();
        let unmounts = ops.iter().filter(|o| matches!(o, ChildOp::Unmount { .. })).count();
        let moves = ops.iter().filter(|o| matches!(o, ChildOp::Move { .. })).count();
        assert_eq!(mounts, 0);
        assert_eq!(unmounts, 0);
        assert_eq!(moves, 1);
    }

    #[test]
    fn keyed_diff_minimality_law() {
        // §8.1: mounts = |c2 \ c1|, unmounts = |c1 \ c2|.
        let old: Vec<VNodeRef> = ["a", "b", "c"]
            .iter()
            .map(|k| node_ref(VNode::element("div").with_key(VKey::Str((*k).into()))))
            .collect();
        let new: Vec<VNodeRef> = ["b", "d"]
            .iter()
            .map(|k| node_ref(VNode::element("div").with_key(VKey::Str((*k).into()))))
            .collect();
        let ops = diff_keyed(&old, &new);
        let mounts = ops.iter().filter(|o| matches!(o, ChildOp::Mount { .. })).count();
        let unmounts = ops.iter().filter(|o| matches!(o, ChildOp::Unmount { .. })).count();
        assert_eq!(mounts, 1, "only 'd' is new");
        assert_eq!(unmounts, 2, "'a' and 'c' are gone");
    }

    #[test]
    fn pure_add_appends_with_no_moves() {
        let old: Vec<VNodeRef> = ["a", "b"]
            .iter()
            .map(|k| node_ref(VNode::element("div").with_key(VKey::Str((*k).into()))))
            .collect();
        let new: Vec<VNodeRef> = ["a", "b", "c"]
            .iter()
            .map(|k| node_ref(VNode::element("div").with_key(VKey::Str((*k).into()))))
            .collect();
        let ops = diff_keyed(&old, &new);
        assert!(ops.iter().all(|o| !matches!(o, ChildOp::Move { .. })));
        assert_eq!(ops.iter().filter(|o| matches!(o, ChildOp::Mount { .. })).count(), 1);
    }
}
