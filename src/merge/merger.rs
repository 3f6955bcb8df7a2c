//! C5 — Tree Merger (spec.md §4.5): grafts every root of an
//! independently-parsed tree onto this tree's resolved root, deduplicating
//! shared boundary segments along the way.

use hashbrown::{HashMap, HashSet};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::model::Boundary;

/// Graft `secondary`'s roots onto `primary_root` within `primary`, and
/// insert every non-root boundary of `secondary`. An id already present
/// in `primary` is a logged merge conflict; the existing (primary) entry
/// wins (spec.md §4.5).
///
/// Note: this only updates graph linkage and segment-id bookkeeping.
/// `primary_root`'s geometry is stale afterwards — the caller must
/// re-run polygon assembly (§4.4) for it against the union of both
/// parses' segment maps (see [`crate::driver`]).
pub fn merge_tree(
    primary: &mut HashMap<i64, Boundary>,
    secondary: HashMap<i64, Boundary>,
    primary_root: i64,
    diagnostics: &mut Diagnostics,
) {
    let secondary_roots: HashSet<i64> = secondary.values().filter(|b| b.is_root()).map(|b| b.id).collect();

    for (id, mut boundary) in secondary {
        if secondary_roots.contains(&id) {
            graft_root(primary, primary_root, &boundary);
            boundary.super_area_ids = vec![primary_root];
            boundary.root_id = primary_root;
        }

        if primary.contains_key(&id) {
            diagnostics.push(Diagnostic::MergeConflict { id });
            continue;
        }

        primary.insert(id, boundary);
    }
}

/// Reparent a grafted root onto `root_id` and run the segment
/// cancellation rule: a segment in the grafted root's opposite-role list
/// cancels both (becomes internal); one in the same-role list cancels
/// both (shared exterior collapses); otherwise it is appended to the
/// root's matching-role list (spec.md §4.5 step 2).
fn graft_root(primary: &mut HashMap<i64, Boundary>, root_id: i64, grafted: &Boundary) {
    let Some(root) = primary.get_mut(&root_id) else { return };

    root.add_sub_area(grafted.id);

    for &seg_id in &grafted.outer_segment_ids {
        cancel_or_append_outer(root, seg_id);
    }
    for &seg_id in &grafted.inner_segment_ids {
        cancel_or_append_inner(root, seg_id);
    }
}

fn cancel_or_append_outer(root: &mut Boundary, seg_id: i64) {
    if let Some(pos) = root.inner_segment_ids.iter().position(|&s| s == seg_id) {
        root.inner_segment_ids.remove(pos);
    } else if let Some(pos) = root.outer_segment_ids.iter().position(|&s| s == seg_id) {
        root.outer_segment_ids.remove(pos);
    } else {
        root.outer_segment_ids.push(seg_id);
    }
}

fn cancel_or_append_inner(root: &mut Boundary, seg_id: i64) {
    if let Some(pos) = root.outer_segment_ids.iter().position(|&s| s == seg_id) {
        root.outer_segment_ids.remove(pos);
    } else if let Some(pos) = root.inner_segment_ids.iter().position(|&s| s == seg_id) {
        root.inner_segment_ids.remove(pos);
    } else {
        root.inner_segment_ids.push(seg_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundaryNames;

    fn boundary(id: i64, level: i32) -> Boundary {
        Boundary::new(id, BoundaryNames::default(), Some(level))
    }

    #[test]
    fn merging_empty_tree_is_a_noop() {
        let mut primary = HashMap::new();
        let mut root = boundary(1, 2);
        root.outer_segment_ids = vec![10, 11];
        primary.insert(1, root.clone());

        let mut diagnostics = Diagnostics::new();
        merge_tree(&mut primary, HashMap::new(), 1, &mut diagnostics);

        assert_eq!(primary.len(), 1);
        assert_eq!(primary[&1].outer_segment_ids, vec![10, 11]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn grafted_root_reparents_and_registers_as_subarea() {
        let mut primary = HashMap::new();
        primary.insert(1, boundary(1, 2));

        let mut secondary = HashMap::new();
        secondary.insert(2, boundary(2, 2));

        let mut diagnostics = Diagnostics::new();
        merge_tree(&mut primary, secondary, 1, &mut diagnostics);

        assert_eq!(primary[&1].sub_area_ids, vec![2]);
        assert_eq!(primary[&2].super_area_ids, vec![1]);
        assert_eq!(primary[&2].root_id, 1);
    }

    #[test]
    fn shared_outer_segments_cancel_to_internal() {
        let mut primary = HashMap::new();
        let mut root = boundary(1, 2);
        root.outer_segment_ids = vec![100, 101, 102];
        primary.insert(1, root);

        let mut secondary = HashMap::new();
        let mut grafted = boundary(2, 2);
        grafted.outer_segment_ids = vec![100, 101, 102, 200];
        secondary.insert(2, grafted);

        let mut diagnostics = Diagnostics::new();
        merge_tree(&mut primary, secondary, 1, &mut diagnostics);

        assert!(!primary[&1].outer_segment_ids.contains(&100));
        assert!(!primary[&1].outer_segment_ids.contains(&101));
        assert!(!primary[&1].outer_segment_ids.contains(&102));
        assert!(primary[&1].outer_segment_ids.contains(&200));
        assert!(!primary[&1].inner_segment_ids.contains(&100));
    }

    #[test]
    fn opposite_role_segment_also_cancels() {
        let mut primary = HashMap::new();
        let mut root = boundary(1, 2);
        root.inner_segment_ids = vec![100];
        primary.insert(1, root);

        let mut secondary = HashMap::new();
        let mut grafted = boundary(2, 2);
        grafted.outer_segment_ids = vec![100];
        secondary.insert(2, grafted);

        let mut diagnostics = Diagnostics::new();
        merge_tree(&mut primary, secondary, 1, &mut diagnostics);

        assert!(!primary[&1].inner_segment_ids.contains(&100));
        assert!(!primary[&1].outer_segment_ids.contains(&100));
    }

    #[test]
    fn existing_id_is_a_logged_merge_conflict_first_wins() {
        let mut primary = HashMap::new();
        let mut existing = boundary(1, 2);
        existing.add_sub_area(5);
        primary.insert(1, existing);
        let mut conflicting = boundary(5, 6);
        conflicting.add_super_area(1);
        primary.insert(5, conflicting);

        let mut secondary = HashMap::new();
        let mut different = boundary(5, 6);
        different.names.default = Some("different".to_string());
        secondary.insert(5, different);

        let mut diagnostics = Diagnostics::new();
        merge_tree(&mut primary, secondary, 1, &mut diagnostics);

        assert_eq!(primary[&5].names.default, None, "first wins");
        assert!(diagnostics.iter().any(|d| matches!(d, Diagnostic::MergeConflict { id: 5 })));
    }
}
