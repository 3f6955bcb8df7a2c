//! In-degree linking, root-candidate propagation, root resolution, and the
//! level/root pruning passes (spec.md §4.2).
//!
//! `Boundary::root_id` doubles as the "is this a real root" flag once
//! [`build_dag`] has run: a boundary keeps `root_id == id` from
//! [`Boundary::new`] unless resolution (below) overwrites it with a real
//! ancestor, so pruning never mistakes "lost its last parent to a cascade"
//! for "was always a root".

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};
use tracing::info;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::model::Boundary;

/// Link `sub_area_ids` into `super_area_ids`, propagate root candidates by
/// BFS from every true root, then resolve one `root_id` per boundary.
pub fn build_dag(boundaries: &mut HashMap<i64, Boundary>, diagnostics: &mut Diagnostics) {
    link_super_areas(boundaries);
    propagate_root_candidates(boundaries);
    resolve_roots(boundaries);
    report_cycle_remainder(boundaries, diagnostics);
}

/// Invert every `sub_area_ids` edge into the child's `super_area_ids`,
/// collapsing each child's sentinel on its first real parent.
fn link_super_areas(boundaries: &mut HashMap<i64, Boundary>) {
    let edges: Vec<(i64, i64)> = boundaries
        .values()
        .flat_map(|b| b.sub_area_ids.iter().map(move |&child| (b.id, child)))
        .collect();

    for (parent, child) in edges {
        if let Some(c) = boundaries.get_mut(&child) {
            c.add_super_area(parent);
        }
    }
}

/// BFS outward from every true root (`is_root()` after linking), unioning
/// root candidates into each descendant. Converges because
/// `union_root_candidates` is monotone and the candidate set per boundary
/// is bounded by the number of true roots.
fn propagate_root_candidates(boundaries: &mut HashMap<i64, Boundary>) {
    let mut queue: VecDeque<i64> = boundaries
        .values()
        .filter(|b| b.is_root())
        .map(|b| b.id)
        .collect();

    info!("DAG root frontier: {} true roots", queue.len());

    let max_visits = boundaries.len().saturating_mul(4).max(1);
    let mut visits = 0usize;

    while let Some(current) = queue.pop_front() {
        visits += 1;
        if visits > max_visits {
            break;
        }

        let (children, candidates) = match boundaries.get(&current) {
            Some(b) => (b.sub_area_ids.clone(), b.root_candidates.clone()),
            None => continue,
        };

        for child_id in children {
            if let Some(child) = boundaries.get_mut(&child_id) {
                let before = child.root_candidates.len();
                child.union_root_candidates(&candidates);
                if child.root_candidates.len() != before {
                    queue.push_back(child_id);
                }
            }
        }
    }
}

/// Pick one `root_id` per non-root boundary: the candidate with the
/// lowest admin level that is still strictly below the boundary's own
/// level, first appearance breaking ties; fall back to the first
/// candidate when no candidate qualifies (spec.md §4.2).
fn resolve_roots(boundaries: &mut HashMap<i64, Boundary>) {
    let resolutions: Vec<(i64, i64)> = boundaries
        .values()
        .filter(|b| !b.is_root())
        .map(|b| (b.id, resolve_one_root(b, boundaries)))
        .collect();

    for (id, root_id) in resolutions {
        if let Some(b) = boundaries.get_mut(&id) {
            b.root_id = root_id;
        }
    }
}

fn resolve_one_root(boundary: &Boundary, boundaries: &HashMap<i64, Boundary>) -> i64 {
    let mut best: Option<(i32, i64)> = None;

    if let Some(own_level) = boundary.admin_level {
        for &candidate in &boundary.root_candidates {
            let Some(candidate_level) = boundaries.get(&candidate).and_then(|b| b.admin_level)
            else {
                continue;
            };
            if candidate_level >= own_level {
                continue;
            }
            match best {
                None => best = Some((candidate_level, candidate)),
                Some((best_level, _)) if candidate_level < best_level => {
                    best = Some((candidate_level, candidate))
                }
                _ => {}
            }
        }
    }

    best.map(|(_, id)| id)
        .or_else(|| boundary.root_candidates.first().copied())
        .unwrap_or(boundary.id)
}

/// Anything that never received a real parent's candidates (still
/// carrying its own sentinel) but also isn't a true root is stuck in a
/// cycle disconnected from every root. Reported, never removed.
fn report_cycle_remainder(boundaries: &HashMap<i64, Boundary>, diagnostics: &mut Diagnostics) {
    let stuck: Vec<i64> = boundaries
        .values()
        .filter(|b| !b.is_root() && b.root_candidates.len() == 1 && b.root_candidates[0] == b.id)
        .map(|b| b.id)
        .collect();

    if !stuck.is_empty() {
        diagnostics.push(Diagnostic::DagCycleRemainder { ids: stuck });
    }
}

/// Drop every boundary whose admin level is unknown or exceeds `l_max`,
/// then cascade-remove anything left dangling (spec.md §4.2). Returns the
/// directly-dropped (not cascade-orphaned) ids — the "pruned set" that C3
/// must treat as legitimately missing rather than a gap to repair.
pub fn filter_by_level(boundaries: &mut HashMap<i64, Boundary>, l_max: i32) -> HashSet<i64> {
    let drop_ids: HashSet<i64> = boundaries
        .values()
        .filter(|b| b.admin_level.map_or(true, |level| level > l_max))
        .map(|b| b.id)
        .collect();

    info!("Level filter (L_max={l_max}): dropping {} boundaries", drop_ids.len());

    for &id in &drop_ids {
        boundaries.remove(&id);
    }
    prune_to_fixpoint(boundaries);
    drop_ids
}

/// Keep only `root_id` itself and boundaries resolved to it, then
/// cascade-remove anything left dangling.
pub fn filter_to_root(boundaries: &mut HashMap<i64, Boundary>, root_id: i64) {
    let drop_ids: Vec<i64> = boundaries
        .values()
        .filter(|b| b.id != root_id && b.root_id != root_id)
        .map(|b| b.id)
        .collect();

    info!("Root filter (root={root_id}): dropping {} boundaries", drop_ids.len());

    for id in drop_ids {
        boundaries.remove(&id);
    }
    prune_to_fixpoint(boundaries);
}

/// Repeatedly strip dangling super-area pointers and remove any non-root
/// boundary that lost its last parent, until neither changes anything.
///
/// `sub_area_ids` pointers are handled differently from `super_area_ids`:
/// a sub-area id is only unlinked here if it named a boundary that was
/// still live when this pass started and got cascade-orphaned *during*
/// this pass (the recursive "unlink c from p's sub-area list" step of
/// spec.md §4.2's orphan-cascade procedure). A sub-area id that was
/// never a live boundary to begin with — a directly level-pruned
/// boundary (already removed by the caller before this function runs)
/// or a genuinely missing relation — is left dangling on purpose: that
/// dangling pointer is exactly what spec.md §8 scenario 2 requires
/// ("B's sub-area list still contains C.id but it is not a known
/// boundary") and what `gap_repair::compute_frontier` (§4.3) depends on
/// to find the relations C3 must go fetch.
fn prune_to_fixpoint(boundaries: &mut HashMap<i64, Boundary>) {
    let live_at_start: HashSet<i64> = boundaries.keys().copied().collect();

    loop {
        let existing: HashSet<i64> = boundaries.keys().copied().collect();
        let mut changed = false;

        for b in boundaries.values_mut() {
            let before_super = b.super_area_ids.len();
            let before_sub = b.sub_area_ids.len();
            b.super_area_ids.retain(|p| existing.contains(p));
            b.sub_area_ids.retain(|c| existing.contains(c) || !live_at_start.contains(c));
            if b.super_area_ids.len() != before_super || b.sub_area_ids.len() != before_sub {
                changed = true;
            }
        }

        let orphans: Vec<i64> = boundaries
            .values()
            .filter(|b| b.root_id != b.id && b.super_area_ids.is_empty())
            .map(|b| b.id)
            .collect();

        if orphans.is_empty() {
            if !changed {
                break;
            }
            continue;
        }

        for id in orphans {
            boundaries.remove(&id);
        }
    }
}
