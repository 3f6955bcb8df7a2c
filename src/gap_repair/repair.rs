//! C3 — Gap Repairer (spec.md §4.3): fetches relations referenced as
//! sub-areas but absent from the local dump, typically because the
//! source extract was geographically cropped.

use hashbrown::{HashMap, HashSet};
use tracing::info;

use super::client::{OverpassClient, OverpassElement};
use crate::dag;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::model::{Boundary, BoundaryNames};

/// Every id referenced as a sub-area by a surviving boundary that is
/// neither a known admin boundary, a known non-admin boundary, nor
/// level-pruned (spec.md §4.3).
pub fn compute_frontier(
    boundaries: &HashMap<i64, Boundary>,
    non_admin: &HashSet<i64>,
    pruned: &HashSet<i64>,
) -> HashSet<i64> {
    boundaries
        .values()
        .flat_map(|b| b.sub_area_ids.iter().copied())
        .filter(|id| !boundaries.contains_key(id) && !non_admin.contains(id) && !pruned.contains(id))
        .collect()
}

/// Run the repair protocol: seed the work queue with `frontier`, issue
/// one batch request per iteration (bounded by the client's iteration
/// cap), merge admin relations into `boundaries` the same way C1 builds
/// them, and re-enqueue sub-areas whose level is strictly below `l_max`.
/// Boundaries above `l_max` are recorded but not expanded further.
///
/// After the loop, a light DAG pass restricted to the combined map
/// re-links parents and propagates roots for the new arrivals (building
/// the DAG is idempotent for boundaries already resolved to a fixed
/// point, so rerunning it over the whole map has the same effect as
/// limiting it to new arrivals — see DESIGN.md).
pub async fn run(
    boundaries: &mut HashMap<i64, Boundary>,
    non_admin: &mut HashSet<i64>,
    pruned: &mut HashSet<i64>,
    l_max: i32,
    preferred_locale_key: Option<&str>,
    client: &OverpassClient,
    diagnostics: &mut Diagnostics,
) {
    let frontier = compute_frontier(boundaries, non_admin, pruned);
    if frontier.is_empty() {
        return;
    }

    info!("Gap repair frontier: {} relation(s) to fetch", frontier.len());

    let mut queue: Vec<i64> = frontier.into_iter().collect();
    let mut queried: HashSet<i64> = HashSet::new();
    let mut iteration = 0u32;

    while !queue.is_empty() && iteration < client.iteration_cap() {
        iteration += 1;
        let batch: Vec<i64> = queue.drain(..).filter(|id| queried.insert(*id)).collect();
        if batch.is_empty() {
            continue;
        }

        match client.fetch_relations(&batch).await {
            Ok(elements) => {
                let mut next: Vec<i64> = Vec::new();
                for element in &elements {
                    absorb_element(
                        element,
                        boundaries,
                        non_admin,
                        pruned,
                        l_max,
                        preferred_locale_key,
                        &mut next,
                        diagnostics,
                    );
                }
                queue.extend(next);
            }
            Err(e) => {
                diagnostics.push(Diagnostic::RemoteBatchDropped {
                    ids: batch,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!("Gap repair finished after {iteration} iteration(s), {} boundaries recovered", boundaries.len());

    dag::build_dag(boundaries, diagnostics);
}

fn absorb_element(
    element: &OverpassElement,
    boundaries: &mut HashMap<i64, Boundary>,
    non_admin: &mut HashSet<i64>,
    pruned: &mut HashSet<i64>,
    l_max: i32,
    preferred_locale_key: Option<&str>,
    next_queue: &mut Vec<i64>,
    diagnostics: &mut Diagnostics,
) {
    if element.kind != "relation" || boundaries.contains_key(&element.id) {
        return;
    }

    let is_admin = element.tags.get("boundary").map(|v| v == "administrative").unwrap_or(false);
    if !is_admin {
        non_admin.insert(element.id);
        return;
    }

    let admin_level = element.tags.get("admin_level").and_then(|v| v.parse::<i32>().ok());

    let names = BoundaryNames {
        default: element.tags.get("name").cloned(),
        en: element.tags.get("name:en").cloned(),
        zh: element.tags.get("name:zh").cloned(),
        preference: preferred_locale_key.and_then(|key| element.tags.get(key)).cloned(),
    };

    let mut boundary = Boundary::new(element.id, names, admin_level);

    for member in &element.members {
        match (member.role.as_str(), member.kind.as_str()) {
            ("subarea", "relation") => boundary.add_sub_area(member.reference),
            ("outer", "way") => boundary.outer_segment_ids.push(member.reference),
            ("inner", "way") => boundary.inner_segment_ids.push(member.reference),
            _ => {}
        }
    }

    let sub_areas = boundary.sub_area_ids.clone();

    match admin_level {
        Some(level) if level > l_max => {
            // Recorded so it can be told apart from a truly missing
            // relation, but not expanded further (spec.md §4.3).
            pruned.insert(element.id);
        }
        Some(level) => {
            if level < l_max {
                next_queue.extend(sub_areas);
            }
        }
        None => {
            diagnostics.push(Diagnostic::MalformedRelation {
                id: element.id,
                reason: "gap-repaired relation has no admin_level".to_string(),
            });
            pruned.insert(element.id);
        }
    }

    boundaries.insert(element.id, boundary);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin(id: i64, level: i32) -> Boundary {
        Boundary::new(id, BoundaryNames::default(), Some(level))
    }

    #[test]
    fn frontier_excludes_known_and_pruned_and_non_admin() {
        let mut boundaries = HashMap::new();
        let mut parent = admin(1, 4);
        parent.add_sub_area(2); // missing
        parent.add_sub_area(3); // known non-admin
        parent.add_sub_area(4); // pruned
        parent.add_sub_area(5); // already known admin
        boundaries.insert(1, parent);
        boundaries.insert(5, admin(5, 6));

        let mut non_admin = HashSet::new();
        non_admin.insert(3);
        let mut pruned = HashSet::new();
        pruned.insert(4);

        let frontier = compute_frontier(&boundaries, &non_admin, &pruned);
        assert_eq!(frontier, HashSet::from_iter([2]));
    }

    #[test]
    fn absorb_element_records_above_lmax_without_expanding() {
        let mut boundaries = HashMap::new();
        let mut non_admin = HashSet::new();
        let mut pruned = HashSet::new();
        let mut next = Vec::new();
        let mut diagnostics = Diagnostics::new();

        let element = OverpassElement {
            kind: "relation".to_string(),
            id: 10,
            tags: HashMap::from_iter([
                ("boundary".to_string(), "administrative".to_string()),
                ("admin_level".to_string(), "9".to_string()),
            ]),
            members: vec![super::OverpassMember {
                kind: "relation".to_string(),
                reference: 11,
                role: "subarea".to_string(),
            }],
        };

        absorb_element(&element, &mut boundaries, &mut non_admin, &mut pruned, 7, None, &mut next, &mut diagnostics);

        assert!(boundaries.contains_key(&10));
        assert!(pruned.contains(&10));
        assert!(next.is_empty(), "above L_max must not be expanded");
    }

    #[test]
    fn frontier_survives_filter_by_level_for_a_never_extracted_subarea() {
        // spec.md §8 scenario 3: A -> B -> C, C never extracted at all
        // (a geographically cropped dump, not a pruned-by-level id).
        // build_dag + filter_by_level must not erase B's dangling
        // pointer to C, or the gap repairer never learns C needs fetching.
        let mut boundaries = HashMap::new();
        let mut a = admin(1, 2);
        a.add_sub_area(2);
        let mut b = admin(2, 4);
        b.add_sub_area(3); // C, never inserted below
        boundaries.insert(1, a);
        boundaries.insert(2, b);

        let non_admin = HashSet::new();
        let mut diagnostics = Diagnostics::new();

        dag::build_dag(&mut boundaries, &mut diagnostics);
        let pruned = dag::filter_by_level(&mut boundaries, 6);

        let frontier = compute_frontier(&boundaries, &non_admin, &pruned);
        assert!(
            frontier.contains(&3),
            "missing relation must still be reachable from the frontier after level filtering"
        );
    }

    #[test]
    fn absorb_element_enqueues_subareas_below_lmax() {
        let mut boundaries = HashMap::new();
        let mut non_admin = HashSet::new();
        let mut pruned = HashSet::new();
        let mut next = Vec::new();
        let mut diagnostics = Diagnostics::new();

        let element = OverpassElement {
            kind: "relation".to_string(),
            id: 20,
            tags: HashMap::from_iter([
                ("boundary".to_string(), "administrative".to_string()),
                ("admin_level".to_string(), "3".to_string()),
            ]),
            members: vec![super::OverpassMember {
                kind: "relation".to_string(),
                reference: 21,
                role: "subarea".to_string(),
            }],
        };

        absorb_element(&element, &mut boundaries, &mut non_admin, &mut pruned, 7, None, &mut next, &mut diagnostics);

        assert_eq!(next, vec![21]);
    }
}
