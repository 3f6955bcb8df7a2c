//! The [`Boundary`] record: one administrative area, its place in the
//! containment DAG, its constituent segment ids, and (once C4 has run)
//! its assembled geometry.

use geo::MultiPolygon;

/// Display names in the locales the pipeline always tracks, plus one
/// caller-chosen "preferred locale" slot.
///
/// `preference` resolves Open Question #1 (spec.md §9): it *is* carried
/// through to the persisted schema, populated from whatever tag key the
/// caller configured as the preferred-locale key (e.g. `"name:ja"`) when
/// that tag is present, left `None` otherwise. See DESIGN.md.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundaryNames {
    pub default: Option<String>,
    pub en: Option<String>,
    pub zh: Option<String>,
    pub preference: Option<String>,
}

impl BoundaryNames {
    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.en.is_none() && self.zh.is_none() && self.preference.is_none()
    }
}

/// One administrative area.
///
/// Lifecycle: created by C1 (§4.1) or C3 (§4.3); `super_area_ids` /
/// `root_candidates` / `root_id` mutated by C2 (§4.2), new arrivals
/// merged by C3, `geometry` set by C4 (§4.4), re-parented by C5 (§4.5).
#[derive(Debug, Clone)]
pub struct Boundary {
    pub id: i64,
    pub names: BoundaryNames,
    pub admin_level: Option<i32>,

    /// Parents in the containment DAG. Sentinel convention: a boundary
    /// that has never been visited by C2's BFS carries `[self.id]`,
    /// meaning "currently a root". Root status can also mean an empty
    /// list after a C5 graft cancels the placeholder.
    pub super_area_ids: Vec<i64>,

    /// Children in the containment DAG, de-duplicated on insert.
    pub sub_area_ids: Vec<i64>,

    /// Candidate roots accumulated during C2's BFS; resolved down to a
    /// single `root_id` by the rule in spec.md §4.2.
    pub root_candidates: Vec<i64>,
    pub root_id: i64,

    pub outer_segment_ids: Vec<i64>,
    pub inner_segment_ids: Vec<i64>,

    pub geometry: MultiPolygon<f64>,
}

impl Boundary {
    /// Construct a freshly-extracted boundary. Per the sentinel
    /// convention (spec.md §3), a new boundary starts out as its own
    /// root candidate and its own (sole) super-area until C2 visits it.
    pub fn new(id: i64, names: BoundaryNames, admin_level: Option<i32>) -> Self {
        Self {
            id,
            names,
            admin_level,
            super_area_ids: vec![id],
            sub_area_ids: Vec::new(),
            root_candidates: vec![id],
            root_id: id,
            outer_segment_ids: Vec::new(),
            inner_segment_ids: Vec::new(),
            geometry: MultiPolygon::new(Vec::new()),
        }
    }

    /// A boundary is a root iff its super-area list is exactly `[self]`
    /// or empty (the post-graft case, spec.md §3 invariant 2).
    pub fn is_root(&self) -> bool {
        self.super_area_ids.is_empty()
            || (self.super_area_ids.len() == 1 && self.super_area_ids[0] == self.id)
    }

    /// Append `parent` to the super-area list, collapsing the
    /// "currently my own root candidate" sentinel on first real parent.
    pub fn add_super_area(&mut self, parent: i64) {
        if self.is_root() {
            self.super_area_ids = vec![parent];
        } else if !self.super_area_ids.contains(&parent) {
            self.super_area_ids.push(parent);
        }
    }

    /// Append `child` to the sub-area list if not already present.
    pub fn add_sub_area(&mut self, child: i64) {
        if !self.sub_area_ids.contains(&child) {
            self.sub_area_ids.push(child);
        }
    }

    /// Union a parent's root candidates into this boundary's, collapsing
    /// the self-sentinel on first propagation (mirrors `add_super_area`).
    pub fn union_root_candidates(&mut self, incoming: &[i64]) {
        if self.is_root_candidate_sentinel() {
            self.root_candidates = incoming.to_vec();
        } else {
            for &candidate in incoming {
                if !self.root_candidates.contains(&candidate) {
                    self.root_candidates.push(candidate);
                }
            }
        }
    }

    fn is_root_candidate_sentinel(&self) -> bool {
        self.root_candidates.len() == 1 && self.root_candidates[0] == self.id
    }

    pub fn remove_super_area(&mut self, parent: i64) {
        self.super_area_ids.retain(|&p| p != parent);
    }

    pub fn remove_sub_area(&mut self, child: i64) {
        self.sub_area_ids.retain(|&c| c != child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_boundary_is_its_own_root() {
        let b = Boundary::new(1, BoundaryNames::default(), Some(4));
        assert!(b.is_root());
        assert_eq!(b.root_candidates, vec![1]);
    }

    #[test]
    fn add_super_area_collapses_sentinel() {
        let mut b = Boundary::new(2, BoundaryNames::default(), Some(6));
        b.add_super_area(1);
        assert_eq!(b.super_area_ids, vec![1]);
        assert!(!b.is_root());
        b.add_super_area(1);
        assert_eq!(b.super_area_ids, vec![1], "adding the same parent twice must not duplicate");
    }

    #[test]
    fn union_root_candidates_collapses_sentinel_then_accumulates() {
        let mut b = Boundary::new(3, BoundaryNames::default(), Some(6));
        b.union_root_candidates(&[1]);
        assert_eq!(b.root_candidates, vec![1]);
        b.union_root_candidates(&[1, 2]);
        assert_eq!(b.root_candidates, vec![1, 2]);
    }
}
