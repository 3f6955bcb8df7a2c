//! C4 Phase C — per-boundary polygonization (spec.md §4.4).
//!
//! The ring closer is adapted directly from the teacher's
//! `pip::geometry::merge_rings_to_polygons`: a greedy endpoint-matching
//! pass that glues unordered way segments back into closed rings. Hole
//! attribution (outer/inner pairing) and the outer/inner overlap rule are
//! this crate's addition over the teacher, since the teacher only ever
//! produces bare exterior rings.

use geo::{Area, Contains, Coord, LineString, MultiPolygon, Polygon};
use hashbrown::HashMap;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::model::{Boundary, Segment};

/// Assemble one boundary's outer/inner segment ids into a multipolygon.
/// Never panics and never aborts the run: empty input or a failed
/// closure leaves the geometry as an empty multipolygon (spec.md §4.4
/// step 3).
pub fn assemble_boundary(
    boundary: &Boundary,
    segments: &HashMap<i64, Segment>,
    diagnostics: &mut Diagnostics,
) -> MultiPolygon<f64> {
    let (outer_ids, inner_ids) = resolve_outer_inner_overlap(boundary, diagnostics);

    let outer_lines: Vec<LineString<f64>> = outer_ids
        .iter()
        .filter_map(|id| segments.get(id))
        .map(|s| s.geometry.clone())
        .collect();
    let inner_lines: Vec<LineString<f64>> = inner_ids
        .iter()
        .filter_map(|id| segments.get(id))
        .map(|s| s.geometry.clone())
        .collect();

    let outer_had_input = !outer_lines.is_empty();
    let inner_had_input = !inner_lines.is_empty();

    let outer_polygons = close_rings(outer_lines);
    let inner_polygons = close_rings(inner_lines);

    if (outer_had_input && outer_polygons.is_empty()) || (inner_had_input && inner_polygons.is_empty()) {
        diagnostics.push(Diagnostic::UnpolygonizableBoundary { id: boundary.id });
    }

    let polygons = attach_holes(outer_polygons, inner_polygons, boundary.id, diagnostics);

    MultiPolygon::new(polygons)
}

/// Open Question #2 (spec.md §9): a segment id listed as both outer and
/// inner of the same boundary. Decision recorded in DESIGN.md: outer
/// wins, the inner occurrence is dropped with a warning.
fn resolve_outer_inner_overlap(boundary: &Boundary, diagnostics: &mut Diagnostics) -> (Vec<i64>, Vec<i64>) {
    let outer = boundary.outer_segment_ids.clone();
    let inner: Vec<i64> = boundary
        .inner_segment_ids
        .iter()
        .filter(|id| {
            let collides = outer.contains(id);
            if collides {
                diagnostics.push(Diagnostic::DuplicateOuterInnerSegment {
                    boundary_id: boundary.id,
                    segment_id: **id,
                });
            }
            !collides
        })
        .copied()
        .collect();
    (outer, inner)
}

/// Attach each inner polygon as a hole of the outer polygon that
/// strictly contains it. When more than one outer qualifies (malformed
/// or nested source data), the smallest-area containing outer wins —
/// the same "most specific match" rule the teacher's `pip::index`
/// spatial lookup uses for overlapping places. An inner contained by no
/// outer is dropped with a warning (spec.md §4.4 step 4, §9).
fn attach_holes(
    outers: Vec<Polygon<f64>>,
    inners: Vec<Polygon<f64>>,
    boundary_id: i64,
    diagnostics: &mut Diagnostics,
) -> Vec<Polygon<f64>> {
    let mut holes_per_outer: Vec<Vec<LineString<f64>>> = vec![Vec::new(); outers.len()];

    for inner in &inners {
        let mut best: Option<(usize, f64)> = None;
        for (idx, outer) in outers.iter().enumerate() {
            if outer.contains(inner) {
                let area = outer.unsigned_area();
                match best {
                    None => best = Some((idx, area)),
                    Some((_, best_area)) if area < best_area => best = Some((idx, area)),
                    _ => {}
                }
            }
        }
        match best {
            Some((idx, _)) => holes_per_outer[idx].push(inner.exterior().clone()),
            None => diagnostics.push(Diagnostic::OrphanInnerRing { boundary_id }),
        }
    }

    outers
        .into_iter()
        .zip(holes_per_outer)
        .map(|(outer, holes)| Polygon::new(outer.exterior().clone(), holes))
        .collect()
}

/// Greedy endpoint-matching ring closer (spec.md §4.4 step 1/2,
/// "standard" polygonizer; adapted from the teacher's
/// `merge_rings_to_polygons`). Does not assume segment order; closes
/// rings purely from coincident endpoints.
fn close_rings(lines: Vec<LineString<f64>>) -> Vec<Polygon<f64>> {
    let mut remaining: Vec<Vec<Coord<f64>>> = lines.into_iter().map(|l| l.0).collect();
    let mut result = Vec::new();

    while let Some(mut current) = remaining.pop() {
        if is_closed_ring(&current) {
            result.push(Polygon::new(LineString::new(current), vec![]));
            continue;
        }

        let mut merged = true;
        while merged && !remaining.is_empty() {
            merged = false;
            let start = current.first().copied();
            let end = current.last().copied();

            for i in 0..remaining.len() {
                let ring = &remaining[i];
                let ring_start = ring.first().copied();
                let ring_end = ring.last().copied();

                if end == ring_start {
                    let mut r = remaining.remove(i);
                    r.remove(0);
                    current.extend(r);
                    merged = true;
                    break;
                } else if end == ring_end {
                    let mut r = remaining.remove(i);
                    r.reverse();
                    r.remove(0);
                    current.extend(r);
                    merged = true;
                    break;
                } else if start == ring_end {
                    let mut r = remaining.remove(i);
                    r.pop();
                    r.extend(current);
                    current = r;
                    merged = true;
                    break;
                } else if start == ring_start {
                    let mut r = remaining.remove(i);
                    r.reverse();
                    r.pop();
                    r.extend(current);
                    current = r;
                    merged = true;
                    break;
                }
            }
        }

        if current.len() >= 3 {
            if current.first() != current.last() {
                current.push(current[0]);
            }
            if current.len() >= 4 {
                result.push(Polygon::new(LineString::new(current), vec![]));
            }
        }
    }

    result
}

fn is_closed_ring(coords: &[Coord<f64>]) -> bool {
    coords.len() >= 4 && coords.first() == coords.last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundaryNames;

    fn segment(id: i64, coords: Vec<(f64, f64)>) -> Segment {
        let line = LineString::from(coords);
        Segment::new(id, line)
    }

    fn square_segments() -> HashMap<i64, Segment> {
        let mut map = HashMap::new();
        map.insert(1, segment(1, vec![(0.0, 0.0), (1.0, 0.0)]));
        map.insert(2, segment(2, vec![(1.0, 0.0), (1.0, 1.0)]));
        map.insert(3, segment(3, vec![(1.0, 1.0), (0.0, 1.0)]));
        map.insert(4, segment(4, vec![(0.0, 1.0), (0.0, 0.0)]));
        map
    }

    #[test]
    fn square_outer_with_hole_attaches_one_hole() {
        let mut segments = square_segments();
        segments.insert(
            5,
            segment(5, vec![
                (0.25, 0.25),
                (0.75, 0.25),
                (0.75, 0.75),
                (0.25, 0.75),
                (0.25, 0.25),
            ]),
        );

        let mut boundary = Boundary::new(100, BoundaryNames::default(), Some(4));
        boundary.outer_segment_ids = vec![1, 2, 3, 4];
        boundary.inner_segment_ids = vec![5];

        let mut diagnostics = Diagnostics::new();
        let geom = assemble_boundary(&boundary, &segments, &mut diagnostics);

        assert_eq!(geom.0.len(), 1, "exactly one outer polygon");
        assert_eq!(geom.0[0].interiors().len(), 1, "exactly one hole");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn empty_segments_yield_empty_multipolygon_without_failing() {
        let boundary = Boundary::new(200, BoundaryNames::default(), Some(4));
        let segments = HashMap::new();
        let mut diagnostics = Diagnostics::new();

        let geom = assemble_boundary(&boundary, &segments, &mut diagnostics);
        assert!(geom.0.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn unclosable_segments_report_unpolygonizable_and_stay_empty() {
        let mut segments = HashMap::new();
        segments.insert(1, segment(1, vec![(0.0, 0.0), (1.0, 0.0)]));
        segments.insert(2, segment(2, vec![(5.0, 5.0), (6.0, 6.0)]));

        let mut boundary = Boundary::new(300, BoundaryNames::default(), Some(4));
        boundary.outer_segment_ids = vec![1, 2];

        let mut diagnostics = Diagnostics::new();
        let geom = assemble_boundary(&boundary, &segments, &mut diagnostics);

        assert!(geom.0.is_empty());
        assert!(diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::UnpolygonizableBoundary { id: 300 })));
    }

    #[test]
    fn inner_not_contained_is_dropped_with_warning() {
        let mut segments = square_segments();
        segments.insert(
            5,
            segment(5, vec![
                (10.0, 10.0),
                (11.0, 10.0),
                (11.0, 11.0),
                (10.0, 11.0),
                (10.0, 10.0),
            ]),
        );

        let mut boundary = Boundary::new(400, BoundaryNames::default(), Some(4));
        boundary.outer_segment_ids = vec![1, 2, 3, 4];
        boundary.inner_segment_ids = vec![5];

        let mut diagnostics = Diagnostics::new();
        let geom = assemble_boundary(&boundary, &segments, &mut diagnostics);

        assert_eq!(geom.0[0].interiors().len(), 0);
        assert!(diagnostics.iter().any(|d| matches!(d, Diagnostic::OrphanInnerRing { boundary_id: 400 })));
    }

    #[test]
    fn duplicate_outer_inner_segment_prefers_outer() {
        let segments = square_segments();
        let mut boundary = Boundary::new(500, BoundaryNames::default(), Some(4));
        boundary.outer_segment_ids = vec![1, 2, 3, 4];
        boundary.inner_segment_ids = vec![1];

        let mut diagnostics = Diagnostics::new();
        let (outer, inner) = resolve_outer_inner_overlap(&boundary, &mut diagnostics);

        assert_eq!(outer, vec![1, 2, 3, 4]);
        assert!(inner.is_empty());
        assert!(diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::DuplicateOuterInnerSegment { boundary_id: 500, segment_id: 1 })));
    }
}
