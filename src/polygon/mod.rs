//! C4 Phase C — Polygon Assembler (spec.md §4.4): turns each boundary's
//! outer/inner segment ids into a well-formed multipolygon.

mod assemble;

pub use assemble::assemble_boundary;

use hashbrown::HashMap;

use crate::diagnostics::Diagnostics;
use crate::model::{Boundary, Segment};

/// Assemble every boundary's geometry. Segments are read-only for the
/// whole pass, satisfying spec.md §5's precondition for the optional
/// `rayon` fan-out: each boundary reads distinct segment geometries, so
/// the per-boundary work is embarrassingly parallel.
pub fn assemble_all(
    boundaries: &mut HashMap<i64, Boundary>,
    segments: &HashMap<i64, Segment>,
    diagnostics: &mut Diagnostics,
    parallel: bool,
) {
    let ids: Vec<i64> = boundaries.keys().copied().collect();

    let results: Vec<(i64, geo::MultiPolygon<f64>, Vec<crate::diagnostics::Diagnostic>)> = if parallel {
        use rayon::prelude::*;
        ids.par_iter()
            .map(|&id| {
                let mut local = Diagnostics::new();
                let geom = assemble_boundary(&boundaries[&id], segments, &mut local);
                (id, geom, local.into_vec())
            })
            .collect()
    } else {
        ids.iter()
            .map(|&id| {
                let mut local = Diagnostics::new();
                let geom = assemble_boundary(&boundaries[&id], segments, &mut local);
                (id, geom, local.into_vec())
            })
            .collect()
    };

    for (id, geom, diags) in results {
        if let Some(b) = boundaries.get_mut(&id) {
            b.geometry = geom;
        }
        for d in diags {
            diagnostics.push(d);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundaryNames;
    use geo::LineString;

    #[test]
    fn assemble_all_populates_every_boundary_sequentially_and_in_parallel() {
        let mut segments = HashMap::new();
        segments.insert(1, Segment::new(1, LineString::from(vec![(0.0, 0.0), (1.0, 0.0)])));
        segments.insert(2, Segment::new(2, LineString::from(vec![(1.0, 0.0), (1.0, 1.0)])));
        segments.insert(3, Segment::new(3, LineString::from(vec![(1.0, 1.0), (0.0, 1.0)])));
        segments.insert(4, Segment::new(4, LineString::from(vec![(0.0, 1.0), (0.0, 0.0)])));

        let mut boundary = Boundary::new(1, BoundaryNames::default(), Some(4));
        boundary.outer_segment_ids = vec![1, 2, 3, 4];

        for parallel in [false, true] {
            let mut boundaries = HashMap::new();
            boundaries.insert(1, boundary.clone());
            let mut diagnostics = Diagnostics::new();

            assemble_all(&mut boundaries, &segments, &mut diagnostics, parallel);

            assert_eq!(boundaries[&1].geometry.0.len(), 1, "parallel={parallel}");
        }
    }
}
