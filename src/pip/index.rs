//! Spatial index for boundary lookups, adapted from the teacher's
//! `pip::index::AdminSpatialIndex`: an R-tree envelope index with exact
//! containment checked on the candidate set.

use std::sync::Arc;

use geo::{Contains, Point};
use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use super::boundary::StoredBoundary;

#[derive(Clone)]
pub struct IndexedBoundary {
    pub boundary: Arc<StoredBoundary>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedBoundary {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedBoundary {
    fn new(boundary: StoredBoundary) -> Option<Self> {
        let (min_x, min_y, max_x, max_y) = boundary.bbox()?;
        Some(Self {
            boundary: Arc::new(boundary),
            envelope: AABB::from_corners([min_x, min_y], [max_x, max_y]),
        })
    }
}

pub struct AdminSpatialIndex {
    tree: RTree<IndexedBoundary>,
}

impl AdminSpatialIndex {
    pub fn build(boundaries: Vec<StoredBoundary>) -> Self {
        info!("Building PIP spatial index for {} boundaries...", boundaries.len());
        let indexed: Vec<IndexedBoundary> = boundaries.into_iter().filter_map(IndexedBoundary::new).collect();
        let tree = RTree::bulk_load(indexed);
        info!("PIP spatial index built with {} entries", tree.size());
        Self { tree }
    }

    /// Every boundary whose geometry strictly contains `(lon, lat)`.
    pub fn lookup(&self, lon: f64, lat: f64) -> Vec<Arc<StoredBoundary>> {
        let point = Point::new(lon, lat);
        let query_envelope = AABB::from_point([lon, lat]);

        self.tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|ib| ib.boundary.geometry.contains(&point))
            .map(|ib| Arc::clone(&ib.boundary))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, MultiPolygon, Polygon};

    fn square(id: i64, level: i32) -> StoredBoundary {
        let ring = LineString::from(vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0), (0.0, 0.0)]);
        StoredBoundary {
            id,
            name: Some(format!("area-{id}")),
            admin_level: Some(level),
            geometry: MultiPolygon::new(vec![Polygon::new(ring, vec![])]),
        }
    }

    #[test]
    fn lookup_finds_point_inside_square() {
        let index = AdminSpatialIndex::build(vec![square(1, 4)]);
        let hits = index.lookup(1.0, 1.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
    }

    #[test]
    fn lookup_misses_point_outside() {
        let index = AdminSpatialIndex::build(vec![square(1, 4)]);
        assert!(index.lookup(10.0, 10.0).is_empty());
    }
}
