//! PIP service: the single operation the reverse-geocoding consumer
//! needs (spec.md §6.3) — point lookup ordered by ascending admin level.

use std::sync::Arc;

use super::boundary::StoredBoundary;
use super::index::AdminSpatialIndex;

pub struct PipService {
    index: AdminSpatialIndex,
}

impl PipService {
    pub fn new(index: AdminSpatialIndex) -> Self {
        Self { index }
    }

    /// Every boundary containing `(lon, lat)`, ordered by ascending admin
    /// level (country before province before city, absent level last).
    pub fn lookup(&self, lon: f64, lat: f64) -> Vec<Arc<StoredBoundary>> {
        let mut hits = self.index.lookup(lon, lat);
        hits.sort_by_key(|b| b.admin_level.unwrap_or(i32::MAX));
        hits
    }

    pub fn index(&self) -> &AdminSpatialIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, MultiPolygon, Polygon};

    fn square(id: i64, level: i32, size: f64) -> StoredBoundary {
        let ring = LineString::from(vec![(0.0, 0.0), (size, 0.0), (size, size), (0.0, size), (0.0, 0.0)]);
        StoredBoundary {
            id,
            name: Some(format!("area-{id}")),
            admin_level: Some(level),
            geometry: MultiPolygon::new(vec![Polygon::new(ring, vec![])]),
        }
    }

    #[test]
    fn lookup_orders_nested_boundaries_by_ascending_level() {
        let index = AdminSpatialIndex::build(vec![square(1, 6), square(2, 2), square(3, 4)]);
        let service = PipService::new(index);

        let hits = service.lookup(1.0, 1.0);
        let levels: Vec<i32> = hits.iter().map(|b| b.admin_level.unwrap()).collect();
        assert_eq!(levels, vec![2, 4, 6]);
    }

    #[test]
    fn lookup_on_empty_index_returns_empty() {
        let index = AdminSpatialIndex::build(vec![]);
        let service = PipService::new(index);
        assert!(service.lookup(8.5, 47.4).is_empty());
    }
}
