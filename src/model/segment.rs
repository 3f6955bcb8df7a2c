//! [`Segment`]: one way used as a ring piece of a boundary polygon.

use geo::LineString;

/// An immutable linear segment extracted from an OSM way (C4 Phase B).
#[derive(Debug, Clone)]
pub struct Segment {
    pub id: i64,
    pub geometry: LineString<f64>,
    /// Coincident endpoints with at least 4 points (spec.md §3).
    pub is_closed: bool,
}

impl Segment {
    pub fn new(id: i64, geometry: LineString<f64>) -> Self {
        let is_closed = geometry.0.len() >= 4 && geometry.0.first() == geometry.0.last();
        Self { id, geometry, is_closed }
    }
}
