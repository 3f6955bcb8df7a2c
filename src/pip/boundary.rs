//! Loads assembled boundaries back out of the output store for the PIP
//! query surface (spec.md §6.5). A deliberately thin record — just
//! enough to answer "what administrative areas contain this point,
//! ordered by level" — distinct from the full [`crate::model::Boundary`]
//! used while the graph is under construction.

use geo::MultiPolygon;
use tracing::warn;

use crate::error::{BoundaryError, Result};
use crate::store::decode_multipolygon;

#[derive(Debug, Clone)]
pub struct StoredBoundary {
    pub id: i64,
    pub name: Option<String>,
    pub admin_level: Option<i32>,
    pub geometry: MultiPolygon<f64>,
}

impl StoredBoundary {
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        use geo::BoundingRect;
        self.geometry
            .bounding_rect()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }
}

/// Read every boundary with a non-empty geometry out of the store
/// (read-only consumer, spec.md §6.3).
pub fn load_from_store(conn: &duckdb::Connection) -> Result<Vec<StoredBoundary>> {
    let mut stmt = conn
        .prepare("SELECT id, name, admin_level, ST_AsWKB(geom) FROM boundary WHERE geom IS NOT NULL")
        .map_err(|e| BoundaryError::Store(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| {
            let id: i64 = row.get(0)?;
            let name: Option<String> = row.get(1)?;
            let admin_level: Option<i32> = row.get(2)?;
            let wkb: Vec<u8> = row.get(3)?;
            Ok((id, name, admin_level, wkb))
        })
        .map_err(|e| BoundaryError::Store(e.to_string()))?;

    let mut boundaries = Vec::new();
    for row in rows {
        let (id, name, admin_level, wkb) = row.map_err(|e| BoundaryError::Store(e.to_string()))?;
        match decode_multipolygon(&wkb) {
            Some(geometry) if !geometry.0.is_empty() => {
                boundaries.push(StoredBoundary { id, name, admin_level, geometry });
            }
            _ => warn!("boundary {id} has no decodable geometry, skipping from spatial index"),
        }
    }

    Ok(boundaries)
}
