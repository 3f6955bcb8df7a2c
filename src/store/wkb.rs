//! A minimal hand-rolled WKB encoder/decoder for [`MultiPolygon<f64>`].
//!
//! No WKB crate appears anywhere in the retrieved corpus; a small custom
//! encoder is the documented pattern here (see DESIGN.md). Mirrors what
//! the Python original does with `shapely.wkb.dumps`/`ST_GeomFromWKB`
//! (`original_source/src/parser.py::save_relation_to_database`), just
//! without the `shapely` dependency.

use geo::{Coord, LineString, MultiPolygon, Polygon};

const WKB_MULTI_POLYGON: u32 = 6;
const WKB_POLYGON: u32 = 3;

/// Encode as little-endian WKB, `ST_GeomFromWKB`-compatible.
pub fn encode_multipolygon(mp: &MultiPolygon<f64>) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.push(1u8); // byte order: little-endian
    buf.extend_from_slice(&WKB_MULTI_POLYGON.to_le_bytes());
    buf.extend_from_slice(&(mp.0.len() as u32).to_le_bytes());
    for polygon in &mp.0 {
        encode_polygon(&mut buf, polygon);
    }
    buf
}

fn encode_polygon(buf: &mut Vec<u8>, polygon: &Polygon<f64>) {
    buf.push(1u8);
    buf.extend_from_slice(&WKB_POLYGON.to_le_bytes());
    let num_rings = 1 + polygon.interiors().len();
    buf.extend_from_slice(&(num_rings as u32).to_le_bytes());
    encode_ring(buf, polygon.exterior());
    for interior in polygon.interiors() {
        encode_ring(buf, interior);
    }
}

fn encode_ring(buf: &mut Vec<u8>, ring: &LineString<f64>) {
    buf.extend_from_slice(&(ring.0.len() as u32).to_le_bytes());
    for coord in &ring.0 {
        buf.extend_from_slice(&coord.x.to_le_bytes());
        buf.extend_from_slice(&coord.y.to_le_bytes());
    }
}

/// Decode a little-endian WKB `MultiPolygon`, as produced by `ST_AsWKB`
/// on a geometry column written by [`encode_multipolygon`]. Used by the
/// `query` binary to read boundaries back out of the store (spec.md
/// §6.5).
pub fn decode_multipolygon(bytes: &[u8]) -> Option<MultiPolygon<f64>> {
    let mut cursor = Cursor::new(bytes);
    let byte_order = cursor.read_u8()?;
    if byte_order != 1 {
        return None; // big-endian WKB is not produced by this store
    }
    let geom_type = cursor.read_u32()?;
    if geom_type != WKB_MULTI_POLYGON {
        return None;
    }
    let num_polygons = cursor.read_u32()?;
    let mut polygons = Vec::with_capacity(num_polygons as usize);
    for _ in 0..num_polygons {
        polygons.push(decode_polygon(&mut cursor)?);
    }
    Some(MultiPolygon::new(polygons))
}

fn decode_polygon(cursor: &mut Cursor) -> Option<Polygon<f64>> {
    let _byte_order = cursor.read_u8()?;
    let geom_type = cursor.read_u32()?;
    if geom_type != WKB_POLYGON {
        return None;
    }
    let num_rings = cursor.read_u32()?;
    if num_rings == 0 {
        return None;
    }
    let exterior = decode_ring(cursor)?;
    let mut interiors = Vec::with_capacity((num_rings - 1) as usize);
    for _ in 1..num_rings {
        interiors.push(decode_ring(cursor)?);
    }
    Some(Polygon::new(exterior, interiors))
}

fn decode_ring(cursor: &mut Cursor) -> Option<LineString<f64>> {
    let num_points = cursor.read_u32()?;
    let mut coords = Vec::with_capacity(num_points as usize);
    for _ in 0..num_points {
        let x = cursor.read_f64()?;
        let y = cursor.read_f64()?;
        coords.push(Coord { x, y });
    }
    Some(LineString::new(coords))
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn read_u8(&mut self) -> Option<u8> {
        let b = *self.bytes.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        let slice = self.bytes.get(self.pos..self.pos + 4)?;
        self.pos += 4;
        Some(u32::from_le_bytes(slice.try_into().ok()?))
    }

    fn read_f64(&mut self) -> Option<f64> {
        let slice = self.bytes.get(self.pos..self.pos + 8)?;
        self.pos += 8;
        Some(f64::from_le_bytes(slice.try_into().ok()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Polygon;

    #[test]
    fn round_trips_a_polygon_with_a_hole() {
        let exterior = LineString::from(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)]);
        let hole = LineString::from(vec![(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0), (1.0, 1.0)]);
        let mp = MultiPolygon::new(vec![Polygon::new(exterior, vec![hole])]);

        let bytes = encode_multipolygon(&mp);
        let decoded = decode_multipolygon(&bytes).expect("decode should succeed");

        assert_eq!(decoded.0.len(), 1);
        assert_eq!(decoded.0[0].interiors().len(), 1);
        assert_eq!(decoded.0[0].exterior().0.len(), 5);
    }

    #[test]
    fn round_trips_empty_multipolygon() {
        let mp = MultiPolygon::new(Vec::new());
        let bytes = encode_multipolygon(&mp);
        let decoded = decode_multipolygon(&bytes).expect("decode should succeed");
        assert!(decoded.0.is_empty());
    }
}
