//! C4 Phase A/B — collect needed segment ids and stream their geometry
//! from the dump (spec.md §4.4).

use geo::{Coord, LineString, Simplify};
use hashbrown::{HashMap, HashSet};
use osmpbfreader::{OsmObj, OsmPbfReader, WayId};
use tracing::info;

use super::NodeStore;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::model::Segment;

/// Simplification tolerance in degrees (~11m at the equator), applied
/// once per segment (spec.md §4.4 Phase B).
pub const SIMPLIFY_TOLERANCE_DEGREES: f64 = 1e-4;

/// Stream `reader` for every way in `needed_ids`, materializing its
/// polyline in WGS-84. Resident memory stays proportional to the needed
/// way/node sets via [`NodeStore`], not the whole dump.
pub fn extract_segments<R: std::io::Read + std::io::Seek>(
    reader: &mut OsmPbfReader<R>,
    needed_ids: &HashSet<i64>,
    diagnostics: &mut Diagnostics,
) -> anyhow::Result<HashMap<i64, Segment>> {
    info!("Collecting {} needed segments...", needed_ids.len());

    reader.rewind()?;

    let mut way_nodes: HashMap<WayId, Vec<i64>> = HashMap::new();
    let mut needed_nodes: HashSet<i64> = HashSet::new();

    for obj in reader.iter() {
        let obj = obj?;
        if let OsmObj::Way(way) = obj {
            if needed_ids.contains(&way.id.0) {
                for node in &way.nodes {
                    needed_nodes.insert(node.0);
                }
                way_nodes.insert(way.id, way.nodes.iter().map(|n| n.0).collect());
            }
        }
    }

    let node_store = NodeStore::build(reader, &needed_nodes)?;

    let mut segments: HashMap<i64, Segment> = HashMap::with_capacity(way_nodes.len());

    for (way_id, node_ids) in &way_nodes {
        let coords: Vec<Coord<f64>> = node_ids
            .iter()
            .filter_map(|&nid| node_store.get(osmpbfreader::NodeId(nid)))
            .map(|(lon, lat)| Coord { x: lon, y: lat })
            .collect();

        if coords.len() < 2 {
            diagnostics.push(Diagnostic::MalformedWay {
                id: way_id.0,
                reason: "fewer than 2 resolvable node coordinates".to_string(),
            });
            continue;
        }

        let line = LineString::new(coords).simplify(SIMPLIFY_TOLERANCE_DEGREES);
        segments.insert(way_id.0, Segment::new(way_id.0, line));
    }

    if segments.len() != needed_ids.len() {
        diagnostics.push(Diagnostic::MissingSegments {
            expected: needed_ids.len(),
            found: segments.len(),
        });
    }

    info!("Materialized {} of {} needed segments", segments.len(), needed_ids.len());

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::SIMPLIFY_TOLERANCE_DEGREES;

    #[test]
    fn tolerance_matches_spec() {
        assert_eq!(SIMPLIFY_TOLERANCE_DEGREES, 1e-4);
    }
}
