//! C1 — Relation Extractor (spec.md §4.1).
//!
//! Streams every `boundary=*` relation once, splitting them into fully
//! populated administrative [`Boundary`] records and a bare id set of
//! non-administrative relations (needed later to tell a deliberate
//! non-admin reference apart from a genuinely missing one, §4.3).

use hashbrown::{HashMap, HashSet};
use indicatif::{ProgressBar, ProgressStyle};
use osmpbfreader::{OsmId, OsmObj, OsmPbfReader};
use tracing::info;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::model::{Boundary, BoundaryNames};

pub struct RelationExtract {
    pub boundaries: HashMap<i64, Boundary>,
    pub non_admin: HashSet<i64>,
}

/// Stream `reader` once and classify every `type=boundary` relation.
///
/// `preferred_locale_key` is a raw tag key (e.g. `"name:ja"`) whose value,
/// if present, populates [`BoundaryNames::preference`].
pub fn extract_relations<R: std::io::Read + std::io::Seek>(
    reader: &mut OsmPbfReader<R>,
    preferred_locale_key: Option<&str>,
    diagnostics: &mut Diagnostics,
) -> anyhow::Result<RelationExtract> {
    info!("Extracting boundary relations...");

    reader.rewind()?;

    let mut boundaries: HashMap<i64, Boundary> = HashMap::new();
    let mut non_admin: HashSet<i64> = HashSet::new();

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] scanned {pos} objects ({per_sec})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );

    for obj in reader.iter() {
        pb.inc(1);
        let obj = match obj {
            Ok(o) => o,
            Err(e) => {
                tracing::warn!("skipping unreadable OSM object: {e}");
                continue;
            }
        };

        let OsmObj::Relation(rel) = obj else { continue };

        if rel.tags.get("type").map(|v| v.as_str()) != Some("boundary") {
            continue;
        }

        let is_admin = rel.tags.get("boundary").map(|v| v == "administrative").unwrap_or(false);
        let id = rel.id.0;

        if !is_admin {
            non_admin.insert(id);
            continue;
        }

        if boundaries.contains_key(&id) {
            diagnostics.push(Diagnostic::DuplicateRelation { id });
            continue;
        }

        let admin_level = rel
            .tags
            .get("admin_level")
            .and_then(|v| v.parse::<i32>().ok());

        let names = BoundaryNames {
            default: rel.tags.get("name").map(|v| v.to_string()),
            en: rel.tags.get("name:en").map(|v| v.to_string()),
            zh: rel.tags.get("name:zh").map(|v| v.to_string()),
            preference: preferred_locale_key
                .and_then(|key| rel.tags.get(key))
                .map(|v| v.to_string()),
        };

        let mut boundary = Boundary::new(id, names, admin_level);

        for member in &rel.refs {
            match (member.role.as_str(), member.member) {
                ("subarea", OsmId::Relation(sub_id)) => boundary.add_sub_area(sub_id.0),
                ("outer", OsmId::Way(way_id)) => boundary.outer_segment_ids.push(way_id.0),
                ("inner", OsmId::Way(way_id)) => boundary.inner_segment_ids.push(way_id.0),
                _ => {}
            }
        }

        boundaries.insert(id, boundary);
    }

    pb.finish_and_clear();
    info!(
        "Extracted {} administrative boundaries, {} non-administrative boundary relations",
        boundaries.len(),
        non_admin.len()
    );

    Ok(RelationExtract { boundaries, non_admin })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_names_preference_populated_from_configured_key() {
        // Exercised at the Boundary level since building a real PBF byte
        // stream is out of scope for a unit test; see pipeline integration
        // tests for the end-to-end extraction path.
        let names = BoundaryNames {
            default: Some("Taiwan".to_string()),
            en: Some("Taiwan".to_string()),
            zh: Some("台灣".to_string()),
            preference: Some("Taiwan-ja".to_string()),
        };
        assert!(!names.is_empty());
        assert_eq!(names.preference.as_deref(), Some("Taiwan-ja"));
    }
}
