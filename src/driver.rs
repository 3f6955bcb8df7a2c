//! The thin orchestrator: `C1 → C2 → C3 → C4`, then optionally `C5` when
//! a second dump is configured (spec.md §2, §5).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use hashbrown::{HashMap, HashSet};
use osmpbfreader::OsmPbfReader;
use tracing::info;

use crate::config::Config;
use crate::dag;
use crate::diagnostics::Diagnostics;
use crate::error::BoundaryError;
use crate::extract::{extract_relations, extract_segments};
use crate::gap_repair::{self, OverpassClient};
use crate::merge;
use crate::model::{Boundary, Segment};
use crate::polygon;

/// Everything the driver produced: the final boundary map and every
/// diagnostic recorded along the way (spec.md §7 — partial results with
/// loud diagnostics, never an all-or-nothing failure).
pub struct PipelineOutput {
    pub boundaries: HashMap<i64, Boundary>,
    pub segments: HashMap<i64, Segment>,
    pub diagnostics: Diagnostics,
}

/// Run C1 → C2 → C3 → C4 against `config.input`, then C5 against
/// `config.input.secondary_dump_path` if one is configured.
pub async fn run_pipeline(config: &Config) -> Result<PipelineOutput> {
    let mut diagnostics = Diagnostics::new();

    let mut parsed = parse_one_dump(
        &config.input.dump_path,
        config.input.root_boundary_id,
        config.input.l_max,
        config.input.preferred_locale_key.as_deref(),
        &config.overpass,
        &mut diagnostics,
    )
    .await?;

    polygon::assemble_all(&mut parsed.boundaries, &parsed.segments, &mut diagnostics, true);

    if let Some(secondary_path) = &config.input.secondary_dump_path {
        let primary_root = config
            .input
            .root_boundary_id
            .context("a primary root_boundary_id is required to graft a secondary dump")?;
        let secondary_root = config
            .input
            .secondary_root_boundary_id
            .context("secondary_root_boundary_id is required alongside secondary_dump_path")?;

        let mut secondary = parse_one_dump(
            secondary_path,
            Some(secondary_root),
            config.input.l_max,
            config.input.preferred_locale_key.as_deref(),
            &config.overpass,
            &mut diagnostics,
        )
        .await?;

        polygon::assemble_all(&mut secondary.boundaries, &secondary.segments, &mut diagnostics, true);

        merge::merge_tree(&mut parsed.boundaries, secondary.boundaries, primary_root, &mut diagnostics);
        parsed.segments.extend(secondary.segments);

        // The merge's segment cancellation rule changed the root's
        // outer/inner lists; re-polygonize just the root against the
        // union of both parses' segments.
        if let Some(root) = parsed.boundaries.get(&primary_root).cloned() {
            let mut local = Diagnostics::new();
            let geometry = polygon::assemble_boundary(&root, &parsed.segments, &mut local);
            diagnostics.extend(local);
            if let Some(b) = parsed.boundaries.get_mut(&primary_root) {
                b.geometry = geometry;
            }
        }
    }

    Ok(PipelineOutput {
        boundaries: parsed.boundaries,
        segments: parsed.segments,
        diagnostics,
    })
}

struct ParsedDump {
    boundaries: HashMap<i64, Boundary>,
    segments: HashMap<i64, Segment>,
}

/// C1 → C2 → (optional C3) → C4 Phase A/B for a single dump.
async fn parse_one_dump(
    dump_path: &Path,
    root_boundary_id: Option<i64>,
    l_max: i32,
    preferred_locale_key: Option<&str>,
    overpass_config: &crate::config::OverpassConfig,
    diagnostics: &mut Diagnostics,
) -> Result<ParsedDump> {
    let mut reader = open_reader(dump_path)?;

    let extract = extract_relations(&mut reader, preferred_locale_key, diagnostics)?;
    let mut boundaries = extract.boundaries;
    let mut non_admin = extract.non_admin;

    dag::build_dag(&mut boundaries, diagnostics);
    let mut pruned = dag::filter_by_level(&mut boundaries, l_max);
    if let Some(root) = root_boundary_id {
        dag::filter_to_root(&mut boundaries, root);
    }

    if overpass_config.enabled {
        let client = OverpassClient::new(overpass_config);
        gap_repair::run(
            &mut boundaries,
            &mut non_admin,
            &mut pruned,
            l_max,
            preferred_locale_key,
            &client,
            diagnostics,
        )
        .await;
        if let Some(root) = root_boundary_id {
            dag::filter_to_root(&mut boundaries, root);
        }
    }

    let needed_ids = union_needed_segment_ids(&boundaries);
    let mut reader = open_reader(dump_path)?;
    let segments = extract_segments(&mut reader, &needed_ids, diagnostics)?;

    info!(
        "Parsed {}: {} boundaries, {} segments",
        dump_path.display(),
        boundaries.len(),
        segments.len()
    );

    Ok(ParsedDump { boundaries, segments })
}

fn union_needed_segment_ids(boundaries: &HashMap<i64, Boundary>) -> HashSet<i64> {
    boundaries
        .values()
        .flat_map(|b| b.outer_segment_ids.iter().chain(b.inner_segment_ids.iter()).copied())
        .collect()
}

fn open_reader(path: &Path) -> Result<OsmPbfReader<BufReader<File>>> {
    let file = File::open(path).map_err(|e| BoundaryError::DumpRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(OsmPbfReader::new(BufReader::new(file)))
}
