//! A disk-backed, memory-mapped table of node coordinates.
//!
//! Grounded directly on the teacher's `pip::geometry::GeometryResolver`:
//! a single streaming pass writes `(id, lon, lat)` records for exactly the
//! nodes a caller says it needs, sorts them if the dump wasn't already
//! node-id-ordered, memory-maps the result, and resolves coordinates by
//! binary search. This keeps resident memory proportional to the needed
//! node set rather than the whole dump (spec.md §5's memory bound).

use std::io::{BufWriter, Seek, SeekFrom, Write};

use hashbrown::HashSet;
use indicatif::{ProgressBar, ProgressStyle};
use memmap2::{Mmap, MmapMut};
use osmpbfreader::{NodeId, OsmObj, OsmPbfReader};
use tempfile::tempfile;
use tracing::info;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct NodeRecord {
    id: i64,
    lon: f64,
    lat: f64,
}

const RECORD_SIZE: usize = std::mem::size_of::<NodeRecord>();

pub struct NodeStore {
    mmap: Mmap,
    len: usize,
}

impl NodeStore {
    /// Stream the dump once, keeping only nodes whose id is in `needed`.
    pub fn build<R: std::io::Read + std::io::Seek>(
        reader: &mut OsmPbfReader<R>,
        needed: &HashSet<i64>,
    ) -> anyhow::Result<Self> {
        info!("Storing coordinates for {} needed nodes...", needed.len());

        if needed.is_empty() {
            let mmap = MmapMut::map_anon(1)?.make_read_only()?;
            return Ok(Self { mmap, len: 0 });
        }

        reader.rewind()?;

        let mut file = tempfile()?;
        let mut writer = BufWriter::new(&mut file);
        let mut stored = 0usize;
        let mut sorted = true;
        let mut last_id = i64::MIN;

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] resolved {pos} node coordinates ({per_sec})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );

        for obj in reader.iter() {
            let obj = obj?;
            if let OsmObj::Node(node) = obj {
                if needed.contains(&node.id.0) {
                    let id = node.id.0;
                    if id < last_id {
                        sorted = false;
                    }
                    last_id = id;

                    let record = NodeRecord { id, lon: node.lon(), lat: node.lat() };
                    let bytes = unsafe {
                        std::slice::from_raw_parts(
                            &record as *const NodeRecord as *const u8,
                            RECORD_SIZE,
                        )
                    };
                    writer.write_all(bytes)?;
                    stored += 1;
                    pb.set_position(stored as u64);
                }
            }
        }
        pb.finish_and_clear();

        writer.flush()?;
        drop(writer);

        file.seek(SeekFrom::Start(0))?;
        let mut mmap = unsafe { MmapMut::map_mut(&file)? };

        assert_eq!(mmap.len() % RECORD_SIZE, 0, "node store file size must be record-aligned");

        if !sorted && stored > 0 {
            info!("Node coordinates not id-sorted in dump order, sorting in place...");
            let slice: &mut [NodeRecord] = unsafe {
                std::slice::from_raw_parts_mut(mmap.as_mut_ptr() as *mut NodeRecord, stored)
            };
            slice.sort_unstable_by_key(|n| n.id);
        }

        let mmap = mmap.make_read_only()?;

        info!("Stored {stored} node coordinates ({} bytes)", mmap.len());

        Ok(Self { mmap, len: stored })
    }

    pub fn get(&self, node_id: NodeId) -> Option<(f64, f64)> {
        let slice: &[NodeRecord] = unsafe {
            std::slice::from_raw_parts(self.mmap.as_ptr() as *const NodeRecord, self.len)
        };
        slice
            .binary_search_by_key(&node_id.0, |n| n.id)
            .ok()
            .map(|idx| (slice[idx].lon, slice[idx].lat))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
