//! Streaming extraction from the OSM PBF dump: administrative relations
//! (C1, §4.1) and the way segments they reference (C4 Phase A/B, §4.4).

mod node_store;
mod relations;
mod segments;

pub use node_store::NodeStore;
pub use relations::{extract_relations, RelationExtract};
pub use segments::extract_segments;
