//! The output store (spec.md §6.3): a spatial-capable tabular store
//! holding one upserted row per boundary, geometry encoded as WKB.

mod duckdb_store;
mod wkb;

pub use duckdb_store::BoundaryStore;
pub use wkb::{decode_multipolygon, encode_multipolygon};
