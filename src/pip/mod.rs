//! Reverse-geocoding query surface (spec.md §6.5). Out of scope as hard
//! engineering, but implemented as a thin ambient module — grounded
//! directly in the teacher's `pip::index`/`pip::service` — so the output
//! store's primary consumer is exercised by at least one test.

mod boundary;
mod index;
mod service;

pub use boundary::{load_from_store, StoredBoundary};
pub use index::AdminSpatialIndex;
pub use service::PipService;
