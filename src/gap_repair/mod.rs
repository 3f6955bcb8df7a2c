//! C3 — Gap Repairer (spec.md §4.3): fetches relations referenced as
//! sub-areas but absent from the local dump against a remote
//! Overpass-style query service (spec.md §6.2).

mod client;
mod repair;

pub use client::{OverpassClient, OverpassElement, OverpassMember, OverpassResponse};
pub use repair::{compute_frontier, run};
