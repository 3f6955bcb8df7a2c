//! C2 — DAG Builder (spec.md §4.2): links the containment graph, resolves
//! one root per boundary, and prunes by level and by requested root.

mod builder;

pub use builder::{build_dag, filter_by_level, filter_to_root};
