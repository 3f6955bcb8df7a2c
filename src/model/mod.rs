//! The boundary graph's data model: [`Boundary`], [`Segment`], and the
//! transient relation-to-parent index used while the DAG is under
//! construction.

mod boundary;
mod segment;

pub use boundary::{Boundary, BoundaryNames};
pub use segment::Segment;

use hashbrown::HashMap;

/// Map from a relation id to the ids of relations that reference it as a
/// `subarea`. Built and consulted transiently during DAG construction
/// (§4.2) and gap repair (§4.3); never persisted.
pub type RelationParentIndex = HashMap<i64, Vec<i64>>;
