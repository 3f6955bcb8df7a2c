//! Structured, non-fatal warnings accumulated across a pipeline run.
//!
//! Spec §7 favors partial results with loud diagnostics over all-or-
//! nothing failure. Every component that can encounter a structural
//! anomaly (a malformed relation, a DAG cycle, an unpolygonizable
//! boundary, an orphan inner ring, a duplicate id, a merge conflict)
//! both logs a `warn!` and pushes a [`Diagnostic`] here, so a caller can
//! inspect exactly what went sideways without re-parsing logs.

use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    DuplicateRelation { id: i64 },
    MalformedRelation { id: i64, reason: String },
    MalformedWay { id: i64, reason: String },
    DagCycleRemainder { ids: Vec<i64> },
    MissingSegments { expected: usize, found: usize },
    UnpolygonizableBoundary { id: i64 },
    OrphanInnerRing { boundary_id: i64 },
    DuplicateOuterInnerSegment { boundary_id: i64, segment_id: i64 },
    MergeConflict { id: i64 },
    RemoteBatchDropped { ids: Vec<i64>, reason: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::DuplicateRelation { id } => {
                write!(f, "relation {id} appears twice in dump, first wins")
            }
            Diagnostic::MalformedRelation { id, reason } => {
                write!(f, "relation {id} malformed: {reason}")
            }
            Diagnostic::MalformedWay { id, reason } => {
                write!(f, "way {id} malformed: {reason}")
            }
            Diagnostic::DagCycleRemainder { ids } => {
                write!(f, "DAG cycle remainder, {} boundaries unresolved: {ids:?}", ids.len())
            }
            Diagnostic::MissingSegments { expected, found } => {
                write!(f, "expected {expected} segments, found {found}")
            }
            Diagnostic::UnpolygonizableBoundary { id } => {
                write!(f, "boundary {id} had segments but polygonized to nothing")
            }
            Diagnostic::OrphanInnerRing { boundary_id } => {
                write!(f, "boundary {boundary_id} has an inner ring contained by no outer ring")
            }
            Diagnostic::DuplicateOuterInnerSegment { boundary_id, segment_id } => {
                write!(
                    f,
                    "boundary {boundary_id} lists segment {segment_id} as both outer and inner; outer wins"
                )
            }
            Diagnostic::MergeConflict { id } => {
                write!(f, "merge conflict: boundary {id} already present, first wins")
            }
            Diagnostic::RemoteBatchDropped { ids, reason } => {
                write!(f, "dropped gap-repair batch of {} ids: {reason}", ids.len())
            }
        }
    }
}

/// Accumulates diagnostics for a single pipeline run and mirrors each one
/// to the `tracing` subscriber as it's recorded.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!("{diagnostic}");
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
