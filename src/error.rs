//! Error kinds for the boundary pipeline.
//!
//! Most structural anomalies (cycles, unpolygonizable segments, orphan
//! inner rings, duplicate ids, merge conflicts) are not represented here —
//! they are reported through [`crate::diagnostics::Diagnostics`] so a run
//! can finish with partial results. `BoundaryError` covers the failures
//! that abort a stage outright.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("failed to read OSM dump at {path}: {source}")]
    DumpRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse OSM dump at {path}: {source}")]
    DumpParse {
        path: PathBuf,
        #[source]
        source: osmpbfreader::Error,
    },

    #[error("remote query failed after {attempts} attempt(s): {message}")]
    RemoteTransport { attempts: u32, message: String },

    #[error("output store error: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BoundaryError>;
