//! The output store (spec.md §6.3): a spatial-capable tabular store.
//!
//! Uses `duckdb` with its bundled `spatial` extension, mirroring the
//! Python original's `parser.py::init_db`/`save_relation_to_database`
//! (DuckDB + `ST_GeomFromWKB`) and grounded in the pack's own
//! `duckdb`-backed spatial-index code (`BSteffaniak-crime-map`). Schema
//! creation is idempotent; writes are upserts keyed by id.

use std::path::Path;

use hashbrown::HashMap;
use tracing::info;

use super::wkb::encode_multipolygon;
use crate::error::{BoundaryError, Result};
use crate::model::Boundary;

pub struct BoundaryStore {
    conn: duckdb::Connection,
}

impl BoundaryStore {
    /// Open (creating if absent) the store at `path` and ensure its
    /// schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = duckdb::Connection::open(path.as_ref()).map_err(store_err)?;
        conn.execute_batch("INSTALL spatial; LOAD spatial;").map_err(store_err)?;
        let store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    /// In-memory store, used by tests and the `query` binary's demo mode.
    pub fn open_in_memory() -> Result<Self> {
        let conn = duckdb::Connection::open_in_memory().map_err(store_err)?;
        conn.execute_batch("INSTALL spatial; LOAD spatial;").map_err(store_err)?;
        let store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS boundary (
                    id BIGINT PRIMARY KEY,
                    name VARCHAR,
                    name_en VARCHAR,
                    name_zh VARCHAR,
                    name_preference VARCHAR,
                    admin_level INTEGER,
                    super_area_ids BIGINT[],
                    sub_area_ids BIGINT[],
                    root_id BIGINT,
                    outer_segment_ids BIGINT[],
                    inner_segment_ids BIGINT[],
                    geom GEOMETRY
                );
                "#,
            )
            .map_err(store_err)
    }

    /// Upsert every boundary in `boundaries`, keyed by id (spec.md §6.3).
    pub fn upsert_boundaries(&self, boundaries: &HashMap<i64, Boundary>) -> Result<usize> {
        let mut stmt = self
            .conn
            .prepare(
                "INSERT OR REPLACE INTO boundary VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ST_GeomFromWKB(?))",
            )
            .map_err(store_err)?;

        let mut count = 0;
        for boundary in boundaries.values() {
            let wkb = encode_multipolygon(&boundary.geometry);
            stmt.execute(duckdb::params![
                boundary.id,
                boundary.names.default,
                boundary.names.en,
                boundary.names.zh,
                boundary.names.preference,
                boundary.admin_level,
                boundary.super_area_ids,
                boundary.sub_area_ids,
                boundary.root_id,
                boundary.outer_segment_ids,
                boundary.inner_segment_ids,
                wkb,
            ])
            .map_err(store_err)?;
            count += 1;
        }

        info!("Upserted {count} boundaries into the output store");
        Ok(count)
    }

    /// Raw access for callers (e.g. `pip::load_from_store`) that need to
    /// read the store back rather than write it.
    pub fn connection(&self) -> &duckdb::Connection {
        &self.conn
    }
}

fn store_err(e: duckdb::Error) -> BoundaryError {
    BoundaryError::Store(e.to_string())
}
