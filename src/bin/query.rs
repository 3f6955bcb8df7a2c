//! `query` — reverse-geocode a single point against an already-assembled
//! output store (spec.md §6.5).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use boundary_forge::pip::{load_from_store, AdminSpatialIndex, PipService};
use boundary_forge::store::BoundaryStore;

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Reverse-geocode a point against an assembled boundary store")]
struct Args {
    /// DuckDB store produced by `assemble`.
    #[arg(long, default_value = "boundaries.duckdb")]
    store: PathBuf,

    /// Longitude of the query point.
    longitude: f64,

    /// Latitude of the query point.
    latitude: f64,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    let args = Args::parse();

    let store = BoundaryStore::open(&args.store)?;
    let stored = load_from_store(store.connection())?;
    info!("Loaded {} boundaries from {}", stored.len(), args.store.display());

    let index = AdminSpatialIndex::build(stored);
    let service = PipService::new(index);

    let hits = service.lookup(args.longitude, args.latitude);
    if hits.is_empty() {
        println!("no boundary contains ({}, {})", args.longitude, args.latitude);
        return Ok(());
    }

    for boundary in &hits {
        println!(
            "{}\t{}\t{}",
            boundary.id,
            boundary.admin_level.map_or("?".to_string(), |l| l.to_string()),
            boundary.name.as_deref().unwrap_or("(unnamed)")
        );
    }

    Ok(())
}
