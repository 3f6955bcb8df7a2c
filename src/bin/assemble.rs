//! `assemble` — run the full pipeline against a config file (or a handful
//! of override flags) and persist the result to the output store.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use boundary_forge::config::{Config, InputConfig, OverpassConfig, StoreConfig};
use boundary_forge::driver::run_pipeline;
use boundary_forge::store::BoundaryStore;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "assemble")]
#[command(about = "Build administrative boundary polygons from an OSM extract")]
struct Args {
    /// TOML config file (takes precedence over the flags below).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Primary OSM PBF dump. Required when `--config` is not given.
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Root relation id to anchor the tree on.
    #[arg(long)]
    root: Option<i64>,

    /// Maximum administrative level to retain.
    #[arg(long)]
    l_max: Option<i32>,

    /// Output DuckDB path.
    #[arg(long, default_value = "boundaries.duckdb")]
    store: PathBuf,

    /// Enable Overpass gap repair for boundaries referenced but absent
    /// from the dump.
    #[arg(long)]
    gap_repair: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => {
            let dump_path = args.dump.context("either --config or --dump is required")?;
            Config {
                input: InputConfig {
                    dump_path,
                    root_boundary_id: args.root,
                    l_max: args.l_max.unwrap_or(boundary_forge::config::DEFAULT_L_MAX),
                    preferred_locale_key: None,
                    secondary_dump_path: None,
                    secondary_root_boundary_id: None,
                },
                overpass: OverpassConfig {
                    enabled: args.gap_repair,
                    ..OverpassConfig::default()
                },
                store: StoreConfig { path: args.store.clone() },
            }
        }
    };

    let output = run_pipeline(&config).await?;

    info!(
        "Assembled {} boundaries ({} diagnostics)",
        output.boundaries.len(),
        output.diagnostics.len()
    );
    for diagnostic in output.diagnostics.iter() {
        tracing::warn!("{diagnostic}");
    }

    let store = BoundaryStore::open(&config.store.path)?;
    store.upsert_boundaries(&output.boundaries)?;

    info!("Wrote {} boundaries to {}", output.boundaries.len(), config.store.path.display());

    Ok(())
}
