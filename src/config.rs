//! Pipeline configuration, loaded from TOML (same loader shape as the
//! teacher's `ingest::config::Config::load_from_file`) and overridable by
//! CLI flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// The admin level OSM documents as the practical maximum nesting depth
/// (neighbourhood/suburb). Used as `L_max`'s default (spec.md §4.1).
pub const DEFAULT_L_MAX: i32 = 11;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub input: InputConfig,
    #[serde(default)]
    pub overpass: OverpassConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Primary dump to parse.
    pub dump_path: PathBuf,
    /// Root relation id to anchor the tree on. `None` keeps every root
    /// discovered in the dump.
    #[serde(default)]
    pub root_boundary_id: Option<i64>,
    /// Maximum administrative level to retain (spec.md §4.1/§4.2).
    #[serde(default = "default_l_max")]
    pub l_max: i32,
    /// Tag key whose value populates `BoundaryNames::preference`, e.g.
    /// `"name:ja"`.
    #[serde(default)]
    pub preferred_locale_key: Option<String>,
    /// A second, independently-parsed dump to graft onto the first via
    /// C5 (spec.md §4.5). Its own root id is required when present.
    #[serde(default)]
    pub secondary_dump_path: Option<PathBuf>,
    #[serde(default)]
    pub secondary_root_boundary_id: Option<i64>,
}

fn default_l_max() -> i32 {
    DEFAULT_L_MAX
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverpassConfig {
    #[serde(default = "default_overpass_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_iteration_cap")]
    pub iteration_cap: u32,
    #[serde(default)]
    pub enabled: bool,
}

fn default_overpass_endpoint() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_iteration_cap() -> u32 {
    10
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            endpoint: default_overpass_endpoint(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            iteration_cap: default_iteration_cap(),
            enabled: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("boundaries.duckdb")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { path: default_store_path() }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read config file {}", path.as_ref().display()))?;
        let config: Config = toml::from_str(&content).context("failed to parse config file")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let toml_src = r#"
            [input]
            dump_path = "region.osm.pbf"
        "#;
        let config: Config = toml::from_str(toml_src).unwrap();
        assert_eq!(config.input.l_max, DEFAULT_L_MAX);
        assert_eq!(config.overpass.max_retries, 3);
        assert!(!config.overpass.enabled);
    }

    #[test]
    fn parses_full_config() {
        let toml_src = r#"
            [input]
            dump_path = "region.osm.pbf"
            root_boundary_id = 270056
            l_max = 7
            preferred_locale_key = "name:ja"
            secondary_dump_path = "region2.osm.pbf"
            secondary_root_boundary_id = 449220

            [overpass]
            endpoint = "https://overpass.example/api/interpreter"
            timeout_secs = 45
            max_retries = 5
            iteration_cap = 12
            enabled = true

            [store]
            path = "out.duckdb"
        "#;
        let config: Config = toml::from_str(toml_src).unwrap();
        assert_eq!(config.input.root_boundary_id, Some(270056));
        assert_eq!(config.input.l_max, 7);
        assert_eq!(config.overpass.timeout_secs, 45);
        assert!(config.overpass.enabled);
        assert_eq!(config.store.path, PathBuf::from("out.duckdb"));
    }
}
