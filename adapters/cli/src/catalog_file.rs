//! TOML map catalog files.
//!
//! ```toml
//! [[maps]]
//! name = "Corridor"
//! layout = ["##########", "#POOOOOOR#", "##########"]
//! ```

use std::{fs, path::Path};

use anyhow::{Context, Result};
use block_picker_world::catalog::MapCatalog;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    maps: Vec<MapEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MapEntry {
    name: String,
    layout: Vec<String>,
}

/// Reads and validates a catalog file.
pub(crate) fn load_catalog(path: &Path) -> Result<MapCatalog> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read map catalog {}", path.display()))?;
    parse_catalog(&source).with_context(|| format!("invalid map catalog {}", path.display()))
}

/// Parses catalog TOML and validates every layout.
pub(crate) fn parse_catalog(source: &str) -> Result<MapCatalog> {
    let file: CatalogFile = toml::from_str(source).context("malformed catalog TOML")?;
    let catalog = MapCatalog::from_layouts(
        file.maps
            .into_iter()
            .map(|entry| (entry.name, entry.layout)),
    )?;
    Ok(catalog)
}
