//! Ordered catalog of named map layouts.

use thiserror::Error;

use crate::layout::{Layout, LayoutError};

/// Name and validated layout of a single map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapDefinition {
    name: String,
    layout: Layout,
}

impl MapDefinition {
    /// Validates raw layout rows and pairs them with a display name.
    pub fn new<N, S>(name: N, rows: &[S]) -> Result<Self, LayoutError>
    where
        N: Into<String>,
        S: AsRef<str>,
    {
        Ok(Self {
            name: name.into(),
            layout: Layout::from_rows(rows)?,
        })
    }

    /// Display name of the map.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validated layout of the map.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }
}

/// Non-empty, ordered list of maps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapCatalog {
    maps: Vec<MapDefinition>,
}

impl MapCatalog {
    /// Builds a catalog from `(name, rows)` pairs, validating every layout.
    pub fn from_layouts<I, N, R, S>(layouts: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (N, R)>,
        N: Into<String>,
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let mut maps = Vec::new();
        for (index, (name, rows)) in layouts.into_iter().enumerate() {
            let name = name.into();
            let definition = MapDefinition::new(name.clone(), rows.as_ref()).map_err(|source| {
                CatalogError::InvalidMap {
                    index,
                    name,
                    source,
                }
            })?;
            maps.push(definition);
        }
        Self::from_definitions(maps)
    }

    /// Builds a catalog from already validated definitions.
    pub fn from_definitions(maps: Vec<MapDefinition>) -> Result<Self, CatalogError> {
        if maps.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { maps })
    }

    /// The four maps shipped with the game.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_layouts(BUILTIN_MAPS)
    }

    /// Number of maps in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// A catalog is never empty; provided for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Index of the final map.
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.maps.len().saturating_sub(1)
    }

    /// Returns the map at the provided index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&MapDefinition> {
        self.maps.get(index)
    }

    /// Iterates the maps in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &MapDefinition> {
        self.maps.iter()
    }
}

/// Reasons a catalog fails to load.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The catalog contains no maps.
    #[error("map catalog is empty")]
    Empty,
    /// A map layout failed validation.
    #[error("map {index} ({name:?}) is malformed: {source}")]
    InvalidMap {
        /// Catalog index of the malformed map.
        index: usize,
        /// Display name of the malformed map.
        name: String,
        /// Validation failure.
        #[source]
        source: LayoutError,
    },
}

pub(crate) const BUILTIN_MAPS: [(&str, &[&str]); 4] = [
    (
        "Simples",
        &[
            "###########",
            "#OPOOOOOOR#",
            "#OOOOOOOOO#",
            "#OOOOOOOOO#",
            "#OOOOOOOOO#",
            "#OOOOOOOOO#",
            "#OOOOOOOOO#",
            "#OOOOOOOOO#",
            "#OOOOOOOOO#",
            "#OOOOOOOOO#",
            "###########",
        ],
    ),
    (
        "Sorriso",
        &[
            "###########",
            "#OOOOOOOOO#",
            "#OOOOOOOOO#",
            "#OOOPOOOOO#",
            "#OOOOOOOOO#",
            "#OO#OOO#OO#",
            "#OOO###OOO#",
            "#OOOOOROOO#",
            "#OOOOOOOOO#",
            "#OOOOOOOOO#",
            "###########",
        ],
    ),
    (
        "Labirinto",
        &[
            "###########",
            "#POOOOOOOO#",
            "#OOOOOOOOO#",
            "#OO#OOO#OO#",
            "#OO#OOO#OO#",
            "####OOO#OO#",
            "#OOOOOO#OO#",
            "#OOOOOO#OO#",
            "########OO#",
            "#OOOOOOOOO#",
            "#ROOOOOOOO#",
            "###########",
        ],
    ),
    (
        "Barreira",
        &[
            "#############",
            "#OOOOOOOOOOO#",
            "#OOOOOOOOOOO#",
            "#OO##OOO##OO#",
            "#OO#OOOOO#OO#",
            "#OO#OOOOO#OO#",
            "#OO#OOPOO#OO#",
            "#OO#OOOOO#OO#",
            "#OO#######OO#",
            "#OOOOOOOOOOO#",
            "#OOOOOROOOOO#",
            "#############",
        ],
    ),
];
