//! Layout parsing: raw map rows into a clean grid plus spawn coordinates.

use block_picker_core::{
    Cell, CellCoord, OPEN_GLYPH, PLAYER_GLYPH, REWARD_GLYPH, WALL_GLYPH,
};
use rand::{seq::SliceRandom, Rng};
use thiserror::Error;

/// Rectangular grid of cells fixed at load time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    columns: u32,
    rows: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Returns the cell at the provided coordinate, or `None` when out of bounds.
    #[must_use]
    pub fn cell(&self, coord: CellCoord) -> Option<Cell> {
        self.index(coord)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Reports whether the coordinate is inside the grid and open.
    #[must_use]
    pub fn is_open(&self, coord: CellCoord) -> bool {
        self.cell(coord).is_some_and(Cell::is_open)
    }

    /// Iterates open cells in row-major order.
    pub fn open_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        let columns = self.columns;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_open())
            .filter_map(move |(index, _)| {
                let index = u32::try_from(index).ok()?;
                Some(CellCoord::new(index % columns, index / columns))
            })
    }

    /// Renders the grid as layout rows, drawing `P` and `R` over open cells.
    ///
    /// Markers that fall outside the grid or on a wall are not drawn.
    #[must_use]
    pub fn render(&self, player: Option<CellCoord>, reward: Option<CellCoord>) -> Vec<String> {
        let mut rows: Vec<Vec<char>> = self
            .cells
            .chunks(self.columns.max(1) as usize)
            .map(|row| row.iter().map(|cell| cell.glyph()).collect())
            .collect();

        for (marker, glyph) in [(player, PLAYER_GLYPH), (reward, REWARD_GLYPH)] {
            let Some(coord) = marker else {
                continue;
            };
            if !self.is_open(coord) {
                continue;
            }
            if let Some(slot) = rows
                .get_mut(coord.row() as usize)
                .and_then(|row| row.get_mut(coord.column() as usize))
            {
                *slot = glyph;
            }
        }

        rows.into_iter().map(String::from_iter).collect()
    }

    fn index(&self, coord: CellCoord) -> Option<usize> {
        if coord.column() < self.columns && coord.row() < self.rows {
            let row = usize::try_from(coord.row()).ok()?;
            let column = usize::try_from(coord.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Validated layout with sentinels extracted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    grid: Grid,
    player: CellCoord,
    reward: Option<CellCoord>,
}

impl Layout {
    /// Validates raw layout rows and extracts the `P` and `R` sentinels.
    ///
    /// Sentinel cells are rewritten to open cells. Rows must share one length
    /// and only contain `#`, `O`, `P` and `R`. The layout must leave room to
    /// spawn both the player and the reward on distinct open cells.
    pub fn from_rows<S>(rows: &[S]) -> Result<Self, LayoutError>
    where
        S: AsRef<str>,
    {
        let Some(first) = rows.first() else {
            return Err(LayoutError::Empty);
        };
        let expected = first.as_ref().chars().count();

        let mut cells = Vec::with_capacity(expected * rows.len());
        let mut player = None;
        let mut reward = None;

        for (row_index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != expected {
                return Err(LayoutError::RaggedRow {
                    row: row_index,
                    expected,
                    found,
                });
            }

            for (column_index, glyph) in row.chars().enumerate() {
                let coord = coord_at(column_index, row_index)?;
                let cell = match glyph {
                    WALL_GLYPH => Cell::Wall,
                    OPEN_GLYPH => Cell::Open,
                    PLAYER_GLYPH => {
                        place_sentinel(&mut player, coord, glyph)?;
                        Cell::Open
                    }
                    REWARD_GLYPH => {
                        place_sentinel(&mut reward, coord, glyph)?;
                        Cell::Open
                    }
                    other => {
                        return Err(LayoutError::InvalidCharacter {
                            glyph: other,
                            row: row_index,
                            column: column_index,
                        })
                    }
                };
                cells.push(cell);
            }
        }

        let grid = Grid {
            columns: u32::try_from(expected).map_err(|_| LayoutError::TooLarge)?,
            rows: u32::try_from(rows.len()).map_err(|_| LayoutError::TooLarge)?,
            cells,
        };

        if grid.open_cells().next().is_none() {
            return Err(LayoutError::NoOpenCell);
        }

        let player_spawn = match player {
            Some(cell) => cell,
            None => grid
                .open_cells()
                .find(|cell| Some(*cell) != reward)
                .ok_or(LayoutError::NoSpawnRoom)?,
        };
        if reward.is_none() && !grid.open_cells().any(|cell| cell != player_spawn) {
            return Err(LayoutError::NoSpawnRoom);
        }

        Ok(Self {
            grid,
            player: player_spawn,
            reward,
        })
    }

    /// Cleaned grid with sentinels rewritten to open cells.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Derives spawn positions for a fresh game on this layout.
    ///
    /// Sentinels win. A missing player spawns on the first open cell in
    /// row-major order that is not the reward sentinel; a missing reward spawns
    /// on a uniformly random open cell other than the player's.
    pub fn spawn<R>(&self, rng: &mut R) -> ParsedLayout
    where
        R: Rng + ?Sized,
    {
        let player = self.player;
        // from_rows guarantees a second open cell whenever the reward is missing.
        let reward = self
            .reward
            .unwrap_or_else(|| random_open_cell(&self.grid, player, rng).unwrap_or(player));

        ParsedLayout {
            grid: self.grid.clone(),
            player,
            reward,
        }
    }
}

/// Result of parsing a layout: the clean grid and both spawn cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedLayout {
    /// Grid with sentinels rewritten to open cells.
    pub grid: Grid,
    /// Spawn cell of the player.
    pub player: CellCoord,
    /// Spawn cell of the reward.
    pub reward: CellCoord,
}

/// Parses raw layout rows into a grid and spawn coordinates in one step.
pub fn parse<S, R>(rows: &[S], rng: &mut R) -> Result<ParsedLayout, LayoutError>
where
    S: AsRef<str>,
    R: Rng + ?Sized,
{
    Layout::from_rows(rows).map(|layout| layout.spawn(rng))
}

/// Picks a uniformly random open cell that differs from `avoid`.
pub fn random_open_cell<R>(grid: &Grid, avoid: CellCoord, rng: &mut R) -> Option<CellCoord>
where
    R: Rng + ?Sized,
{
    let candidates: Vec<CellCoord> = grid.open_cells().filter(|cell| *cell != avoid).collect();
    candidates.choose(rng).copied()
}

/// Reasons a layout fails validation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The layout contains no rows.
    #[error("layout has no rows")]
    Empty,
    /// A row length differs from the first row.
    #[error("row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// A character outside `#`, `O`, `P`, `R` was found.
    #[error("unexpected character {glyph:?} at row {row}, column {column}")]
    InvalidCharacter {
        /// The offending character.
        glyph: char,
        /// Zero-based row index.
        row: usize,
        /// Zero-based column index.
        column: usize,
    },
    /// A sentinel occurs more than once.
    #[error("sentinel {glyph:?} appears more than once (again at {at})")]
    DuplicateSentinel {
        /// The repeated sentinel.
        glyph: char,
        /// Position of the repeated occurrence.
        at: CellCoord,
    },
    /// The layout has no open cell.
    #[error("layout has no open cell")]
    NoOpenCell,
    /// A missing sentinel cannot be placed on a distinct open cell.
    #[error("layout has no room to spawn the player and the reward on distinct cells")]
    NoSpawnRoom,
    /// The layout dimensions overflow the coordinate space.
    #[error("layout is too large")]
    TooLarge,
}

fn coord_at(column: usize, row: usize) -> Result<CellCoord, LayoutError> {
    let column = u32::try_from(column).map_err(|_| LayoutError::TooLarge)?;
    let row = u32::try_from(row).map_err(|_| LayoutError::TooLarge)?;
    Ok(CellCoord::new(column, row))
}

fn place_sentinel(
    slot: &mut Option<CellCoord>,
    coord: CellCoord,
    glyph: char,
) -> Result<(), LayoutError> {
    if slot.is_some() {
        return Err(LayoutError::DuplicateSentinel { glyph, at: coord });
    }
    *slot = Some(coord);
    Ok(())
}
