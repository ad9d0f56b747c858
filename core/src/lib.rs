#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Block Picker engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative game state, and the progression system. Callers submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that the progression controller reacts to. Adapters never touch the game
//! state directly; they read [`GameSnapshot`] values instead.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner shown on the title screen.
pub const WELCOME_BANNER: &str = "Block Picker Game";

/// Number of simulation ticks executed per second by the driving loop.
pub const TICKS_PER_SECOND: u32 = 10;

/// Pause between capturing a reward and loading the next map in sequential mode.
pub const TRANSITION_DWELL: Duration = Duration::from_millis(3000);

/// Single cell of a map grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Impassable cell.
    Wall,
    /// Cell the player and the reward may occupy.
    Open,
}

impl Cell {
    /// Layout character used to describe the cell.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Wall => WALL_GLYPH,
            Self::Open => OPEN_GLYPH,
        }
    }

    /// Reports whether the player or reward may occupy the cell.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Layout character for a wall cell.
pub const WALL_GLYPH: char = '#';
/// Layout character for an open cell.
pub const OPEN_GLYPH: char = 'O';
/// Layout character marking the player.
pub const PLAYER_GLYPH: char = 'P';
/// Layout character marking the reward.
pub const REWARD_GLYPH: char = 'R';

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell, growing to the right.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell, growing downward.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Returns the neighbouring cell in the provided direction.
    ///
    /// Yields `None` when the step would leave the non-negative quadrant; upper
    /// bounds are the grid's responsibility.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        let (dx, dy) = direction.offset();
        let column = self.column.checked_add_signed(dx)?;
        let row = self.row.checked_add_signed(dy)?;
        Some(CellCoord::new(column, row))
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Cardinal movement directions available to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Movement toward decreasing row indices.
    Up,
    /// Movement toward increasing row indices.
    Down,
    /// Movement toward decreasing column indices.
    Left,
    /// Movement toward increasing column indices.
    Right,
}

impl Direction {
    /// Every direction in a stable order.
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Unit vector `(dx, dy)` of the direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Lowercase name accepted by [`Direction::from_str`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = DirectionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(DirectionParseError {
                input: other.to_owned(),
            }),
        }
    }
}

/// Reports an unrecognised direction string.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("Invalid direction. Use: up, down, left, right.")]
pub struct DirectionParseError {
    input: String,
}

impl DirectionParseError {
    /// The rejected input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// Lifecycle status of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Title screen; the map is loaded but play has not begun.
    NotStarted,
    /// The player may move.
    Playing,
    /// The reward was captured and the game waits for a restart.
    RewardReached,
    /// Sequential mode dwell between maps.
    Transitioning,
}

impl GameStatus {
    /// Reports whether movement input is honoured in this status.
    #[must_use]
    pub const fn accepts_movement(self) -> bool {
        matches!(self, Self::Playing)
    }
}

/// Reaction to a reward capture outside sequential mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// Halt on the reward screen until an explicit restart.
    #[default]
    ManualRestart,
    /// Relocate the reward and keep playing.
    Relocate,
}

/// Commands that express all permissible game state mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Moves the player one cell immediately.
    MovePlayer {
        /// Direction of the attempted step.
        direction: Direction,
    },
    /// Stores a move in the pending slot, replacing any unconsumed move.
    QueueMove {
        /// Direction of the deferred step.
        direction: Direction,
    },
    /// Applies and clears the pending move, if any.
    ApplyPendingMove,
    /// Resolves a capture when the player stands on the reward.
    Update,
    /// Reloads the map at the provided catalog index.
    Reset {
        /// Catalog index of the map to load.
        map_index: usize,
    },
    /// Enables movement from the title or reward screen.
    Start,
    /// Enters the sequential-mode dwell after a capture.
    BeginTransition,
    /// Moves the reward to a new random open cell.
    RelocateReward,
}

/// Events broadcast by the game state after processing commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that the player moved between two cells.
    PlayerMoved {
        /// Cell occupied before the move.
        from: CellCoord,
        /// Cell occupied after the move.
        to: CellCoord,
    },
    /// Announces that the player reached the reward.
    RewardCaptured {
        /// Cell where the capture happened.
        cell: CellCoord,
        /// Score after the capture was counted.
        score: u32,
    },
    /// Confirms that the reward moved to a new cell.
    RewardRelocated {
        /// Previous reward cell.
        from: CellCoord,
        /// New reward cell.
        to: CellCoord,
    },
    /// Announces a lifecycle status change.
    StatusChanged {
        /// Status before the change.
        from: GameStatus,
        /// Status after the change.
        to: GameStatus,
    },
    /// Confirms that a map was (re)loaded.
    MapLoaded {
        /// Catalog index of the loaded map.
        map_index: usize,
        /// Spawn cell of the player.
        player: CellCoord,
        /// Spawn cell of the reward.
        reward: CellCoord,
    },
    /// Reports that a start request was rejected.
    StartRejected {
        /// Reason the request failed.
        reason: StartRejection,
    },
    /// Reports that a reset named a map outside the catalog.
    ResetRejected {
        /// Requested catalog index.
        map_index: usize,
    },
    /// Reports that a transition was requested outside the reward screen.
    TransitionRejected {
        /// Status at the time of the request.
        status: GameStatus,
    },
}

/// Reasons a start request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum StartRejection {
    /// The game is already being played.
    #[error(
        "The game is already in progress. Starting is only possible from the title screen or after claiming the reward."
    )]
    AlreadyPlaying,
    /// The sequential dwell is running.
    #[error("The next map is loading. Wait for the transition to finish.")]
    Transitioning,
}

/// Immutable view of the game published to adapters once per tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Catalog index of the active map.
    pub map_index: usize,
    /// Display name of the active map.
    pub map_name: String,
    /// Number of maps in the catalog.
    pub catalog_len: usize,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Captures counted since the last reset.
    pub score: u32,
    /// Player cell.
    pub player: CellCoord,
    /// Reward cell.
    pub reward: CellCoord,
    /// Grid rows with `P` and `R` drawn in.
    pub rows: Vec<String>,
    /// Whether sequential mode is enabled.
    pub sequential: bool,
    /// Whether the final map of the catalog was just completed.
    pub all_maps_completed: bool,
    /// Remaining dwell while transitioning.
    pub transition_remaining: Option<Duration>,
}
