#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative game state management for Block Picker.

pub mod catalog;
pub mod layout;

use block_picker_core::{CellCoord, Command, Direction, Event, GameStatus, StartRejection};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use crate::{catalog::MapCatalog, layout::Grid};

/// Result of a movement request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The player advanced one cell.
    Moved {
        /// Cell occupied before the move.
        from: CellCoord,
        /// Cell occupied after the move.
        to: CellCoord,
    },
    /// The target cell is a wall or outside the grid.
    Blocked,
    /// Movement is not accepted in the current status.
    Ignored,
}

/// A reward capture produced by [`GameState::update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capture {
    /// Cell where the player met the reward.
    pub cell: CellCoord,
    /// Score after the capture was counted.
    pub score: u32,
}

/// Errors reported by game state operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    /// The requested map index is outside the catalog.
    #[error("map index {index} is outside the catalog of {len} maps")]
    UnknownMap {
        /// Requested index.
        index: usize,
        /// Number of maps in the catalog.
        len: usize,
    },
    /// A transition was requested outside the reward screen.
    #[error("cannot begin a transition while {status:?}")]
    InvalidTransition {
        /// Status at the time of the request.
        status: GameStatus,
    },
}

/// Represents the authoritative Block Picker game state.
#[derive(Debug)]
pub struct GameState {
    catalog: MapCatalog,
    map_index: usize,
    grid: Grid,
    player: CellCoord,
    reward: CellCoord,
    score: u32,
    status: GameStatus,
    pending_move: Option<Direction>,
    rng: ChaCha8Rng,
}

impl GameState {
    /// Creates a game on the provided map, seeding placement from the OS.
    pub fn new(catalog: MapCatalog, map_index: usize) -> Result<Self, GameError> {
        Self::with_rng(catalog, map_index, ChaCha8Rng::from_entropy())
    }

    /// Creates a game on the provided map with an explicit random source.
    pub fn with_rng(
        catalog: MapCatalog,
        map_index: usize,
        mut rng: ChaCha8Rng,
    ) -> Result<Self, GameError> {
        let len = catalog.len();
        let definition = catalog
            .get(map_index)
            .ok_or(GameError::UnknownMap {
                index: map_index,
                len,
            })?;
        let parsed = definition.layout().spawn(&mut rng);
        Ok(Self {
            catalog,
            map_index,
            grid: parsed.grid,
            player: parsed.player,
            reward: parsed.reward,
            score: 0,
            status: GameStatus::NotStarted,
            pending_move: None,
            rng,
        })
    }

    /// Moves the player one cell if the game is running and the cell is open.
    pub fn move_player(&mut self, direction: Direction) -> MoveOutcome {
        if !self.status.accepts_movement() {
            return MoveOutcome::Ignored;
        }

        let from = self.player;
        match from.step(direction) {
            Some(to) if self.grid.is_open(to) => {
                self.player = to;
                MoveOutcome::Moved { from, to }
            }
            _ => MoveOutcome::Blocked,
        }
    }

    /// Stores a move for the next tick, returning the move it replaced.
    pub fn queue_move(&mut self, direction: Direction) -> Option<Direction> {
        self.pending_move.replace(direction)
    }

    /// Clears the pending slot and applies its move, if any.
    pub fn apply_pending_move(&mut self) -> Option<MoveOutcome> {
        self.pending_move
            .take()
            .map(|direction| self.move_player(direction))
    }

    /// Counts a capture when the running player stands on the reward.
    pub fn update(&mut self) -> Option<Capture> {
        if self.status != GameStatus::Playing || self.player != self.reward {
            return None;
        }

        self.score = self.score.saturating_add(1);
        self.status = GameStatus::RewardReached;
        Some(Capture {
            cell: self.player,
            score: self.score,
        })
    }

    /// Reloads the map at `map_index` with fresh spawns, zero score and the
    /// title-screen status.
    pub fn reset(&mut self, map_index: usize) -> Result<(), GameError> {
        let len = self.catalog.len();
        let definition = self
            .catalog
            .get(map_index)
            .ok_or(GameError::UnknownMap {
                index: map_index,
                len,
            })?;
        let parsed = definition.layout().spawn(&mut self.rng);

        self.map_index = map_index;
        self.grid = parsed.grid;
        self.player = parsed.player;
        self.reward = parsed.reward;
        self.score = 0;
        self.status = GameStatus::NotStarted;
        self.pending_move = None;
        Ok(())
    }

    /// Enables movement from the title or reward screen.
    pub fn start(&mut self) -> Result<(), StartRejection> {
        match self.status {
            GameStatus::NotStarted | GameStatus::RewardReached => {
                self.status = GameStatus::Playing;
                Ok(())
            }
            GameStatus::Playing => Err(StartRejection::AlreadyPlaying),
            GameStatus::Transitioning => Err(StartRejection::Transitioning),
        }
    }

    /// Enters the sequential-mode dwell; only valid on the reward screen.
    pub fn begin_transition(&mut self) -> Result<(), GameError> {
        if self.status != GameStatus::RewardReached {
            return Err(GameError::InvalidTransition {
                status: self.status,
            });
        }
        self.status = GameStatus::Transitioning;
        Ok(())
    }

    /// Moves the reward to a uniformly random open cell other than the player's.
    ///
    /// Returns the new reward cell.
    pub fn relocate_reward(&mut self) -> CellCoord {
        if let Some(cell) = layout::random_open_cell(&self.grid, self.player, &mut self.rng) {
            self.reward = cell;
        }
        self.reward
    }

    /// Catalog the game draws its maps from.
    #[must_use]
    pub fn catalog(&self) -> &MapCatalog {
        &self.catalog
    }

    /// Catalog index of the loaded map.
    #[must_use]
    pub const fn map_index(&self) -> usize {
        self.map_index
    }

    /// Cleaned grid of the loaded map.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Player cell.
    #[must_use]
    pub const fn player(&self) -> CellCoord {
        self.player
    }

    /// Reward cell.
    #[must_use]
    pub const fn reward(&self) -> CellCoord {
        self.reward
    }

    /// Captures counted since the last reset.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Lifecycle status.
    #[must_use]
    pub const fn status(&self) -> GameStatus {
        self.status
    }

    /// Move waiting for the next tick.
    #[must_use]
    pub const fn pending_move(&self) -> Option<Direction> {
        self.pending_move
    }
}

/// Applies the provided command to the game, broadcasting resulting events.
pub fn apply(state: &mut GameState, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::MovePlayer { direction } => {
            push_move(state.move_player(direction), out_events);
        }
        Command::QueueMove { direction } => {
            let _ = state.queue_move(direction);
        }
        Command::ApplyPendingMove => {
            if let Some(outcome) = state.apply_pending_move() {
                push_move(outcome, out_events);
            }
        }
        Command::Update => {
            if let Some(capture) = state.update() {
                out_events.push(Event::RewardCaptured {
                    cell: capture.cell,
                    score: capture.score,
                });
                out_events.push(Event::StatusChanged {
                    from: GameStatus::Playing,
                    to: GameStatus::RewardReached,
                });
            }
        }
        Command::Reset { map_index } => {
            let before = state.status();
            match state.reset(map_index) {
                Ok(()) => {
                    out_events.push(Event::MapLoaded {
                        map_index,
                        player: state.player(),
                        reward: state.reward(),
                    });
                    push_status_change(before, state.status(), out_events);
                }
                Err(_) => out_events.push(Event::ResetRejected { map_index }),
            }
        }
        Command::Start => {
            let before = state.status();
            match state.start() {
                Ok(()) => push_status_change(before, state.status(), out_events),
                Err(reason) => out_events.push(Event::StartRejected { reason }),
            }
        }
        Command::BeginTransition => {
            let before = state.status();
            match state.begin_transition() {
                Ok(()) => push_status_change(before, state.status(), out_events),
                Err(_) => out_events.push(Event::TransitionRejected { status: before }),
            }
        }
        Command::RelocateReward => {
            let from = state.reward();
            let to = state.relocate_reward();
            if from != to {
                out_events.push(Event::RewardRelocated { from, to });
            }
        }
    }
}

fn push_move(outcome: MoveOutcome, out_events: &mut Vec<Event>) {
    if let MoveOutcome::Moved { from, to } = outcome {
        out_events.push(Event::PlayerMoved { from, to });
    }
}

fn push_status_change(from: GameStatus, to: GameStatus, out_events: &mut Vec<Event>) {
    if from != to {
        out_events.push(Event::StatusChanged { from, to });
    }
}

/// Query functions that provide read-only access to the game state.
pub mod query {
    use super::GameState;

    /// Display name of the loaded map.
    #[must_use]
    pub fn map_name(state: &GameState) -> &str {
        state
            .catalog()
            .get(state.map_index())
            .map_or("", |definition| definition.name())
    }

    /// Grid rows with the player and reward drawn in as `P` and `R`.
    #[must_use]
    pub fn rendered_rows(state: &GameState) -> Vec<String> {
        state
            .grid()
            .render(Some(state.player()), Some(state.reward()))
    }

    /// Names of every map in catalog order.
    #[must_use]
    pub fn map_names(state: &GameState) -> Vec<&str> {
        state
            .catalog()
            .iter()
            .map(|definition| definition.name())
            .collect()
    }
}
