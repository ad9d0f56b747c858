#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Progression system that owns the game state and advances through the map
//! catalog.
//!
//! The controller is the only mutator of [`GameState`]. Each tick it applies
//! the pending move, resolves captures, and reacts to the resulting events:
//! outside sequential mode a capture halts on the reward screen (or relocates
//! the reward in [`CaptureMode::Relocate`]); in sequential mode it starts a
//! timed transition that loads the next map or, after the final map, returns to
//! the title screen on the first map.

use std::time::{Duration, Instant};

use block_picker_core::{
    CaptureMode, Command, Direction, Event, GameSnapshot, GameStatus, StartRejection,
    TRANSITION_DWELL,
};
use block_picker_world::{self as world, query, GameState, MoveOutcome};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Configuration parameters required to construct the progression system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    sequential: bool,
    capture_mode: CaptureMode,
    dwell: Duration,
}

impl Config {
    /// Creates a configuration with an explicit mode, capture reaction and dwell.
    #[must_use]
    pub const fn new(sequential: bool, capture_mode: CaptureMode, dwell: Duration) -> Self {
        Self {
            sequential,
            capture_mode,
            dwell,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(false, CaptureMode::ManualRestart, TRANSITION_DWELL)
    }
}

/// Catalog position and completion tracking for sequential mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgressionState {
    current_map_index: usize,
    all_maps_completed: bool,
    transition_started_at: Option<Instant>,
}

impl ProgressionState {
    /// Catalog index of the active map.
    #[must_use]
    pub const fn current_map_index(&self) -> usize {
        self.current_map_index
    }

    /// Set when the final map's reward is captured, cleared on wrap-around.
    #[must_use]
    pub const fn all_maps_completed(&self) -> bool {
        self.all_maps_completed
    }

    /// Instant the running transition began.
    #[must_use]
    pub const fn transition_started_at(&self) -> Option<Instant> {
        self.transition_started_at
    }
}

/// Errors reported by progression menu operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ProgressionError {
    /// The requested map index is outside the catalog.
    #[error("map index {index} is outside the catalog of {len} maps")]
    UnknownMap {
        /// Requested index.
        index: usize,
        /// Number of maps in the catalog.
        len: usize,
    },
    /// The map menu is only available on the title and reward screens.
    #[error("the map menu is unavailable while {status:?}")]
    MenuLocked {
        /// Status at the time of the request.
        status: GameStatus,
    },
}

/// Owns the game state and drives catalog progression.
#[derive(Debug)]
pub struct ProgressionController {
    state: GameState,
    config: Config,
    progression: ProgressionState,
    scratch: Vec<Event>,
}

impl ProgressionController {
    /// Creates a controller and loads the first map of the state's catalog.
    #[must_use]
    pub fn new(mut state: GameState, config: Config) -> Self {
        let mut scratch = Vec::new();
        world::apply(&mut state, Command::Reset { map_index: 0 }, &mut scratch);
        scratch.clear();
        Self {
            state,
            config,
            progression: ProgressionState::default(),
            scratch,
        }
    }

    /// Advances the game by one tick.
    ///
    /// While transitioning only the dwell is polled. While playing the pending
    /// move is applied and a capture, if any, is resolved according to the
    /// configured mode. Every event produced is appended to `out_events`.
    pub fn tick(&mut self, now: Instant, out_events: &mut Vec<Event>) {
        if self.state.status() == GameStatus::Transitioning {
            self.poll_transition(now, out_events);
            return;
        }

        self.scratch.clear();
        world::apply(&mut self.state, Command::ApplyPendingMove, &mut self.scratch);
        world::apply(&mut self.state, Command::Update, &mut self.scratch);

        let captured = self
            .scratch
            .iter()
            .any(|event| matches!(event, Event::RewardCaptured { .. }));
        out_events.append(&mut self.scratch);

        if captured {
            self.handle_capture(now, out_events);
        }
    }

    /// Stores a move to apply on the next tick, replacing any unconsumed move.
    pub fn queue_move(&mut self, direction: Direction) {
        if let Some(replaced) = self.state.queue_move(direction) {
            debug!(%replaced, %direction, "pending move superseded");
        }
    }

    /// Applies direct keyboard input immediately.
    pub fn move_player(&mut self, direction: Direction) -> MoveOutcome {
        self.state.move_player(direction)
    }

    /// Restarts the active map and begins play.
    ///
    /// Rejected while a game is running or a transition is in progress.
    pub fn start_game(&mut self) -> Result<(), StartRejection> {
        match self.state.status() {
            GameStatus::Playing => return Err(StartRejection::AlreadyPlaying),
            GameStatus::Transitioning => return Err(StartRejection::Transitioning),
            GameStatus::NotStarted | GameStatus::RewardReached => {}
        }

        self.load_map(self.progression.current_map_index);
        self.state.start()?;
        info!(
            map_index = self.progression.current_map_index,
            map = query::map_name(&self.state),
            "game started"
        );
        Ok(())
    }

    /// Chooses the map the next game starts on.
    pub fn select_map(&mut self, index: usize) -> Result<(), ProgressionError> {
        self.ensure_menu_available()?;
        let len = self.state.catalog().len();
        if index >= len {
            return Err(ProgressionError::UnknownMap { index, len });
        }

        self.progression.current_map_index = index;
        self.progression.all_maps_completed = false;
        self.load_map(index);
        info!(map_index = index, map = query::map_name(&self.state), "map selected");
        Ok(())
    }

    /// Enables or disables sequential mode.
    pub fn set_sequential(&mut self, sequential: bool) -> Result<(), ProgressionError> {
        self.ensure_menu_available()?;
        self.config.sequential = sequential;
        info!(sequential, "sequential mode toggled");
        Ok(())
    }

    /// Abandons the current run and returns to the title screen on the first
    /// map.
    pub fn return_to_title(&mut self) {
        self.progression = ProgressionState::default();
        self.load_map(0);
        info!("returned to the title screen");
    }

    /// Read-only access to the owned game state.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Catalog position and completion tracking.
    #[must_use]
    pub const fn progression(&self) -> &ProgressionState {
        &self.progression
    }

    /// Dwell left before the running transition resolves.
    #[must_use]
    pub fn transition_remaining(&self, now: Instant) -> Option<Duration> {
        if self.state.status() != GameStatus::Transitioning {
            return None;
        }
        let started = self.progression.transition_started_at?;
        Some(
            self.config
                .dwell
                .saturating_sub(now.saturating_duration_since(started)),
        )
    }

    /// Captures an immutable snapshot for adapters.
    #[must_use]
    pub fn snapshot(&self, now: Instant) -> GameSnapshot {
        GameSnapshot {
            map_index: self.state.map_index(),
            map_name: query::map_name(&self.state).to_owned(),
            catalog_len: self.state.catalog().len(),
            status: self.state.status(),
            score: self.state.score(),
            player: self.state.player(),
            reward: self.state.reward(),
            rows: query::rendered_rows(&self.state),
            sequential: self.config.sequential,
            all_maps_completed: self.progression.all_maps_completed,
            transition_remaining: self.transition_remaining(now),
        }
    }

    fn handle_capture(&mut self, now: Instant, out_events: &mut Vec<Event>) {
        let map_index = self.progression.current_map_index;
        info!(map_index, score = self.state.score(), "reward captured");

        if self.config.sequential {
            world::apply(&mut self.state, Command::BeginTransition, out_events);
            self.progression.transition_started_at = Some(now);
            if map_index == self.state.catalog().last_index() {
                self.progression.all_maps_completed = true;
                info!("all maps completed");
            }
            return;
        }

        if self.config.capture_mode == CaptureMode::Relocate {
            world::apply(&mut self.state, Command::RelocateReward, out_events);
            world::apply(&mut self.state, Command::Start, out_events);
        }
    }

    fn poll_transition(&mut self, now: Instant, out_events: &mut Vec<Event>) {
        let Some(started) = self.progression.transition_started_at else {
            warn!("transition without a start time; resolving immediately");
            self.advance(out_events);
            return;
        };
        if now.saturating_duration_since(started) < self.config.dwell {
            return;
        }
        self.advance(out_events);
    }

    fn advance(&mut self, out_events: &mut Vec<Event>) {
        self.progression.transition_started_at = None;

        if self.progression.all_maps_completed {
            self.wrap_to_first_map(out_events);
            return;
        }

        let next = self.progression.current_map_index + 1;
        if next >= self.state.catalog().len() {
            warn!(next, "map index passed the catalog without completion; wrapping");
            self.wrap_to_first_map(out_events);
            return;
        }

        self.progression.current_map_index = next;
        world::apply(&mut self.state, Command::Reset { map_index: next }, out_events);
        world::apply(&mut self.state, Command::Start, out_events);
        info!(map_index = next, map = query::map_name(&self.state), "advanced to next map");
    }

    fn wrap_to_first_map(&mut self, out_events: &mut Vec<Event>) {
        self.progression.all_maps_completed = false;
        self.progression.current_map_index = 0;
        world::apply(&mut self.state, Command::Reset { map_index: 0 }, out_events);
        info!("catalog finished; back to the title screen");
    }

    fn load_map(&mut self, index: usize) {
        self.scratch.clear();
        world::apply(&mut self.state, Command::Reset { map_index: index }, &mut self.scratch);
        self.scratch.clear();
    }

    fn ensure_menu_available(&self) -> Result<(), ProgressionError> {
        match self.state.status() {
            GameStatus::NotStarted | GameStatus::RewardReached => Ok(()),
            status => Err(ProgressionError::MenuLocked { status }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use block_picker_world::catalog::MapCatalog;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn controller(config: Config) -> ProgressionController {
        let catalog = MapCatalog::from_layouts([("One", ["PR"]), ("Two", ["RP"])])
            .expect("valid catalog");
        let state = GameState::with_rng(catalog, 1, ChaCha8Rng::seed_from_u64(3))
            .expect("map exists");
        ProgressionController::new(state, config)
    }

    #[test]
    fn new_loads_first_map() {
        let controller = controller(Config::default());
        assert_eq!(controller.state().map_index(), 0);
        assert_eq!(controller.progression().current_map_index(), 0);
        assert_eq!(controller.state().status(), GameStatus::NotStarted);
    }

    #[test]
    fn transition_remaining_counts_down() {
        let mut controller = controller(Config::new(
            true,
            CaptureMode::ManualRestart,
            Duration::from_secs(3),
        ));
        let start = Instant::now();
        controller.start_game().expect("title screen starts");
        controller.queue_move(Direction::Right);
        let mut events = Vec::new();
        controller.tick(start, &mut events);

        assert_eq!(
            controller.transition_remaining(start + Duration::from_secs(1)),
            Some(Duration::from_secs(2))
        );
        assert_eq!(
            controller.transition_remaining(start + Duration::from_secs(5)),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn index_past_catalog_without_completion_wraps() {
        let mut controller = controller(Config::new(
            true,
            CaptureMode::ManualRestart,
            Duration::ZERO,
        ));
        controller.select_map(1).expect("title screen menu");
        controller.start_game().expect("title screen starts");
        controller.queue_move(Direction::Left);
        let now = Instant::now();
        let mut events = Vec::new();
        controller.tick(now, &mut events);
        assert!(controller.progression.all_maps_completed);

        controller.progression.all_maps_completed = false;
        controller.tick(now, &mut events);

        assert_eq!(controller.progression.current_map_index, 0);
        assert!(!controller.progression.all_maps_completed);
        assert_eq!(controller.state.status(), GameStatus::NotStarted);
    }

    #[test]
    fn menu_is_locked_while_playing() {
        let mut controller = controller(Config::default());
        controller.start_game().expect("title screen starts");

        assert_eq!(
            controller.select_map(1),
            Err(ProgressionError::MenuLocked {
                status: GameStatus::Playing,
            })
        );
        assert_eq!(
            controller.set_sequential(true),
            Err(ProgressionError::MenuLocked {
                status: GameStatus::Playing,
            })
        );
    }
}
