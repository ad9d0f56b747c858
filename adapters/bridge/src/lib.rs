#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Relay between an external command interface and the tick loop.
//!
//! The external interface runs on its own thread and only ever touches a
//! shared [`CommandBridge`]. Moves land in a single pending slot with
//! last-write-wins semantics, start requests are latched, and queries read the
//! snapshot the tick loop published most recently. Nothing here waits for a
//! tick.

pub mod commands;

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU8, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Instant,
};

use block_picker_core::{Direction, Event, GameSnapshot, GameStatus, StartRejection};
use block_picker_system_progression::ProgressionController;
use thiserror::Error;
use tracing::{debug, warn};

const EMPTY_SLOT: u8 = 0;

/// Single-slot pending move with atomic swap semantics.
#[derive(Debug, Default)]
pub struct PendingMoveSlot {
    slot: AtomicU8,
}

impl PendingMoveSlot {
    /// Stores a move, returning the unconsumed move it replaced.
    pub fn set(&self, direction: Direction) -> Option<Direction> {
        decode(self.slot.swap(encode(direction), Ordering::AcqRel))
    }

    /// Reads and clears the slot in one step.
    pub fn take(&self) -> Option<Direction> {
        decode(self.slot.swap(EMPTY_SLOT, Ordering::AcqRel))
    }

    /// Reads the slot without clearing it.
    #[must_use]
    pub fn peek(&self) -> Option<Direction> {
        decode(self.slot.load(Ordering::Acquire))
    }
}

fn encode(direction: Direction) -> u8 {
    match direction {
        Direction::Up => 1,
        Direction::Down => 2,
        Direction::Left => 3,
        Direction::Right => 4,
    }
}

fn decode(value: u8) -> Option<Direction> {
    match value {
        1 => Some(Direction::Up),
        2 => Some(Direction::Down),
        3 => Some(Direction::Left),
        4 => Some(Direction::Right),
        _ => None,
    }
}

/// Reasons a map query cannot return a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MapQueryError {
    /// The title screen is showing.
    #[error("The game has not started yet. Use the start command to begin.")]
    NotStarted,
    /// The reward was just claimed.
    #[error("Congratulations! You claimed the reward. Use start to play again.")]
    RewardClaimed,
}

/// Shared relay between the command interface and the tick loop.
#[derive(Debug)]
pub struct CommandBridge {
    pending_move: PendingMoveSlot,
    start_requested: AtomicBool,
    snapshot: Mutex<Arc<GameSnapshot>>,
}

impl CommandBridge {
    /// Creates a bridge seeded with the initial snapshot.
    #[must_use]
    pub fn new(initial: GameSnapshot) -> Self {
        Self {
            pending_move: PendingMoveSlot::default(),
            start_requested: AtomicBool::new(false),
            snapshot: Mutex::new(Arc::new(initial)),
        }
    }

    /// Stores a move for the next tick; later calls overwrite earlier ones.
    pub fn set_move(&self, direction: Direction) -> Option<Direction> {
        let replaced = self.pending_move.set(direction);
        if let Some(replaced) = replaced {
            debug!(%replaced, %direction, "unconsumed move superseded");
        }
        replaced
    }

    /// Reads and clears the pending move; called once per tick.
    pub fn consume_pending_move(&self) -> Option<Direction> {
        self.pending_move.take()
    }

    /// Move waiting for the next tick, if any.
    #[must_use]
    pub fn pending_move(&self) -> Option<Direction> {
        self.pending_move.peek()
    }

    /// Latches a start request unless the last snapshot shows a running game
    /// or transition.
    ///
    /// A latched but unconsumed request counts as a running game, so only the
    /// first of several starts sent between two ticks is accepted.
    pub fn request_start(&self) -> Result<(), StartRejection> {
        if self.start_requested.swap(true, Ordering::AcqRel) {
            return Err(StartRejection::AlreadyPlaying);
        }

        let rejection = match self.snapshot().status {
            GameStatus::Playing => StartRejection::AlreadyPlaying,
            GameStatus::Transitioning => StartRejection::Transitioning,
            GameStatus::NotStarted | GameStatus::RewardReached => return Ok(()),
        };
        self.start_requested.store(false, Ordering::Release);
        Err(rejection)
    }

    /// Whether a start request is latched.
    #[must_use]
    pub fn start_requested(&self) -> bool {
        self.start_requested.load(Ordering::Acquire)
    }

    /// Clears the start latch; called once the tick that honoured it has
    /// published its snapshot.
    pub fn clear_start_request(&self) {
        self.start_requested.store(false, Ordering::Release);
    }

    /// Replaces the published snapshot.
    pub fn publish(&self, snapshot: GameSnapshot) {
        let snapshot = Arc::new(snapshot);
        let mut guard = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = snapshot;
    }

    /// Most recently published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<GameSnapshot> {
        let guard = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Current score.
    #[must_use]
    pub fn query_score(&self) -> u32 {
        self.snapshot().score
    }

    /// Grid rows with `P` and `R` drawn in, when a game is running.
    pub fn query_map(&self) -> Result<Vec<String>, MapQueryError> {
        let snapshot = self.snapshot();
        match snapshot.status {
            GameStatus::NotStarted => Err(MapQueryError::NotStarted),
            GameStatus::RewardReached | GameStatus::Transitioning => {
                Err(MapQueryError::RewardClaimed)
            }
            GameStatus::Playing => Ok(snapshot.rows.clone()),
        }
    }
}

/// Runs one tick of the driving loop against the bridge.
///
/// Honours the start latch and the pending move, advances the controller,
/// publishes the resulting snapshot, then releases the latch.
pub fn pump(
    bridge: &CommandBridge,
    controller: &mut ProgressionController,
    now: Instant,
    out_events: &mut Vec<Event>,
) {
    let start_requested = bridge.start_requested();
    if start_requested {
        if let Err(reason) = controller.start_game() {
            warn!(%reason, "latched start request rejected");
        }
    }

    if let Some(direction) = bridge.consume_pending_move() {
        controller.queue_move(direction);
    }

    controller.tick(now, out_events);
    bridge.publish(controller.snapshot(now));

    // Cleared only after publishing, so a start racing this tick sees either
    // the latch or the running game.
    if start_requested {
        bridge.clear_start_request();
    }
}
