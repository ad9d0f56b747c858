use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use block_picker_bridge::{
    commands::{respond, CommandReply},
    pump, CommandBridge, MapQueryError,
};
use block_picker_core::{CaptureMode, Direction, Event, GameStatus, StartRejection};
use block_picker_system_progression::{Config, ProgressionController};
use block_picker_world::{catalog::MapCatalog, GameState};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const TICK: Duration = Duration::from_millis(100);

fn harness(sequential: bool) -> (CommandBridge, ProgressionController) {
    harness_with(sequential, CaptureMode::ManualRestart)
}

fn harness_with(
    sequential: bool,
    capture_mode: CaptureMode,
) -> (CommandBridge, ProgressionController) {
    let catalog =
        MapCatalog::from_layouts([("Corridor", vec!["#OPOOOOOOR#"]), ("Short", vec!["#PR#"])])
            .expect("valid catalog");
    let state =
        GameState::with_rng(catalog, 0, ChaCha8Rng::seed_from_u64(7)).expect("map exists");
    let controller = ProgressionController::new(
        state,
        Config::new(sequential, capture_mode, Duration::from_secs(3)),
    );
    let bridge = CommandBridge::new(controller.snapshot(Instant::now()));
    (bridge, controller)
}

fn ok(message: &str) -> CommandReply {
    CommandReply {
        ok: true,
        message: message.to_owned(),
    }
}

fn rejected(message: &str) -> CommandReply {
    CommandReply {
        ok: false,
        message: message.to_owned(),
    }
}

#[test]
fn concurrent_writers_leave_exactly_one_move() {
    let bridge = Arc::new(harness(false).0);

    let writers: Vec<_> = Direction::ALL
        .into_iter()
        .map(|direction| {
            let bridge = Arc::clone(&bridge);
            thread::spawn(move || {
                for _ in 0..1_000 {
                    let _ = bridge.set_move(direction);
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().expect("writer thread");
    }

    let survivor = bridge.consume_pending_move();
    assert!(survivor.is_some());
    assert_eq!(bridge.consume_pending_move(), None);
}

#[test]
fn only_the_last_move_before_a_tick_is_applied() {
    let (bridge, mut controller) = harness(false);
    let mut events = Vec::new();
    assert_eq!(respond(&bridge, "start"), ok("Game started!"));
    pump(&bridge, &mut controller, Instant::now(), &mut events);

    assert_eq!(respond(&bridge, "move left"), ok("Moving left"));
    assert_eq!(respond(&bridge, "move right"), ok("Moving right"));
    events.clear();
    pump(&bridge, &mut controller, Instant::now() + TICK, &mut events);

    let moves: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, Event::PlayerMoved { .. }))
        .collect();
    assert_eq!(moves.len(), 1);
    assert_eq!(bridge.snapshot().player.column(), 3);
}

#[test]
fn map_query_depends_on_status() {
    let (bridge, mut controller) = harness(false);
    assert_eq!(bridge.query_map(), Err(MapQueryError::NotStarted));
    assert_eq!(
        respond(&bridge, "get_map"),
        rejected("The game has not started yet. Use the start command to begin.")
    );

    bridge.request_start().expect("title screen accepts start");
    let mut events = Vec::new();
    let mut now = Instant::now();
    pump(&bridge, &mut controller, now, &mut events);
    assert_eq!(respond(&bridge, "get_map"), ok("#OPOOOOOOR#"));

    for _ in 0..7 {
        now += TICK;
        let _ = bridge.set_move(Direction::Right);
        pump(&bridge, &mut controller, now, &mut events);
    }

    assert_eq!(bridge.snapshot().status, GameStatus::RewardReached);
    assert_eq!(bridge.query_map(), Err(MapQueryError::RewardClaimed));
    assert_eq!(respond(&bridge, "score"), ok("Score: 1"));
    assert_eq!(
        respond(&bridge, "get_map"),
        rejected("Congratulations! You claimed the reward. Use start to play again.")
    );
}

#[test]
fn start_is_rejected_from_published_status() {
    let (bridge, mut controller) = harness(true);
    let mut events = Vec::new();
    let mut now = Instant::now();
    bridge.request_start().expect("title screen accepts start");
    pump(&bridge, &mut controller, now, &mut events);

    assert_eq!(bridge.request_start(), Err(StartRejection::AlreadyPlaying));
    assert_eq!(
        respond(&bridge, "start"),
        rejected(
            "The game is already in progress. Starting is only possible from the title \
             screen or after claiming the reward."
        )
    );

    for _ in 0..7 {
        now += TICK;
        let _ = bridge.set_move(Direction::Right);
        pump(&bridge, &mut controller, now, &mut events);
    }
    assert_eq!(bridge.snapshot().status, GameStatus::Transitioning);
    assert_eq!(
        respond(&bridge, "start"),
        rejected("The next map is loading. Wait for the transition to finish.")
    );

    pump(&bridge, &mut controller, now + Duration::from_secs(3), &mut events);
    let snapshot = bridge.snapshot();
    assert_eq!(snapshot.status, GameStatus::Playing);
    assert_eq!(snapshot.map_name, "Short");
    assert_eq!(snapshot.score, 0);
}

#[test]
fn invalid_direction_changes_nothing() {
    let (bridge, _) = harness(false);

    assert_eq!(
        respond(&bridge, "move north"),
        rejected("Invalid direction. Use: up, down, left, right.")
    );
    assert_eq!(bridge.pending_move(), None);
}

#[test]
fn second_start_before_a_tick_is_rejected() {
    let (bridge, mut controller) = harness(false);

    assert_eq!(respond(&bridge, "start"), ok("Game started!"));
    assert_eq!(
        respond(&bridge, "start"),
        rejected(
            "The game is already in progress. Starting is only possible from the title \
             screen or after claiming the reward."
        )
    );

    let mut events = Vec::new();
    pump(&bridge, &mut controller, Instant::now(), &mut events);

    let starts = events
        .iter()
        .filter(|event| {
            matches!(
                event,
                Event::StatusChanged {
                    to: GameStatus::Playing,
                    ..
                }
            )
        })
        .count();
    assert_eq!(starts, 1);
    assert!(!bridge.start_requested());
    assert_eq!(bridge.request_start(), Err(StartRejection::AlreadyPlaying));
}

#[test]
fn rejected_start_leaves_no_latch_behind() {
    let (bridge, mut controller) = harness(false);
    bridge.request_start().expect("title screen accepts start");
    let mut events = Vec::new();
    pump(&bridge, &mut controller, Instant::now(), &mut events);

    assert_eq!(bridge.request_start(), Err(StartRejection::AlreadyPlaying));
    assert!(!bridge.start_requested());
}

#[test]
fn queries_see_whole_snapshots_while_the_loop_ticks() {
    let (bridge, mut controller) = harness_with(false, CaptureMode::Relocate);
    bridge.request_start().expect("title screen accepts start");
    let finished = AtomicBool::new(false);

    thread::scope(|scope| {
        let _ticker = scope.spawn(|| {
            let mut events = Vec::new();
            let mut now = Instant::now();
            for _ in 0..2_000 {
                let state = controller.state();
                let toward = if state.reward().column() > state.player().column() {
                    Direction::Right
                } else {
                    Direction::Left
                };
                let _ = bridge.set_move(toward);
                pump(&bridge, &mut controller, now, &mut events);
                events.clear();
                now += TICK;
            }
            finished.store(true, Ordering::Release);
        });

        let mut last_score = 0;
        while !finished.load(Ordering::Acquire) {
            let snapshot = bridge.snapshot();
            if snapshot.status == GameStatus::Playing {
                let glyph_at = |cell: block_picker_core::CellCoord| {
                    snapshot.rows[cell.row() as usize].as_bytes()[cell.column() as usize]
                };
                assert_eq!(glyph_at(snapshot.player), b'P');
                assert_eq!(glyph_at(snapshot.reward), b'R');
            }
            assert!(snapshot.score >= last_score);
            last_score = snapshot.score;
            assert!(bridge.query_score() >= last_score);
        }
    });

    assert!(bridge.query_score() > 1);
    assert_eq!(bridge.snapshot().status, GameStatus::Playing);
}
