use std::time::{Duration, Instant};

use block_picker_core::{CaptureMode, Direction, Event, GameStatus, StartRejection};
use block_picker_system_progression::{Config, ProgressionController, ProgressionError};
use block_picker_world::{catalog::MapCatalog, GameState};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const DWELL: Duration = Duration::from_millis(3000);
const TICK: Duration = Duration::from_millis(100);

fn corridor_catalog() -> MapCatalog {
    MapCatalog::from_layouts([
        ("First", vec!["#PR#"]),
        ("Second", vec!["#POR#"]),
        ("Third", vec!["#POOR#"]),
        ("Fourth", vec!["#POOOR#"]),
    ])
    .expect("valid catalog")
}

fn controller(sequential: bool, capture_mode: CaptureMode) -> ProgressionController {
    let state = GameState::with_rng(corridor_catalog(), 0, ChaCha8Rng::seed_from_u64(0xc0ffee))
        .expect("map exists");
    ProgressionController::new(state, Config::new(sequential, capture_mode, DWELL))
}

/// Walks right one tick at a time until the reward is captured, returning the
/// clock after the capturing tick.
fn walk_to_reward(
    controller: &mut ProgressionController,
    mut now: Instant,
    events: &mut Vec<Event>,
) -> Instant {
    for _ in 0..16 {
        controller.queue_move(Direction::Right);
        controller.tick(now, events);
        if events
            .iter()
            .any(|event| matches!(event, Event::RewardCaptured { .. }))
        {
            return now;
        }
        now += TICK;
    }
    panic!("reward was never captured");
}

#[test]
fn sequential_mode_visits_catalog_in_order_then_wraps() {
    let mut controller = controller(true, CaptureMode::ManualRestart);
    let mut now = Instant::now();
    controller.start_game().expect("title screen starts");

    let mut visited = Vec::new();
    loop {
        visited.push(controller.progression().current_map_index());
        assert!(!controller.progression().all_maps_completed());

        let mut events = Vec::new();
        now = walk_to_reward(&mut controller, now, &mut events);
        assert_eq!(controller.state().status(), GameStatus::Transitioning);

        if controller.progression().all_maps_completed() {
            break;
        }

        now += DWELL;
        events.clear();
        controller.tick(now, &mut events);
        assert_eq!(controller.state().status(), GameStatus::Playing);
    }

    assert_eq!(visited, vec![0, 1, 2, 3]);

    let mut events = Vec::new();
    controller.tick(now + DWELL, &mut events);

    assert!(!controller.progression().all_maps_completed());
    assert_eq!(controller.progression().current_map_index(), 0);
    assert_eq!(controller.state().map_index(), 0);
    assert_eq!(controller.state().status(), GameStatus::NotStarted);
}

#[test]
fn capturing_last_map_flags_completion_immediately() {
    let mut controller = controller(true, CaptureMode::ManualRestart);
    controller.select_map(3).expect("title screen menu");
    controller.start_game().expect("title screen starts");
    let start = Instant::now();

    let mut events = Vec::new();
    let captured_at = walk_to_reward(&mut controller, start, &mut events);

    assert!(controller.progression().all_maps_completed());
    assert_eq!(
        controller.progression().transition_started_at(),
        Some(captured_at)
    );
    assert_eq!(controller.state().score(), 1);

    events.clear();
    controller.tick(captured_at + Duration::from_millis(2900), &mut events);
    assert!(events.is_empty());
    assert!(controller.progression().all_maps_completed());
    assert_eq!(controller.state().status(), GameStatus::Transitioning);

    controller.tick(captured_at + DWELL, &mut events);
    assert!(!controller.progression().all_maps_completed());
    assert_eq!(controller.progression().current_map_index(), 0);
    assert_eq!(controller.state().status(), GameStatus::NotStarted);
    assert_eq!(controller.state().score(), 0);
}

#[test]
fn advancing_loads_next_map_and_resumes_play() {
    let mut controller = controller(true, CaptureMode::ManualRestart);
    controller.start_game().expect("title screen starts");

    let mut events = Vec::new();
    let captured_at = walk_to_reward(&mut controller, Instant::now(), &mut events);
    assert!(!controller.progression().all_maps_completed());

    events.clear();
    controller.tick(captured_at + DWELL, &mut events);

    assert_eq!(controller.progression().current_map_index(), 1);
    assert_eq!(controller.state().map_index(), 1);
    assert_eq!(controller.state().status(), GameStatus::Playing);
    assert_eq!(controller.state().score(), 0);
    assert!(events.iter().any(|event| matches!(
        event,
        Event::MapLoaded { map_index: 1, .. }
    )));
    assert_eq!(controller.progression().transition_started_at(), None);
}

#[test]
fn transition_ignores_movement_and_start() {
    let mut controller = controller(true, CaptureMode::ManualRestart);
    controller.start_game().expect("title screen starts");
    let mut events = Vec::new();
    let captured_at = walk_to_reward(&mut controller, Instant::now(), &mut events);
    let player = controller.state().player();

    controller.queue_move(Direction::Left);
    events.clear();
    controller.tick(captured_at + TICK, &mut events);

    assert!(events.is_empty());
    assert_eq!(controller.state().player(), player);
    assert_eq!(controller.start_game(), Err(StartRejection::Transitioning));
    assert_eq!(
        controller.select_map(2),
        Err(ProgressionError::MenuLocked {
            status: GameStatus::Transitioning,
        })
    );
}

#[test]
fn non_sequential_capture_waits_for_manual_restart() {
    let mut controller = controller(false, CaptureMode::ManualRestart);
    controller.select_map(2).expect("title screen menu");
    controller.start_game().expect("title screen starts");

    let mut events = Vec::new();
    let captured_at = walk_to_reward(&mut controller, Instant::now(), &mut events);
    assert_eq!(controller.state().status(), GameStatus::RewardReached);
    assert_eq!(controller.state().score(), 1);

    for step in 1..=50 {
        controller.tick(captured_at + TICK * step, &mut events);
    }
    assert_eq!(controller.state().status(), GameStatus::RewardReached);
    assert_eq!(controller.state().score(), 1);
    assert_eq!(controller.progression().current_map_index(), 2);

    controller.start_game().expect("reward screen restarts");

    assert_eq!(controller.state().status(), GameStatus::Playing);
    assert_eq!(controller.state().map_index(), 2);
    assert_eq!(controller.state().score(), 0);
    assert!(!controller.progression().all_maps_completed());
}

#[test]
fn relocate_mode_keeps_playing_after_capture() {
    let mut controller = controller(false, CaptureMode::Relocate);
    controller.select_map(3).expect("title screen menu");
    controller.start_game().expect("title screen starts");

    let mut events = Vec::new();
    let _ = walk_to_reward(&mut controller, Instant::now(), &mut events);

    assert_eq!(controller.state().status(), GameStatus::Playing);
    assert_eq!(controller.state().score(), 1);
    assert_ne!(controller.state().reward(), controller.state().player());
    assert!(controller.state().grid().is_open(controller.state().reward()));
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::RewardRelocated { .. })));
}

#[test]
fn start_is_rejected_while_playing() {
    let mut controller = controller(false, CaptureMode::ManualRestart);
    controller.start_game().expect("title screen starts");

    assert_eq!(controller.start_game(), Err(StartRejection::AlreadyPlaying));
    assert_eq!(controller.state().status(), GameStatus::Playing);
}

#[test]
fn pending_move_is_dropped_outside_play() {
    let mut controller = controller(false, CaptureMode::ManualRestart);
    controller.queue_move(Direction::Right);
    let mut events = Vec::new();
    controller.tick(Instant::now(), &mut events);

    controller.start_game().expect("title screen starts");
    controller.tick(Instant::now(), &mut events);

    assert!(events.is_empty());
    assert_eq!(controller.state().score(), 0);
    assert_eq!(controller.state().status(), GameStatus::Playing);
}

#[test]
fn select_map_rejects_unknown_index() {
    let mut controller = controller(false, CaptureMode::ManualRestart);

    assert_eq!(
        controller.select_map(4),
        Err(ProgressionError::UnknownMap { index: 4, len: 4 })
    );
    assert_eq!(controller.progression().current_map_index(), 0);
}

#[test]
fn return_to_title_resets_progression() {
    let mut controller = controller(true, CaptureMode::ManualRestart);
    controller.select_map(3).expect("title screen menu");
    controller.start_game().expect("title screen starts");
    let mut events = Vec::new();
    let _ = walk_to_reward(&mut controller, Instant::now(), &mut events);

    controller.return_to_title();

    assert_eq!(controller.progression().current_map_index(), 0);
    assert!(!controller.progression().all_maps_completed());
    assert_eq!(controller.state().status(), GameStatus::NotStarted);
}

#[test]
fn snapshot_reflects_state() {
    let mut controller = controller(true, CaptureMode::ManualRestart);
    controller.start_game().expect("title screen starts");
    let now = Instant::now();

    let snapshot = controller.snapshot(now);

    assert_eq!(snapshot.map_name, "First");
    assert_eq!(snapshot.catalog_len, 4);
    assert_eq!(snapshot.status, GameStatus::Playing);
    assert_eq!(snapshot.rows, vec!["#PR#".to_owned()]);
    assert!(snapshot.sequential);
    assert_eq!(snapshot.transition_remaining, None);
}
