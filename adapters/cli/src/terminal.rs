//! Text presenter for published snapshots.

use std::io::{self, Write};

use block_picker_bridge::commands::CommandReply;
use block_picker_core::{CellCoord, GameSnapshot, GameStatus, WELCOME_BANNER};
use serde::Serialize;

/// Parts of a snapshot that change what is on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FrameKey {
    status: GameStatus,
    map_index: usize,
    player: CellCoord,
    reward: CellCoord,
    score: u32,
    sequential: bool,
    countdown_secs: Option<u128>,
}

impl FrameKey {
    fn of(snapshot: &GameSnapshot) -> Self {
        Self {
            status: snapshot.status,
            map_index: snapshot.map_index,
            player: snapshot.player,
            reward: snapshot.reward,
            score: snapshot.score,
            sequential: snapshot.sequential,
            countdown_secs: snapshot.transition_remaining.map(countdown_secs),
        }
    }
}

#[derive(Serialize)]
struct FrameMessage<'a> {
    frame: &'a GameSnapshot,
}

/// Writes a frame whenever the visible state changes.
#[derive(Debug)]
pub(crate) struct Presenter {
    json: bool,
    last: Option<FrameKey>,
}

impl Presenter {
    pub(crate) fn new(json: bool) -> Self {
        Self { json, last: None }
    }

    pub(crate) fn present<W: Write>(&mut self, snapshot: &GameSnapshot, out: &mut W) -> io::Result<()> {
        let key = FrameKey::of(snapshot);
        if self.last == Some(key) {
            return Ok(());
        }
        self.last = Some(key);

        if self.json {
            serde_json::to_writer(&mut *out, &FrameMessage { frame: snapshot })?;
            writeln!(out)?;
        } else {
            for line in render_frame(snapshot) {
                writeln!(out, "{line}")?;
            }
            writeln!(out)?;
        }
        out.flush()
    }
}

/// Writes a command reply as text or as a JSON object.
pub(crate) fn write_reply<W: Write>(out: &mut W, reply: &CommandReply, json: bool) -> io::Result<()> {
    if json {
        serde_json::to_writer(&mut *out, reply)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}", reply.message)?;
    }
    out.flush()
}

fn render_frame(snapshot: &GameSnapshot) -> Vec<String> {
    let toggle = if snapshot.sequential { "on" } else { "off" };
    match snapshot.status {
        GameStatus::NotStarted => vec![
            WELCOME_BANNER.to_owned(),
            format!(
                "Map {}: {} ({} maps, sequential {toggle})",
                snapshot.map_index, snapshot.map_name, snapshot.catalog_len
            ),
            "Type `start` to play or `help` for commands.".to_owned(),
        ],
        GameStatus::Playing => {
            let mut lines = vec![format!(
                "{}  Score: {}",
                snapshot.map_name, snapshot.score
            )];
            lines.extend(snapshot.rows.iter().cloned());
            lines
        }
        GameStatus::RewardReached => vec![
            "Congratulations! You claimed the reward.".to_owned(),
            format!("Score: {}", snapshot.score),
            "Type `start` to play again.".to_owned(),
        ],
        GameStatus::Transitioning => {
            let secs = snapshot.transition_remaining.map_or(0, countdown_secs);
            if snapshot.all_maps_completed {
                vec![
                    "All maps completed!".to_owned(),
                    format!("Returning to the title screen in {secs}s"),
                ]
            } else {
                vec![
                    format!("Reward captured on {}!", snapshot.map_name),
                    format!("Next map in {secs}s"),
                ]
            }
        }
    }
}

fn countdown_secs(remaining: std::time::Duration) -> u128 {
    remaining.as_millis().div_ceil(1000)
}
