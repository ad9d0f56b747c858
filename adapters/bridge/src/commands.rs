//! Text command protocol exposed to external callers.
//!
//! Requests are single lines (`move up`, `score`, `get_map`, `start`); every
//! outcome, including rejections, is a plain [`CommandReply`].

use std::str::FromStr;

use block_picker_core::{Direction, DirectionParseError};
use serde::Serialize;
use thiserror::Error;

use crate::CommandBridge;

/// Operations available to external callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandRequest {
    /// Queue a move for the next tick.
    Move(Direction),
    /// Read the current score.
    Score,
    /// Read the grid with the player and reward drawn in.
    GetMap,
    /// Start or restart the game.
    Start,
}

impl FromStr for CommandRequest {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(CommandParseError::Empty);
        };

        let request = match name {
            "move" => {
                let direction = words.next().ok_or(CommandParseError::MissingDirection)?;
                Self::Move(direction.parse()?)
            }
            "score" => Self::Score,
            "get_map" => Self::GetMap,
            "start" => Self::Start,
            other => return Err(CommandParseError::Unknown(other.to_owned())),
        };

        if let Some(extra) = words.next() {
            return Err(CommandParseError::UnexpectedArgument(extra.to_owned()));
        }
        Ok(request)
    }
}

/// Reasons a request line cannot be understood.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CommandParseError {
    /// The line was blank.
    #[error("Empty command. Use: move <direction>, score, get_map, start.")]
    Empty,
    /// The command name is not known.
    #[error("Unknown command '{0}'. Use: move <direction>, score, get_map, start.")]
    Unknown(String),
    /// `move` was sent without a direction.
    #[error("Missing direction. Use: up, down, left, right.")]
    MissingDirection,
    /// The direction is not one of the four cardinal names.
    #[error(transparent)]
    InvalidDirection(#[from] DirectionParseError),
    /// Extra words followed a complete command.
    #[error("Unexpected argument '{0}'.")]
    UnexpectedArgument(String),
}

/// Plain descriptive outcome of a command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandReply {
    /// Whether the command took effect or returned data.
    pub ok: bool,
    /// Human-readable result.
    pub message: String,
}

impl CommandReply {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn rejection(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Executes a parsed request against the bridge.
pub fn execute(bridge: &CommandBridge, request: CommandRequest) -> CommandReply {
    match request {
        CommandRequest::Move(direction) => {
            let _ = bridge.set_move(direction);
            CommandReply::success(format!("Moving {direction}"))
        }
        CommandRequest::Score => CommandReply::success(format!("Score: {}", bridge.query_score())),
        CommandRequest::GetMap => match bridge.query_map() {
            Ok(rows) => CommandReply::success(rows.join("\n")),
            Err(error) => CommandReply::rejection(error.to_string()),
        },
        CommandRequest::Start => match bridge.request_start() {
            Ok(()) => CommandReply::success("Game started!"),
            Err(reason) => CommandReply::rejection(reason.to_string()),
        },
    }
}

/// Parses and executes one request line.
pub fn respond(bridge: &CommandBridge, line: &str) -> CommandReply {
    match line.parse::<CommandRequest>() {
        Ok(request) => execute(bridge, request),
        Err(error) => CommandReply::rejection(error.to_string()),
    }
}
