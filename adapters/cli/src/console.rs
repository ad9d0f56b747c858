//! Line-oriented console input.
//!
//! Protocol commands go straight to the [`CommandBridge`]; keyboard aliases and
//! menu requests need the controller and are forwarded to the tick loop.

use std::{str::FromStr, sync::mpsc::Sender};

use block_picker_bridge::{
    commands::{self, CommandParseError, CommandReply, CommandRequest},
    CommandBridge,
};
use block_picker_core::Direction;
use thiserror::Error;

pub(crate) const HELP: &str = "Commands: move <up|down|left|right>, score, get_map, start, \
w/a/s/d, maps, map <index>, sequential <on|off>, title, quit";

/// One parsed console line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ConsoleInput {
    Request(CommandRequest),
    Key(Direction),
    ListMaps,
    SelectMap(usize),
    Sequential(bool),
    Title,
    Help,
    Quit,
}

/// Requests only the tick loop can carry out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Control {
    Key(Direction),
    SelectMap(usize),
    Sequential(bool),
    Title,
    Quit,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum ConsoleError {
    #[error("Missing map index. Use: map <index>.")]
    MissingMapIndex,
    #[error("'{0}' is not a map index. Use `maps` to list them.")]
    InvalidMapIndex(String),
    #[error("Use: sequential on or sequential off.")]
    InvalidToggle,
    #[error(transparent)]
    Command(#[from] CommandParseError),
}

impl FromStr for ConsoleInput {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let input = match (words.next(), words.next(), words.next()) {
            (Some("w"), None, None) => Self::Key(Direction::Up),
            (Some("a"), None, None) => Self::Key(Direction::Left),
            (Some("s"), None, None) => Self::Key(Direction::Down),
            (Some("d"), None, None) => Self::Key(Direction::Right),
            (Some("maps"), None, None) => Self::ListMaps,
            (Some("map"), None, _) => return Err(ConsoleError::MissingMapIndex),
            (Some("map"), Some(index), None) => Self::SelectMap(
                index
                    .parse()
                    .map_err(|_| ConsoleError::InvalidMapIndex(index.to_owned()))?,
            ),
            (Some("sequential"), Some("on"), None) => Self::Sequential(true),
            (Some("sequential"), Some("off"), None) => Self::Sequential(false),
            (Some("sequential"), _, _) => return Err(ConsoleError::InvalidToggle),
            (Some("title"), None, None) => Self::Title,
            (Some("help"), None, None) => Self::Help,
            (Some("quit" | "exit"), None, None) => Self::Quit,
            _ => Self::Request(line.parse()?),
        };
        Ok(input)
    }
}

/// Handles one line on the console thread.
///
/// Returns the reply to print immediately; forwarded requests are answered by
/// the tick loop instead.
pub(crate) fn dispatch(
    line: &str,
    bridge: &CommandBridge,
    controls: &Sender<Control>,
    map_names: &[String],
) -> Option<CommandReply> {
    let input = match line.parse::<ConsoleInput>() {
        Ok(input) => input,
        Err(error) => {
            return Some(CommandReply {
                ok: false,
                message: error.to_string(),
            })
        }
    };

    let control = match input {
        ConsoleInput::Request(request) => return Some(commands::execute(bridge, request)),
        ConsoleInput::ListMaps => return Some(list_maps(map_names)),
        ConsoleInput::Help => {
            return Some(CommandReply {
                ok: true,
                message: HELP.to_owned(),
            })
        }
        ConsoleInput::Key(direction) => Control::Key(direction),
        ConsoleInput::SelectMap(index) => Control::SelectMap(index),
        ConsoleInput::Sequential(enabled) => Control::Sequential(enabled),
        ConsoleInput::Title => Control::Title,
        ConsoleInput::Quit => Control::Quit,
    };

    // The tick loop only stops listening when it is shutting down.
    let _ = controls.send(control);
    None
}

fn list_maps(map_names: &[String]) -> CommandReply {
    let message = map_names
        .iter()
        .enumerate()
        .map(|(index, name)| format!("{index}: {name}"))
        .collect::<Vec<_>>()
        .join("\n");
    CommandReply { ok: true, message }
}
