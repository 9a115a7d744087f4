//! The eight commands a bot can give each of its ships.

use std::collections::HashMap;

use crate::hex::Coord;
use crate::world::EntityId;

/// One ship order for one turn.
///
/// `Move` is the high-level form bots may send on the wire; the protocol
/// layer lowers it to one of the other commands before resolution, so the
/// simulation itself never sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Launch a cannonball at a target cell.
    Fire(Coord),
    /// Drop a mine astern.
    Mine,
    /// Rotate one step counter-clockwise.
    Port,
    /// Rotate one step clockwise.
    Starboard,
    /// Increase speed by one.
    Faster,
    /// Decrease speed by one.
    Slower,
    /// Do nothing.
    Wait,
    /// Sail toward a target cell (lowered by the protocol layer).
    Move(Coord),
}

/// Orders for every ship a player owns, keyed by ship id.
///
/// Only per-id uniqueness matters, so a plain `HashMap` does.
pub type CommandSet = HashMap<EntityId, Command>;

impl Command {
    /// Parse one wire line, e.g. `FIRE 12 4` or `WAIT`.
    ///
    /// Commands without a target ignore trailing tokens; `FIRE`/`MOVE`
    /// require two integer coordinates. Returns `None` for anything else.
    pub fn parse_line(line: &str) -> Option<Command> {
        let mut words = line.split_whitespace();
        let keyword = words.next()?;
        let mut target = || -> Option<Coord> {
            let x = words.next()?.parse().ok()?;
            let y = words.next()?.parse().ok()?;
            Some(Coord::new(x, y))
        };
        match keyword {
            "FIRE" => Some(Command::Fire(target()?)),
            "MOVE" => Some(Command::Move(target()?)),
            "MINE" => Some(Command::Mine),
            "PORT" => Some(Command::Port),
            "STARBOARD" => Some(Command::Starboard),
            "FASTER" => Some(Command::Faster),
            "SLOWER" => Some(Command::Slower),
            "WAIT" => Some(Command::Wait),
            _ => None,
        }
    }
}
