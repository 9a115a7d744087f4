//! The line-oriented wire protocol between the referee and the bots.
//!
//! Each turn a living bot receives the number of ships it owns, the number
//! of entities it can see, then one line per entity:
//!
//! ```text
//! id KIND x y e1 e2 e3 e4
//! ```
//!
//! with `KIND` one of `SHIP`, `MINE`, `CANNONBALL`, `BARREL` and unused
//! extras padded with `-1`. It must answer with exactly one command line per
//! owned ship (see [`Command`]). Mines are only reported within
//! [`MINE_SIGHT`] of one of the player's ships; everything else is always
//! visible.

use std::io;

use thiserror::Error;

use crate::command::{Command, CommandSet};
use crate::hex::{self, Coord};
use crate::world::{PlayerId, Ship, World};

/// How far (from a ship's center) mines are spotted.
pub const MINE_SIGHT: i32 = 5;

/// The ways a player can fail one turn.
///
/// All four are local to one player for one turn; the referee answers each
/// of them by terminating that player's process and sailing on.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The reply was still incomplete when the time budget ran out.
    #[error("no complete reply within the time budget")]
    Timeout,
    /// A reply line was malformed or out of vocabulary.
    #[error("invalid command line: {0:?}")]
    InvalidCommand(String),
    /// The turn input could not be delivered to the process.
    #[error("could not write to the bot")]
    ChannelWrite(#[source] io::Error),
    /// The process's output stream failed.
    #[error("could not read from the bot")]
    ChannelRead(#[source] io::Error),
}

/// Serialize the world as seen by `player`.
pub fn render_view(world: &World, player: PlayerId) -> String {
    let visible_mines: Vec<_> = world
        .mines
        .iter()
        .filter(|m| {
            world
                .ships_of(player)
                .any(|s| s.pos.distance(m.pos) <= MINE_SIGHT)
        })
        .collect();
    let total = world.ships.len() + visible_mines.len() + world.cannonballs.len()
        + world.barrels.len();

    let mut lines = Vec::with_capacity(total + 2);
    lines.push(world.fleet_size(player).to_string());
    lines.push(total.to_string());
    for s in &world.ships {
        let owned = if s.owner == player { 1 } else { 0 };
        lines.push(format!(
            "{} SHIP {} {} {} {} {}",
            s.id, s.pos, s.angle, s.speed, s.rum, owned
        ));
    }
    for m in visible_mines {
        lines.push(format!("{} MINE {} -1 -1 -1 -1", m.id, m.pos));
    }
    for c in &world.cannonballs {
        lines.push(format!(
            "{} CANNONBALL {} {} {} -1 -1",
            c.id, c.target, c.shooter, c.turns
        ));
    }
    for b in &world.barrels {
        lines.push(format!("{} BARREL {} {} -1 -1 -1", b.id, b.pos, b.rum));
    }
    lines.push(String::new()); // trailing newline
    lines.join("\n")
}

/// True once `reply` holds one full line per ship `player` owns.
pub fn reply_complete(world: &World, player: PlayerId, reply: &str) -> bool {
    reply.bytes().filter(|&b| b == b'\n').count() == world.fleet_size(player)
}

/// Parse a full reply into one command per owned ship, lowering `MOVE` to a
/// concrete maneuver.
pub fn parse_orders(
    world: &World,
    player: PlayerId,
    reply: &str,
) -> Result<CommandSet, MatchError> {
    let own_ships: Vec<Ship> = world.ships_of(player).copied().collect();
    let mut lines = reply.lines();
    let mut orders = CommandSet::with_capacity(own_ships.len());
    for ship in own_ships {
        let line = lines.next().unwrap_or("");
        let command = Command::parse_line(line)
            .ok_or_else(|| MatchError::InvalidCommand(line.to_string()))?;
        let command = match command {
            Command::Move(target) => plot_course(&ship, target),
            other => other,
        };
        orders.insert(ship.id, command);
    }
    Ok(orders)
}

/// Lower a `MOVE target` into one concrete maneuver for this turn.
///
/// Compares the cells reachable by going straight, to port and to starboard
/// by hex distance to the target, with bearing-error tie-breaks, a secondary
/// tie-break toward the map center and a fixed pick at headings 1 and 4 so
/// the ship does not circle its target forever. Next to the target with a
/// badly wrong heading, slow down instead of overshooting.
pub fn plot_course(ship: &Ship, target: Coord) -> Command {
    if ship.pos == target || ship.speed == 2 {
        return Command::Slower;
    }

    let target_heading = hex::bearing(ship.pos, target);
    let center_heading = hex::bearing(ship.pos, hex::CENTER);
    let straight = straight_gap(ship.angle, target_heading);
    let port = port_gap(ship.angle, target_heading);
    let starboard = starboard_gap(ship.angle, target_heading);
    let port_center = port_gap(ship.angle, center_heading);
    let starboard_center = starboard_gap(ship.angle, center_heading);
    let fixed_pick = ship.angle == 1 || ship.angle == 4;
    let ahead = ship.pos.neighbor(ship.angle);

    if ship.speed == 1 {
        if !ahead.in_bounds() {
            return Command::Slower;
        }
        if ahead == target {
            return Command::Wait;
        }
        if ship.pos.distance(target) == 1 && straight > 1.5 {
            return Command::Slower;
        }

        let mut best = Command::Wait;
        let mut best_dist = ahead.distance(target);
        let port_cell = ship.pos.neighbor((ship.angle + 1) % 6);
        if port_cell.in_bounds() {
            let dist = port_cell.distance(target);
            if dist < best_dist || (dist == best_dist && port < straight - 0.5) {
                best = Command::Port;
                best_dist = dist;
            }
        }
        let starboard_cell = ship.pos.neighbor((ship.angle + 5) % 6);
        if starboard_cell.in_bounds() {
            let dist = starboard_cell.distance(target);
            if dist < best_dist
                || (dist == best_dist && starboard < port - 0.5 && best == Command::Port)
                || (dist == best_dist && starboard < straight - 0.5 && best == Command::Wait)
                || (dist == best_dist
                    && best == Command::Port
                    && starboard == port
                    && starboard_center < port_center)
                || (dist == best_dist
                    && best == Command::Port
                    && starboard == port
                    && starboard_center == port_center
                    && fixed_pick)
            {
                best = Command::Starboard;
            }
        }
        return best;
    }

    // Stopped: pick the rotation with the smaller bearing error, or set
    // sail if already lined up.
    let mut best = Command::Wait;
    if port <= starboard {
        best = Command::Port;
    }
    if starboard < port
        || (starboard == port && starboard_center < port_center)
        || (starboard == port && starboard_center == port_center && fixed_pick)
    {
        best = Command::Starboard;
    }
    if ahead.in_bounds() && straight <= port && straight <= starboard {
        best = Command::Faster;
    }
    best
}

// Bearing errors of keeping the heading, or of the heading one step to
// either side, exactly as the referee computes them.
fn straight_gap(angle: i32, heading: f64) -> f64 {
    let d = (f64::from(angle) - heading).abs();
    d.min(6.0 - d)
}

fn port_gap(angle: i32, heading: f64) -> f64 {
    let a = f64::from(angle);
    (a + 1.0 - heading).abs().min((a - 5.0 - heading).abs())
}

fn starboard_gap(angle: i32, heading: f64) -> f64 {
    let a = f64::from(angle);
    (a + 5.0 - heading).abs().min((a - 1.0 - heading).abs())
}
