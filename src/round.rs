//! Randomized round setup and the play-one-round entry point.
//!
//! Boards are mirrored across the horizontal axis so neither side gets a
//! terrain advantage, and a coin flip swaps which executable sails as
//! player 0 to cancel any first-player asymmetry left in the rules. All
//! randomness lives here; the simulation itself is deterministic.

use std::path::PathBuf;

use rand::Rng;

use crate::configuration::ArenaConfig;
use crate::hex::{Coord, HEIGHT, WIDTH};
use crate::referee::{Outcome, Referee};
use crate::world::{Barrel, Mine, Ship, World, MAX_RUM};

/// Build a fresh board: 1–3 ships per player in mirrored bands, 5–10 mines
/// and 10–26 barrels at mirrored free cells.
pub fn generate_world(rng: &mut impl Rng) -> World {
    let mut world = World::new();
    let ships_per_player = rng.gen_range(1..=3);
    let mines = rng.gen_range(5..=10usize);
    let barrels = rng.gen_range(10..=26usize);

    for i in 0..ships_per_player {
        // Each ship gets its own horizontal band so fleets start spread out.
        let x_min = 1 + i * WIDTH / ships_per_player;
        let x_max = (i + 1) * WIDTH / ships_per_player - 2;
        let pos = Coord::new(rng.gen_range(x_min..=x_max), rng.gen_range(1..=HEIGHT / 2 - 2));
        let angle = rng.gen_range(0..6);
        let id = world.alloc_id();
        world.ships.push(Ship {
            id,
            pos,
            angle,
            speed: 0,
            rum: MAX_RUM,
            owner: 0,
            cannon_cd: 0,
            mine_cd: 0,
        });
        let id = world.alloc_id();
        world.ships.push(Ship {
            id,
            pos: mirrored(pos),
            angle: (6 - angle) % 6,
            speed: 0,
            rum: MAX_RUM,
            owner: 1,
            cannon_cd: 0,
            mine_cd: 0,
        });
    }

    while world.mines.len() < mines {
        let pos = Coord::new(rng.gen_range(1..=WIDTH - 2), rng.gen_range(1..=HEIGHT / 2));
        if world.is_free(pos) {
            if mirrored(pos) != pos {
                let id = world.alloc_id();
                world.mines.push(Mine {
                    id,
                    pos: mirrored(pos),
                });
            }
            let id = world.alloc_id();
            world.mines.push(Mine { id, pos });
        }
    }

    while world.barrels.len() < barrels {
        let pos = Coord::new(rng.gen_range(1..=WIDTH - 2), rng.gen_range(1..=HEIGHT / 2));
        let rum = rng.gen_range(10..=20);
        if world.is_free(pos) {
            if mirrored(pos) != pos {
                let id = world.alloc_id();
                world.barrels.push(Barrel {
                    id,
                    pos: mirrored(pos),
                    rum,
                });
            }
            let id = world.alloc_id();
            world.barrels.push(Barrel { id, pos, rum });
        }
    }

    world
}

/// Reflection across the horizontal symmetry axis.
fn mirrored(pos: Coord) -> Coord {
    Coord::new(pos.x, HEIGHT - 1 - pos.y)
}

/// Generate a board, play one full round between the two executables and
/// report the outcome in the caller's player order.
pub fn play_round(
    config: &ArenaConfig,
    bots: &[PathBuf; 2],
    rng: &mut impl Rng,
) -> anyhow::Result<Outcome> {
    let swapped = rng.gen_bool(0.5);
    let world = generate_world(rng);
    let paths = if swapped {
        [bots[1].as_path(), bots[0].as_path()]
    } else {
        [bots[0].as_path(), bots[1].as_path()]
    };
    let outcome = Referee::new(config, paths, world)?.run();
    Ok(match outcome {
        Outcome::Win(player) if swapped => Outcome::Win(1 - player),
        other => other,
    })
}
