//! Per-turn resolution: a command set per player in, the next world out.
//!
//! [`resolve`] is deterministic and free of randomness; replaying the same
//! commands on a clone of a world yields an identical world. The phases run
//! in fixed order: orders, movement (two sub-phases), rotation, ordnance,
//! loot drops, purge.

use std::collections::HashMap;

use crate::command::{Command, CommandSet};
use crate::hex::{self, Coord};
use crate::world::{
    Barrel, Cannonball, EntityId, Mine, Ship, World, CANNON_COOLDOWN, CANNON_RANGE, MAX_LOOT_DROP,
    MAX_RUM, MAX_SPEED, MINE_COOLDOWN, MINE_DAMAGE,
};

/// Advance `world` by one turn under the given per-player command sets.
///
/// Every ship is expected to have a command in its owner's set; a missing
/// entry counts as `WAIT`.
pub fn resolve(world: &mut World, commands: &[CommandSet; 2]) {
    let loot = apply_orders(world, commands);
    run_movement(world);
    run_rotation(world, commands);
    run_ordnance(world);
    drop_loot(world, &loot);
    world.purge();
}

fn command_for(commands: &[CommandSet; 2], ship: &Ship) -> Command {
    commands[ship.owner]
        .get(&ship.id)
        .copied()
        .unwrap_or(Command::Wait)
}

/// Rum decrement, speed changes, firing and mine laying. Returns the barrel
/// payload each ship would leave behind if it sinks this turn.
fn apply_orders(world: &mut World, commands: &[CommandSet; 2]) -> HashMap<EntityId, i32> {
    let mut loot = HashMap::new();
    for i in 0..world.ships.len() {
        let mut ship = world.ships[i];
        loot.insert(ship.id, ship.rum.min(MAX_LOOT_DROP));
        ship.rum -= 1;
        match command_for(commands, &ship) {
            Command::Slower => ship.speed = (ship.speed - 1).max(0),
            Command::Faster => ship.speed = (ship.speed + 1).min(MAX_SPEED),
            Command::Fire(target)
                if ship.cannon_cd == 0 && ship.bow().distance(target) <= CANNON_RANGE =>
            {
                let distance = ship.bow().distance(target);
                let turns = 2 + (f64::from(distance) / 3.0).round() as i32;
                let id = world.alloc_id();
                world.cannonballs.push(Cannonball {
                    id,
                    shooter: ship.id,
                    target,
                    turns,
                });
                ship.cannon_cd = CANNON_COOLDOWN;
            }
            Command::Mine if ship.mine_cd == 0 => {
                let spot = ship.stern().neighbor(hex::opposite(ship.angle));
                if spot.in_bounds() && world.is_free(spot) {
                    let id = world.alloc_id();
                    world.mines.push(Mine { id, pos: spot });
                    ship.mine_cd = MINE_COOLDOWN;
                }
            }
            _ => {}
        }
        ship.cannon_cd = (ship.cannon_cd - 1).max(0);
        ship.mine_cd = (ship.mine_cd - 1).max(0);
        world.ships[i] = ship;
    }
    loot
}

/// Two movement sub-phases; ships at the phase speed advance one cell, then
/// collisions are rolled back until a fixed point, then movers pick up
/// whatever their bow ran into.
fn run_movement(world: &mut World) {
    for phase in 1..=MAX_SPEED {
        let before = world.ships.clone();
        for ship in &mut world.ships {
            if ship.speed >= phase {
                let next = ship.pos.neighbor(ship.angle);
                if next.in_bounds() {
                    ship.pos = next;
                } else {
                    ship.speed = 0;
                }
            }
        }
        loop {
            let mut colliding = Vec::new();
            for (i, ship) in world.ships.iter().enumerate() {
                if ship.speed < phase {
                    continue;
                }
                for (j, other) in world.ships.iter().enumerate() {
                    if i != j && other.occupies(ship.bow()) {
                        colliding.push(i);
                        if other.bow() == ship.bow() {
                            colliding.push(j);
                        }
                    }
                }
            }
            if colliding.is_empty() {
                break;
            }
            // Each pass turns at least one mover into a non-mover, so the
            // scan reaches a fixed point.
            for &k in &colliding {
                world.ships[k].speed = 0;
                world.ships[k].pos = before[k].pos;
            }
        }
        for i in 0..world.ships.len() {
            if world.ships[i].speed >= phase {
                let bow = world.ships[i].bow();
                collect_barrel(world, i, &[bow]);
                trigger_mine(world, i, &[bow]);
            }
        }
    }
}

/// Apply PORT/STARBOARD, roll back colliding rotations to a fixed point,
/// then let every turning ship sweep its new bow and stern cells.
fn run_rotation(world: &mut World, commands: &[CommandSet; 2]) {
    let before = world.ships.clone();
    let turning: Vec<bool> = world
        .ships
        .iter()
        .map(|ship| {
            matches!(
                command_for(commands, ship),
                Command::Port | Command::Starboard
            )
        })
        .collect();
    for (ship, turns) in world.ships.iter_mut().zip(&turning) {
        if *turns {
            match command_for(commands, ship) {
                Command::Port => ship.angle = (ship.angle + 1) % 6,
                Command::Starboard => ship.angle = (ship.angle + 5) % 6,
                _ => unreachable!(),
            }
        }
    }
    loop {
        let mut colliding = Vec::new();
        for (i, ship) in world.ships.iter().enumerate() {
            if !turning[i] {
                continue;
            }
            for (j, other) in world.ships.iter().enumerate() {
                if j == i {
                    continue;
                }
                if ship.occupies(other.bow())
                    || other.occupies(ship.bow())
                    || ship.occupies(other.stern())
                    || other.occupies(ship.stern())
                {
                    colliding.push(i);
                    colliding.push(j);
                }
            }
        }
        if colliding.is_empty() {
            break;
        }
        for &k in &colliding {
            world.ships[k].speed = 0;
            world.ships[k].angle = before[k].angle;
        }
    }
    for i in 0..world.ships.len() {
        if turning[i] {
            let cells = [world.ships[i].bow(), world.ships[i].stern()];
            collect_barrel(world, i, &cells);
            trigger_mine(world, i, &cells);
        }
    }
}

/// Pick up the first barrel sitting on any of `cells`, capped at
/// [`MAX_RUM`].
fn collect_barrel(world: &mut World, ship_index: usize, cells: &[Coord]) {
    if let Some(i) = world
        .barrels
        .iter()
        .position(|b| cells.contains(&b.pos))
    {
        let barrel = world.barrels.remove(i);
        let ship = &mut world.ships[ship_index];
        ship.rum = (ship.rum + barrel.rum).min(MAX_RUM);
    }
}

/// Detonate the first mine sitting on any of `cells`: full damage to the
/// ship that hit it, splash to every other ship in range.
fn trigger_mine(world: &mut World, ship_index: usize, cells: &[Coord]) {
    if let Some(i) = world.mines.iter().position(|m| cells.contains(&m.pos)) {
        let mine = world.mines.remove(i);
        world.ships[ship_index].rum -= MINE_DAMAGE;
        let hit_id = world.ships[ship_index].id;
        for other in &mut world.ships {
            if other.id != hit_id {
                other.splash(mine.pos);
            }
        }
    }
}

/// Tick every cannonball; those reaching zero detonate on their target.
fn run_ordnance(world: &mut World) {
    for i in 0..world.cannonballs.len() {
        world.cannonballs[i].turns -= 1;
        if world.cannonballs[i].turns == 0 {
            let target = world.cannonballs[i].target;
            world.blow(target);
        }
    }
}

/// Sinking ships leave a barrel with the rum they held at the start of the
/// turn, capped at [`MAX_LOOT_DROP`].
fn drop_loot(world: &mut World, loot: &HashMap<EntityId, i32>) {
    for i in 0..world.ships.len() {
        let ship = world.ships[i];
        let payload = loot.get(&ship.id).copied().unwrap_or(0);
        if ship.rum <= 0 && payload > 0 {
            let id = world.alloc_id();
            world.barrels.push(Barrel {
                id,
                pos: ship.pos,
                rum: payload,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::test_support::{barrel, mine, ship};
    use crate::world::SPLASH_DAMAGE;

    fn orders(entries: &[(EntityId, Command)]) -> CommandSet {
        entries.iter().copied().collect()
    }

    fn wait_all() -> [CommandSet; 2] {
        [CommandSet::new(), CommandSet::new()]
    }

    #[test]
    fn rum_drains_one_per_turn() {
        let mut world = World::new();
        ship(&mut world, Coord::new(5, 5), 0, 0);
        resolve(&mut world, &wait_all());
        assert_eq!(world.ships[0].rum, MAX_RUM - 1);
    }

    #[test]
    fn resolve_is_deterministic() {
        let mut world = World::new();
        let a = ship(&mut world, Coord::new(5, 5), 0, 0);
        let b = ship(&mut world, Coord::new(10, 10), 3, 1);
        barrel(&mut world, Coord::new(7, 5), 15);
        mine(&mut world, Coord::new(12, 10));
        let commands = [
            orders(&[(a, Command::Faster)]),
            orders(&[(b, Command::Fire(Coord::new(5, 5)))]),
        ];
        let mut twin = world.clone();
        resolve(&mut world, &commands);
        resolve(&mut twin, &commands);
        assert_eq!(world, twin);
    }

    #[test]
    fn faster_and_slower_clamp_speed() {
        let mut world = World::new();
        let id = ship(&mut world, Coord::new(5, 5), 0, 0);
        resolve(&mut world, &[orders(&[(id, Command::Slower)]), orders(&[])]);
        assert_eq!(world.ships[0].speed, 0);
        for _ in 0..3 {
            resolve(&mut world, &[orders(&[(id, Command::Faster)]), orders(&[])]);
        }
        assert_eq!(world.ships[0].speed, MAX_SPEED);
    }

    #[test]
    fn fire_spawns_a_cannonball_with_distance_fuse() {
        let mut world = World::new();
        let id = ship(&mut world, Coord::new(5, 5), 0, 0);
        let target = Coord::new(12, 5); // 6 cells from the bow at (6,5)
        resolve(&mut world, &[orders(&[(id, Command::Fire(target))]), orders(&[])]);
        assert_eq!(world.cannonballs.len(), 1);
        let ball = world.cannonballs[0];
        assert_eq!(ball.target, target);
        assert_eq!(ball.shooter, id);
        // Fuse starts at 2 + round(6 / 3) = 4 and ticks once this turn.
        assert_eq!(ball.turns, 3);
        // Cooldown was set to 2 and ticked once this turn.
        assert_eq!(world.ships[0].cannon_cd, 1);
    }

    #[test]
    fn fire_beyond_range_does_nothing() {
        let mut world = World::new();
        let id = ship(&mut world, Coord::new(1, 5), 0, 0);
        let target = Coord::new(20, 5); // 18 cells from the bow
        resolve(&mut world, &[orders(&[(id, Command::Fire(target))]), orders(&[])]);
        assert!(world.cannonballs.is_empty());
        assert_eq!(world.ships[0].cannon_cd, 0);
        assert_eq!(world.ships[0].rum, MAX_RUM - 1);
    }

    #[test]
    fn cannon_needs_two_turns_to_reload() {
        let mut world = World::new();
        let id = ship(&mut world, Coord::new(5, 5), 0, 0);
        let target = Coord::new(16, 5);
        let fire = [orders(&[(id, Command::Fire(target))]), orders(&[])];
        resolve(&mut world, &fire);
        assert_eq!(world.cannonballs.len(), 1);
        resolve(&mut world, &fire);
        assert_eq!(world.cannonballs.len(), 1, "still reloading");
        resolve(&mut world, &fire);
        assert_eq!(world.cannonballs.len(), 2);
    }

    #[test]
    fn mine_goes_one_cell_past_the_stern() {
        let mut world = World::new();
        let id = ship(&mut world, Coord::new(5, 5), 0, 0);
        resolve(&mut world, &[orders(&[(id, Command::Mine)]), orders(&[])]);
        assert_eq!(world.mines.len(), 1);
        // Stern is (4,5); one more step west is (3,5).
        assert_eq!(world.mines[0].pos, Coord::new(3, 5));
        assert_eq!(world.ships[0].mine_cd, MINE_COOLDOWN - 1);
    }

    #[test]
    fn blocked_mine_drop_keeps_the_rack_ready() {
        let mut world = World::new();
        let id = ship(&mut world, Coord::new(5, 5), 0, 0);
        barrel(&mut world, Coord::new(3, 5), 10); // occupies the drop cell
        resolve(&mut world, &[orders(&[(id, Command::Mine)]), orders(&[])]);
        assert!(world.mines.is_empty());
        assert_eq!(world.ships[0].mine_cd, 0, "cooldown untouched");
    }

    #[test]
    fn mine_drop_off_the_map_is_ignored() {
        let mut world = World::new();
        let id = ship(&mut world, Coord::new(1, 5), 0, 0);
        // Stern (0,5), drop cell (-1,5): off the map.
        resolve(&mut world, &[orders(&[(id, Command::Mine)]), orders(&[])]);
        assert!(world.mines.is_empty());
        assert_eq!(world.ships[0].mine_cd, 0);
    }

    #[test]
    fn ship_advances_speed_cells() {
        let mut world = World::new();
        let id = ship(&mut world, Coord::new(5, 5), 0, 0);
        world.ships[0].speed = 2;
        resolve(&mut world, &[orders(&[(id, Command::Wait)]), orders(&[])]);
        assert_eq!(world.ships[0].pos, Coord::new(7, 5));
    }

    #[test]
    fn ship_stops_at_the_map_edge() {
        let mut world = World::new();
        let id = ship(&mut world, Coord::new(21, 5), 0, 0);
        world.ships[0].speed = 2;
        resolve(&mut world, &[orders(&[(id, Command::Wait)]), orders(&[])]);
        // One step to x=22 is legal, the second leaves the board.
        assert_eq!(world.ships[0].pos, Coord::new(22, 5));
        assert_eq!(world.ships[0].speed, 0);
    }

    #[test]
    fn head_on_ships_both_stop_in_place() {
        let mut world = World::new();
        let a = ship(&mut world, Coord::new(5, 5), 0, 0);
        let b = ship(&mut world, Coord::new(9, 5), 3, 1);
        world.ships[0].speed = 1;
        world.ships[1].speed = 1;
        resolve(
            &mut world,
            &[orders(&[(a, Command::Wait)]), orders(&[(b, Command::Wait)])],
        );
        assert_eq!(world.ships[0].pos, Coord::new(5, 5));
        assert_eq!(world.ships[1].pos, Coord::new(9, 5));
        assert_eq!(world.ships[0].speed, 0);
        assert_eq!(world.ships[1].speed, 0);
    }

    #[test]
    fn blocked_ship_cascades_into_blocking_the_next() {
        // A column of two movers where the front one is blocked by a
        // stationary hull; the rollback must propagate to the rear mover.
        let mut world = World::new();
        let front = ship(&mut world, Coord::new(8, 5), 0, 0);
        let rear = ship(&mut world, Coord::new(5, 5), 0, 0);
        ship(&mut world, Coord::new(11, 5), 0, 1); // stationary, stern on (10,5)
        world.ships[0].speed = 1;
        world.ships[1].speed = 1;
        resolve(
            &mut world,
            &[
                orders(&[(front, Command::Wait), (rear, Command::Wait)]),
                orders(&[]),
            ],
        );
        let front_ship = world.ships.iter().find(|s| s.id == front).unwrap();
        let rear_ship = world.ships.iter().find(|s| s.id == rear).unwrap();
        assert_eq!(front_ship.pos, Coord::new(8, 5));
        assert_eq!(front_ship.speed, 0);
        assert_eq!(rear_ship.pos, Coord::new(5, 5), "rollback cascades");
        assert_eq!(rear_ship.speed, 0);
    }

    #[test]
    fn no_two_hulls_overlap_after_resolution() {
        let mut world = World::new();
        let a = ship(&mut world, Coord::new(5, 5), 0, 0);
        let b = ship(&mut world, Coord::new(9, 5), 3, 1);
        let c = ship(&mut world, Coord::new(7, 8), 1, 1);
        world.ships.iter_mut().for_each(|s| s.speed = 2);
        resolve(
            &mut world,
            &[
                orders(&[(a, Command::Wait)]),
                orders(&[(b, Command::Port), (c, Command::Wait)]),
            ],
        );
        for s in &world.ships {
            for t in &world.ships {
                if s.id != t.id {
                    assert!(
                        !s.occupies(t.pos) && !s.occupies(t.bow()) && !s.occupies(t.stern()),
                        "ships {} and {} overlap",
                        s.id,
                        t.id
                    );
                }
            }
        }
    }

    #[test]
    fn sailing_over_a_barrel_collects_it() {
        let mut world = World::new();
        let id = ship(&mut world, Coord::new(5, 5), 0, 0);
        world.ships[0].rum = 80;
        world.ships[0].speed = 2;
        barrel(&mut world, Coord::new(8, 5), 15);
        resolve(&mut world, &[orders(&[(id, Command::Wait)]), orders(&[])]);
        // 80 - 1 (turn) + 15 (barrel) = 94; picked up during the second
        // movement sub-phase when the bow reaches (8,5).
        assert_eq!(world.ships[0].rum, 94);
        assert!(world.barrels.is_empty());
    }

    #[test]
    fn barrel_pickup_caps_at_max_rum() {
        let mut world = World::new();
        let id = ship(&mut world, Coord::new(5, 5), 0, 0);
        world.ships[0].speed = 1;
        barrel(&mut world, Coord::new(7, 5), 50);
        resolve(&mut world, &[orders(&[(id, Command::Wait)]), orders(&[])]);
        assert_eq!(world.ships[0].rum, MAX_RUM);
    }

    #[test]
    fn sailing_into_a_mine_hurts_and_splashes_the_neighbors() {
        let mut world = World::new();
        let a = ship(&mut world, Coord::new(5, 5), 0, 0);
        ship(&mut world, Coord::new(8, 6), 3, 1); // close enough for splash
        world.ships[0].speed = 1;
        mine(&mut world, Coord::new(7, 5));
        resolve(&mut world, &[orders(&[(a, Command::Wait)]), orders(&[])]);
        assert!(world.mines.is_empty());
        assert_eq!(world.ships[0].rum, MAX_RUM - 1 - MINE_DAMAGE);
        assert_eq!(world.ships[1].rum, MAX_RUM - 1 - SPLASH_DAMAGE);
    }

    #[test]
    fn rotation_turns_one_step() {
        let mut world = World::new();
        let a = ship(&mut world, Coord::new(5, 5), 0, 0);
        resolve(&mut world, &[orders(&[(a, Command::Port)]), orders(&[])]);
        assert_eq!(world.ships[0].angle, 1);
        resolve(&mut world, &[orders(&[(a, Command::Starboard)]), orders(&[])]);
        resolve(&mut world, &[orders(&[(a, Command::Starboard)]), orders(&[])]);
        assert_eq!(world.ships[0].angle, 5);
    }

    #[test]
    fn blocked_rotation_reverts_angle_and_kills_speed() {
        let mut world = World::new();
        let a = ship(&mut world, Coord::new(4, 6), 0, 0);
        ship(&mut world, Coord::new(6, 5), 3, 1);
        world.ships[0].speed = 1;
        // After advancing to (5,6), turning to port would sweep the bow
        // onto the other hull at (5,5).
        resolve(&mut world, &[orders(&[(a, Command::Port)]), orders(&[])]);
        let s = world.ships[0];
        assert_eq!(s.pos, Coord::new(5, 6), "movement still happened");
        assert_eq!(s.angle, 0, "rotation reverted");
        assert_eq!(s.speed, 0, "collision kills the momentum");
    }

    #[test]
    fn rotation_sweeps_barrels_at_bow_and_stern() {
        let mut world = World::new();
        let a = ship(&mut world, Coord::new(5, 4), 0, 0);
        world.ships[0].rum = 50;
        // After PORT the new bow is neighbor(5,4 @ angle 1) = (5,3).
        barrel(&mut world, Coord::new(5, 3), 20);
        resolve(&mut world, &[orders(&[(a, Command::Port)]), orders(&[])]);
        assert_eq!(world.ships[0].angle, 1);
        assert_eq!(world.ships[0].rum, 50 - 1 + 20);
        assert!(world.barrels.is_empty());
    }

    #[test]
    fn cannonball_lands_after_its_fuse() {
        let mut world = World::new();
        ship(&mut world, Coord::new(5, 5), 0, 0);
        let id = world.alloc_id();
        world.cannonballs.push(Cannonball {
            id,
            shooter: 99,
            target: Coord::new(5, 5),
            turns: 2,
        });
        resolve(&mut world, &wait_all());
        assert_eq!(world.ships[0].rum, MAX_RUM - 1, "still in flight");
        resolve(&mut world, &wait_all());
        assert_eq!(world.ships[0].rum, MAX_RUM - 2 - 50);
        assert!(world.cannonballs.is_empty());
    }

    #[test]
    fn sinking_ship_drops_capped_loot() {
        let mut world = World::new();
        ship(&mut world, Coord::new(5, 5), 0, 0);
        world.ships[0].rum = 40;
        let id = world.alloc_id();
        world.cannonballs.push(Cannonball {
            id,
            shooter: 99,
            target: Coord::new(5, 5),
            turns: 1,
        });
        resolve(&mut world, &wait_all());
        // 40 - 1 - 50 sinks the ship; the barrel holds min(30, 40).
        assert!(world.ships.is_empty());
        assert_eq!(world.barrels.len(), 1);
        assert_eq!(world.barrels[0].rum, MAX_LOOT_DROP);
        assert_eq!(world.barrels[0].pos, Coord::new(5, 5));
    }

    #[test]
    fn ship_sunk_with_one_rum_still_drops_it() {
        let mut world = World::new();
        ship(&mut world, Coord::new(5, 5), 0, 0);
        world.ships[0].rum = 1;
        resolve(&mut world, &wait_all());
        assert!(world.ships.is_empty());
        assert_eq!(world.barrels.len(), 1);
        assert_eq!(world.barrels[0].rum, 1);
    }

    #[test]
    fn empty_ship_drops_nothing() {
        let mut world = World::new();
        ship(&mut world, Coord::new(5, 5), 0, 0);
        world.ships[0].rum = 0;
        resolve(&mut world, &wait_all());
        assert!(world.ships.is_empty());
        assert!(world.barrels.is_empty());
    }
}
