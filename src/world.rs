//! Ships, ordnance and loot, and the per-round world state they live in.

use crate::hex::{self, Coord};

/// Identifier of an entity, unique within one round and never reused.
pub type EntityId = i32;
/// Index of a player (0 or 1).
pub type PlayerId = usize;

/// Rum a ship starts with, and the cap after barrel pickups.
pub const MAX_RUM: i32 = 100;
/// Top speed of a ship.
pub const MAX_SPEED: i32 = 2;
/// Maximum firing distance, measured from the bow.
pub const CANNON_RANGE: i32 = 10;
/// Turns before a ship may fire again.
pub const CANNON_COOLDOWN: i32 = 2;
/// Turns before a ship may lay another mine.
pub const MINE_COOLDOWN: i32 = 5;
/// Rum lost to a cannonball landing on the hull center.
pub const DIRECT_HIT_DAMAGE: i32 = 50;
/// Rum lost to a cannonball landing on the bow or stern.
pub const GLANCING_HIT_DAMAGE: i32 = 25;
/// Rum lost when sailing into a mine.
pub const MINE_DAMAGE: i32 = 25;
/// Rum lost to a nearby mine detonation.
pub const SPLASH_DAMAGE: i32 = 10;
/// Hull-to-blast distance within which splash damage applies.
pub const SPLASH_RANGE: i32 = 1;
/// Cap on the rum barrel dropped by a sinking ship.
pub const MAX_LOOT_DROP: i32 = 30;

/// A three-cell ship: center at `pos`, bow and stern one step along the
/// facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ship {
    /// Entity id.
    pub id: EntityId,
    /// Hull center.
    pub pos: Coord,
    /// Facing, `0..6`.
    pub angle: i32,
    /// Cells advanced per turn, `0..=2`.
    pub speed: i32,
    /// Fused health/fuel, `0..=100` at rest (transiently negative while a
    /// turn resolves).
    pub rum: i32,
    /// Owning player.
    pub owner: PlayerId,
    /// Turns left before the cannon is ready.
    pub cannon_cd: i32,
    /// Turns left before the mine rack is ready.
    pub mine_cd: i32,
}

impl Ship {
    /// The cell one step ahead of the center.
    pub fn bow(&self) -> Coord {
        self.pos.neighbor(self.angle)
    }

    /// The cell one step behind the center.
    pub fn stern(&self) -> Coord {
        self.pos.neighbor(hex::opposite(self.angle))
    }

    /// True when `cell` is one of the three hull cells.
    pub fn occupies(&self, cell: Coord) -> bool {
        cell == self.pos || cell == self.bow() || cell == self.stern()
    }

    /// Apply cannonball damage for an impact at `hit`: 50 on the center,
    /// 25 on bow or stern, clamped at zero.
    pub fn direct_hit(&mut self, hit: Coord) {
        if hit == self.pos {
            self.rum = (self.rum - DIRECT_HIT_DAMAGE).max(0);
        } else if hit == self.bow() || hit == self.stern() {
            self.rum = (self.rum - GLANCING_HIT_DAMAGE).max(0);
        }
    }

    /// Apply mine splash damage when any hull cell is within
    /// [`SPLASH_RANGE`] of `blast`. Not clamped; sinking is decided later.
    pub fn splash(&mut self, blast: Coord) {
        if self.pos.distance(blast) <= SPLASH_RANGE
            || self.bow().distance(blast) <= SPLASH_RANGE
            || self.stern().distance(blast) <= SPLASH_RANGE
        {
            self.rum -= SPLASH_DAMAGE;
        }
    }
}

/// A cannonball in flight toward a fixed target cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cannonball {
    /// Entity id.
    pub id: EntityId,
    /// Id of the ship that fired it.
    pub shooter: EntityId,
    /// Impact cell.
    pub target: Coord,
    /// Turns until impact.
    pub turns: i32,
}

/// A naval mine sitting on a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mine {
    /// Entity id.
    pub id: EntityId,
    /// Cell the mine occupies.
    pub pos: Coord,
}

/// A rum barrel floating on a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Barrel {
    /// Entity id.
    pub id: EntityId,
    /// Cell the barrel occupies.
    pub pos: Coord,
    /// Rum recovered on pickup.
    pub rum: i32,
}

/// Full state of one round.
///
/// Mutated only by round setup and [`resolve`](crate::simulation::resolve);
/// everything it contains is plain data, so a clone is an independent world.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct World {
    next_id: EntityId,
    /// Ships of both players.
    pub ships: Vec<Ship>,
    /// Rum barrels.
    pub barrels: Vec<Barrel>,
    /// Mines.
    pub mines: Vec<Mine>,
    /// Cannonballs in flight.
    pub cannonballs: Vec<Cannonball>,
}

impl World {
    /// An empty world with the id counter at zero.
    pub fn new() -> World {
        World::default()
    }

    /// Hand out the next entity id. Ids are never reused within a round.
    pub fn alloc_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// True when no barrel, mine or ship hull occupies `cell`.
    pub fn is_free(&self, cell: Coord) -> bool {
        self.barrels.iter().all(|b| b.pos != cell)
            && self.mines.iter().all(|m| m.pos != cell)
            && self.ships.iter().all(|s| !s.occupies(cell))
    }

    /// Resolve a cannonball impact at `hit`.
    ///
    /// A barrel on the cell absorbs the shot; failing that, a mine on the
    /// cell detonates and splashes every ship in range; otherwise ships take
    /// direct hull damage.
    pub fn blow(&mut self, hit: Coord) {
        if let Some(i) = self.barrels.iter().position(|b| b.pos == hit) {
            self.barrels.remove(i);
        } else if let Some(i) = self.mines.iter().position(|m| m.pos == hit) {
            self.mines.remove(i);
            for ship in &mut self.ships {
                ship.splash(hit);
            }
        } else {
            for ship in &mut self.ships {
                ship.direct_hit(hit);
            }
        }
    }

    /// Drop expired cannonballs and sunk ships.
    pub fn purge(&mut self) {
        self.cannonballs.retain(|c| c.turns > 0);
        self.ships.retain(|s| s.rum > 0);
    }

    /// Ships owned by `player`.
    pub fn ships_of(&self, player: PlayerId) -> impl Iterator<Item = &Ship> {
        self.ships.iter().filter(move |s| s.owner == player)
    }

    /// Number of ships `player` still owns.
    pub fn fleet_size(&self, player: PlayerId) -> usize {
        self.ships_of(player).count()
    }

    /// Total rum across `player`'s ships.
    pub fn total_rum(&self, player: PlayerId) -> i32 {
        self.ships_of(player).map(|s| s.rum).sum()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A stationary full-rum ship for tests.
    pub fn ship(world: &mut World, pos: Coord, angle: i32, owner: PlayerId) -> EntityId {
        let id = world.alloc_id();
        world.ships.push(Ship {
            id,
            pos,
            angle,
            speed: 0,
            rum: MAX_RUM,
            owner,
            cannon_cd: 0,
            mine_cd: 0,
        });
        id
    }

    pub fn barrel(world: &mut World, pos: Coord, rum: i32) {
        let id = world.alloc_id();
        world.barrels.push(Barrel { id, pos, rum });
    }

    pub fn mine(world: &mut World, pos: Coord) {
        let id = world.alloc_id();
        world.mines.push(Mine { id, pos });
    }
}
