//! # Corsair Arena
//!
//! An automated judge for a hex-grid naval-combat game: it pits two
//! externally-built AI executables against each other, runs many randomized
//! rounds in parallel, and keeps a running estimate of which bot is better.
//!
//! Each bot runs as a separate OS process. Every turn it receives the world
//! state it is allowed to see on stdin and must answer with one command per
//! ship within a time budget; a bot that times out, answers garbage or
//! crashes forfeits the round to its opponent. Rounds are mirrored and the
//! starting side is coin-flipped, so the reported win rate is free of
//! first-move bias.
//!
//! # Documentation Overview
//!
//! - For the round scheduling loop and the reported statistic, see the
//!   [`arena`] module.
//! - For the per-turn rules (movement, collisions, mines, cannonballs), see
//!   [`simulation`].
//! - For the wire format bots speak, see [`protocol`].
//! - For tuning time budgets and worker counts, see
//!   [`ArenaConfig`](crate::configuration::ArenaConfig).
//!
//! # Usage Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::sync::atomic::AtomicBool;
//!
//! use corsair_arena::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ArenaConfig::new().with_workers(4);
//!     let arena = Arena::new(
//!         config,
//!         PathBuf::from("./bots/old_bot"),
//!         PathBuf::from("./bots/new_bot"),
//!     );
//!     // Run until the flag is raised (e.g. from a Ctrl-C handler).
//!     let cancel = AtomicBool::new(false);
//!     let estimate = arena.run(&cancel)?;
//!     println!("{} rounds, p = {:.3}", estimate.games, estimate.p);
//!     Ok(())
//! }
//! ```
//!
//! # Bot Requirements
//!
//! A bot is any executable that, in a loop, reads one turn of input from
//! stdin and writes one line per owned ship to stdout:
//!
//! ```text
//! input:  <ownShips> \n <visibleEntities> \n  then one entity per line:
//!         id KIND x y e1 e2 e3 e4        KIND in SHIP MINE CANNONBALL BARREL
//! output: FIRE x y | MINE | PORT | STARBOARD | FASTER | SLOWER | WAIT | MOVE x y
//! ```
//!
//! Replies must land within the configured budget (generous on turn one,
//! tight afterwards). Anything written to stderr is drained, and shown only
//! when stderr debugging is enabled.
#![warn(missing_docs)]

pub use anyhow;

pub mod arena;
pub mod channel;
pub mod command;
pub mod configuration;
pub mod hex;
mod logger;
pub mod protocol;
pub mod referee;
pub mod round;
pub mod simulation;
pub mod world;

/// Commonly used types for quick access.
///
/// ```rust
/// use corsair_arena::prelude::*;
/// ```
pub mod prelude {
    pub use crate::arena::{Arena, ArenaStats, Estimate};
    pub use crate::configuration::ArenaConfig;
    pub use crate::referee::{Outcome, Referee};
}
