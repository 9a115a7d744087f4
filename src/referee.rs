//! Drives a single round: feeds both bots each turn, collects their orders
//! under the time budget, applies the simulation, and decides the outcome.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, instrument, trace, warn};

use crate::channel::BotProcess;
use crate::command::CommandSet;
use crate::configuration::ArenaConfig;
use crate::protocol::{self, MatchError};
use crate::simulation;
use crate::world::{PlayerId, World};

/// How a round ended, before any player-order swap is undone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The given player won.
    Win(PlayerId),
    /// Nobody did.
    Draw,
}

/// Referee of one round between two bot processes.
///
/// A player is terminated when its reply times out, is invalid, or its I/O
/// channel breaks, and when it has no ships left after a resolution step.
/// The round ends the moment at most one process is still alive, or at the
/// turn limit by comparing rum totals.
pub struct Referee<'a> {
    config: &'a ArenaConfig,
    bots: [BotProcess; 2],
    world: World,
}

impl<'a> Referee<'a> {
    /// Spawn both bot processes for a round played on `world`.
    pub fn new(
        config: &'a ArenaConfig,
        paths: [&Path; 2],
        world: World,
    ) -> anyhow::Result<Referee<'a>> {
        let bots = [
            BotProcess::spawn(paths[0], config.shutdown_grace)?,
            BotProcess::spawn(paths[1], config.shutdown_grace)?,
        ];
        Ok(Referee {
            config,
            bots,
            world,
        })
    }

    /// Play the round to its end.
    #[instrument(skip(self))]
    pub fn run(mut self) -> Outcome {
        let mut turn = 0u32;
        loop {
            turn += 1;
            let mut orders = [CommandSet::new(), CommandSet::new()];
            for player in 0..2 {
                if !self.bots[player].is_alive() {
                    continue;
                }
                match self.collect_orders(player, turn) {
                    Ok(set) => orders[player] = set,
                    Err(e) => {
                        warn!(player, turn, error = %e, "terminating bot");
                        self.bots[player].shutdown();
                    }
                }
            }
            for player in 0..2 {
                self.drain_stderr(player);
            }
            if let Some(outcome) = self.survivor() {
                trace!(turn, ?outcome, "round over");
                return outcome;
            }

            simulation::resolve(&mut self.world, &orders);

            for player in 0..2 {
                if self.world.fleet_size(player) == 0 {
                    self.bots[player].shutdown();
                }
            }
            if let Some(outcome) = self.survivor() {
                trace!(turn, ?outcome, "round over");
                return outcome;
            }
            if turn == self.config.max_turns {
                let outcome = self.rum_verdict();
                trace!(turn, ?outcome, "turn limit reached");
                return outcome;
            }
        }
    }

    /// Send the turn input and poll for a complete, valid reply within the
    /// budget.
    fn collect_orders(&mut self, player: PlayerId, turn: u32) -> Result<CommandSet, MatchError> {
        let view = protocol::render_view(&self.world, player);
        self.bots[player]
            .feed(&view)
            .map_err(MatchError::ChannelWrite)?;

        let budget = if turn == 1 {
            self.config.first_turn_budget
        } else {
            self.config.turn_budget
        };
        let deadline = Instant::now() + budget;
        let mut reply = String::new();
        while !protocol::reply_complete(&self.world, player, &reply) {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return Err(MatchError::Timeout);
            };
            let chunk = self.bots[player]
                .read_for(remaining)
                .map_err(MatchError::ChannelRead)?;
            reply.push_str(&chunk);
        }
        protocol::parse_orders(&self.world, player, &reply)
    }

    /// Keep the bot's stderr pipe empty; a stalled bot must never be the
    /// referee's fault.
    fn drain_stderr(&mut self, player: PlayerId) {
        let text = self.bots[player].read_stderr();
        if self.config.debug_bot_stderr && !text.is_empty() {
            debug!(player, bot_stderr = %text);
        }
    }

    /// `Some(outcome)` once at most one process is still alive.
    fn survivor(&mut self) -> Option<Outcome> {
        match [self.bots[0].is_alive(), self.bots[1].is_alive()] {
            [true, false] => Some(Outcome::Win(0)),
            [false, true] => Some(Outcome::Win(1)),
            [false, false] => Some(Outcome::Draw),
            [true, true] => None,
        }
    }

    /// Settle an undecided round by total remaining rum.
    fn rum_verdict(&self) -> Outcome {
        let totals = [self.world.total_rum(0), self.world.total_rum(1)];
        if totals[0] > totals[1] {
            Outcome::Win(0)
        } else if totals[1] > totals[0] {
            Outcome::Win(1)
        } else {
            Outcome::Draw
        }
    }
}
