//! Parallel round execution and the running win-probability estimate.
//!
//! Workers are plain threads looping over fully independent rounds; the
//! only shared state is a handful of atomic counters and the cooperative
//! cancellation flag. Reporting happens one line at a time but is not
//! ordered across workers.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

use anyhow::ensure;
use tracing::{error, info, instrument};

use crate::configuration::ArenaConfig;
use crate::logger::init_logger;
use crate::referee::Outcome;
use crate::round;

/// Win/draw tallies shared by all workers.
///
/// Points are counted in half-point units (a win is two, a draw one each)
/// so they stay in plain atomic integers.
#[derive(Debug, Default)]
pub struct ArenaStats {
    games: AtomicU64,
    draws: AtomicU64,
    half_points: [AtomicU64; 2],
}

impl ArenaStats {
    /// Fold one finished round into the tallies and return the estimate
    /// including it.
    pub fn record(&self, outcome: Outcome) -> Estimate {
        match outcome {
            Outcome::Draw => {
                self.draws.fetch_add(1, Ordering::Relaxed);
                self.half_points[0].fetch_add(1, Ordering::Relaxed);
                self.half_points[1].fetch_add(1, Ordering::Relaxed);
            }
            Outcome::Win(player) => {
                self.half_points[player].fetch_add(2, Ordering::Relaxed);
            }
        }
        self.games.fetch_add(1, Ordering::Relaxed);
        self.estimate()
    }

    /// Snapshot the current estimate.
    pub fn estimate(&self) -> Estimate {
        Estimate::from_counts(
            self.games.load(Ordering::Relaxed),
            self.draws.load(Ordering::Relaxed),
            self.half_points[0].load(Ordering::Relaxed),
        )
    }
}

/// Running estimate of how much better the first bot is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Estimate {
    /// Rounds played.
    pub games: u64,
    /// Rounds drawn.
    pub draws: u64,
    /// Observed win fraction of the first bot, draws counting one half.
    pub p: f64,
    /// Standard error of `p`.
    pub sigma: f64,
    /// Normal-approximation probability that the first bot's true win rate
    /// exceeds one half.
    pub better: f64,
}

impl Estimate {
    /// The closed-form Wald estimate from raw tallies.
    pub fn from_counts(games: u64, draws: u64, half_points: u64) -> Estimate {
        let p = half_points as f64 / 2.0 / games as f64;
        let sigma = (p * (1.0 - p) / games as f64).sqrt();
        let better = 0.5 + 0.5 * libm::erf((p - 0.5) / (sigma * std::f64::consts::SQRT_2));
        Estimate {
            games,
            draws,
            p,
            sigma,
            better,
        }
    }
}

/// Pits two bot executables against each other over many randomized rounds.
pub struct Arena {
    config: ArenaConfig,
    bots: [PathBuf; 2],
}

impl Arena {
    /// Create an arena for the two executables.
    pub fn new(config: ArenaConfig, bot_a: PathBuf, bot_b: PathBuf) -> Arena {
        if config.log {
            init_logger();
        }
        Arena {
            config,
            bots: [bot_a, bot_b],
        }
    }

    /// Run rounds on a pool of worker threads until `cancel` is set, then
    /// return the final estimate.
    ///
    /// Each worker finishes the round it is playing before exiting; no
    /// round is interrupted mid-resolution.
    ///
    /// # Errors
    /// Fails up front when either executable is missing.
    #[instrument(skip_all)]
    pub fn run(&self, cancel: &AtomicBool) -> anyhow::Result<Estimate> {
        for bot in &self.bots {
            ensure!(bot.is_file(), "bot {} couldn't be found", bot.display());
        }

        let workers = self.config.workers.max(1).min(2 * num_cpus::get());
        info!(workers, "arena started");
        let stats = ArenaStats::default();
        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| self.worker_loop(&stats, cancel));
            }
        });
        Ok(stats.estimate())
    }

    fn worker_loop(&self, stats: &ArenaStats, cancel: &AtomicBool) {
        let mut rng = rand::thread_rng();
        while !cancel.load(Ordering::Relaxed) {
            match round::play_round(&self.config, &self.bots, &mut rng) {
                Ok(outcome) => {
                    let estimate = stats.record(outcome);
                    if self.config.verbose {
                        self.report(&estimate);
                    }
                }
                Err(e) => {
                    // Round-level failures (e.g. a failed spawn) are logged
                    // and the worker moves on to the next round.
                    error!("round failed: {e:#}");
                }
            }
        }
    }

    fn report(&self, estimate: &Estimate) {
        println!(
            "Wins: {:.2}% +- {:.2}%  Rounds: {}  Draws: {}  {:.2}% chance that {} is better",
            100.0 * estimate.p,
            100.0 * estimate.sigma,
            estimate.games,
            estimate.draws,
            100.0 * estimate.better,
            self.bots[0].display()
        );
    }
}
