//! Config for the arena behaviors
//!
//! This module provides configuration options for controlling how rounds
//! are scheduled and refereed.
//!
//! Configuration can be created programmatically using [`ArenaConfig::new()`]
//! or by reading environment variables using [`ArenaConfig::from_env()`].
//!
//! # Environment Variables
//!
//! The following environment variables can be used to override configuration
//! values. All values are optional. Set flags to `"true"` (case-insensitive)
//! to enable them.
//!
//! - `ARENA_WORKERS` (usize) — Number of parallel arena workers (default: `1`)
//! - `ARENA_FIRST_TURN_MS` (u64) — Reply budget on the first turn, in milliseconds (default: `1000`)
//! - `ARENA_TURN_MS` (u64) — Reply budget on every later turn, in milliseconds (default: `50`)
//! - `ARENA_MAX_TURNS` (u32) — Turn count at which rum totals decide the round (default: `200`)
//! - `ARENA_VERBOSE` — Print the running estimate after every round (default: `true`)
//! - `ARENA_LOG` — Enable logging to a file (default: `false`)
//! - `ARENA_DEBUG_BOT_STDERR` — Forward bot stderr to the log for debugging (default: `false`)

use std::time::Duration;

/// Configuration for arena behaviors.
#[derive(Debug, Clone, Copy)]
pub struct ArenaConfig {
    pub(crate) workers: usize,
    pub(crate) first_turn_budget: Duration,
    pub(crate) turn_budget: Duration,
    pub(crate) max_turns: u32,
    pub(crate) shutdown_grace: Duration,
    pub(crate) verbose: bool,
    pub(crate) log: bool,
    pub(crate) debug_bot_stderr: bool,
}

impl ArenaConfig {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - One worker runs rounds sequentially.
    /// - Bots get one second to answer the first turn, 50 ms afterwards.
    /// - Rounds are decided by rum totals at turn 200.
    /// - Bots get half a second to exit gracefully before being killed.
    /// - The running estimate is printed to stdout after every round.
    /// - Logging to file is disabled.
    /// - Bot stderr output is discarded.
    pub fn new() -> Self {
        Self {
            workers: 1,
            first_turn_budget: Duration::from_secs(1),
            turn_budget: Duration::from_millis(50),
            max_turns: 200,
            shutdown_grace: Duration::from_millis(500),
            verbose: true,
            log: false,
            debug_bot_stderr: false,
        }
    }

    /// Create configuration from environment variables, falling back to the
    /// defaults of [`ArenaConfig::new()`] for anything unset or unparsable.
    ///
    /// See the module documentation for the recognized variables.
    pub fn from_env() -> Self {
        fn get_env_flag(var: &str, default: bool) -> bool {
            match std::env::var(var) {
                Ok(val) => val.eq_ignore_ascii_case("true"),
                Err(_) => default,
            }
        }

        fn get_env_number<T: std::str::FromStr>(var: &str) -> Option<T> {
            std::env::var(var).ok()?.parse().ok()
        }

        let defaults = Self::new();
        Self {
            workers: get_env_number("ARENA_WORKERS").unwrap_or(defaults.workers),
            first_turn_budget: get_env_number("ARENA_FIRST_TURN_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.first_turn_budget),
            turn_budget: get_env_number("ARENA_TURN_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.turn_budget),
            max_turns: get_env_number("ARENA_MAX_TURNS").unwrap_or(defaults.max_turns),
            shutdown_grace: defaults.shutdown_grace,
            verbose: get_env_flag("ARENA_VERBOSE", defaults.verbose),
            log: get_env_flag("ARENA_LOG", defaults.log),
            debug_bot_stderr: get_env_flag("ARENA_DEBUG_BOT_STDERR", defaults.debug_bot_stderr),
        }
    }

    /// Set the number of parallel arena workers.
    ///
    /// The effective count is clamped to twice the machine's CPU count.
    pub fn with_workers(mut self, value: usize) -> Self {
        self.workers = value;
        self
    }

    /// Set the reply budget for the first turn, when bots typically warm up.
    pub fn with_first_turn_budget(mut self, value: Duration) -> Self {
        self.first_turn_budget = value;
        self
    }

    /// Set the reply budget for every turn after the first.
    pub fn with_turn_budget(mut self, value: Duration) -> Self {
        self.turn_budget = value;
        self
    }

    /// Set the turn count at which an undecided round is settled by
    /// comparing rum totals.
    pub fn with_max_turns(mut self, value: u32) -> Self {
        self.max_turns = value;
        self
    }

    /// Set how long a terminated bot gets to exit before being killed.
    pub fn with_shutdown_grace(mut self, value: Duration) -> Self {
        self.shutdown_grace = value;
        self
    }

    /// Enable or disable printing the running estimate after every round.
    pub fn with_verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    /// Enable or disable logging to file.
    pub fn with_log(mut self, value: bool) -> Self {
        self.log = value;
        self
    }

    /// Enable or disable forwarding bot stderr to the log (debug purposes
    /// only).
    pub fn with_debug_bot_stderr(mut self, value: bool) -> Self {
        self.debug_bot_stderr = value;
        self
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new()
    }
}
