use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use corsair_arena::prelude::*;

/// Pit two bot executables against each other over endless randomized
/// rounds and report the running win estimate. Interrupt with Ctrl-C.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the first bot executable
    bot_a: PathBuf,
    /// Path to the second bot executable
    bot_b: PathBuf,
    /// Number of parallel arena workers
    #[arg(short = 't', long, default_value_t = 1)]
    workers: usize,
    /// Write a trace log file next to the binary
    #[arg(long)]
    log: bool,
    /// Forward bot stderr to the log
    #[arg(long)]
    debug_bots: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ArenaConfig::from_env()
        .with_workers(cli.workers)
        .with_log(cli.log)
        .with_debug_bot_stderr(cli.debug_bots);

    eprintln!(
        "Testing {} vs {}",
        cli.bot_a.display(),
        cli.bot_b.display()
    );

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.store(true, Ordering::Relaxed))?;
    }

    let arena = Arena::new(config, cli.bot_a, cli.bot_b);
    let estimate = arena.run(&cancel)?;
    eprintln!(
        "Final: {} rounds, {} draws, p = {:.4} +- {:.4}",
        estimate.games, estimate.draws, estimate.p, estimate.sigma
    );
    Ok(())
}
