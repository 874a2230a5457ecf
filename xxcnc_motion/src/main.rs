//! # XXCNC Motion
//!
//! Loads a machine file, builds the motion orchestrator, enables all axes
//! and executes a sequence of linear moves on the fixed-period cycle runner.
//! The final status snapshot is printed as JSON on stdout.
//!
//! ```text
//! xxcnc_motion config/machine.toml --move X=10,Y=5 --move X=0,Y=0 --feed 1200
//! ```

use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use xxcnc_common::config::LogLevel;
use xxcnc_common::consts::DEFAULT_CONFIG_PATH;
use xxcnc_motion::config::{build_orchestrator, load_config};
use xxcnc_motion::cycle::{CycleRunner, RunOutcome, rt_setup};
use xxcnc_motion::status::StatusBoard;

/// XXCNC Motion: time-quantized multi-axis interpolation
#[derive(Parser, Debug)]
#[command(name = "xxcnc_motion")]
#[command(author = "XXCNC")]
#[command(version)]
#[command(about = "Plans and executes linear moves on simulated axes")]
struct Args {
    /// Path to the machine TOML file.
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Linear move target, e.g. `X=10,Y=5`. Repeat for a sequence.
    #[arg(long = "move", value_name = "AXIS=POS,...", value_parser = parse_move)]
    moves: Vec<BTreeMap<String, f64>>,

    /// Feed rate [mm/min].
    #[arg(long, default_value_t = 1000.0)]
    feed: f64,

    /// Cycle budget per move.
    #[arg(long, default_value_t = 600_000)]
    max_cycles: u64,

    /// CPU core to pin the RT thread to (default: 1).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (default: 80).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose (debug) logging.
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            setup_tracing(&args, LogLevel::default());
            error!("FATAL: {e}");
            process::exit(1);
        }
    };
    setup_tracing(&args, config.shared.log_level);

    info!(
        "{} v{} starting ({} axes)",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION"),
        config.axes.len()
    );

    let orchestrator = match build_orchestrator(&config) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            error!("FATAL: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run(&args, CycleRunner::new(orchestrator, StatusBoard::new())) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("shutdown complete");
}

fn run(args: &Args, mut runner: CycleRunner) -> Result<(), Box<dyn std::error::Error>> {
    if !runner.orchestrator.enable_all_axes() {
        return Err("failed to enable all axes".into());
    }

    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        args.cpu_core, args.rt_priority
    );

    for (index, targets) in args.moves.iter().enumerate() {
        if !runner.orchestrator.move_linear(targets, args.feed) {
            return Err(format!("move {} rejected: {targets:?}", index + 1).into());
        }
        match runner.run(args.max_cycles)? {
            RunOutcome::Completed { cycles } => {
                info!("move {} complete after {cycles} cycles", index + 1);
            }
            RunOutcome::BudgetExhausted { cycles } => {
                warn!("move {} still active after {cycles} cycles", index + 1);
                runner.orchestrator.emergency_stop();
            }
        }
    }

    let stats = &runner.stats;
    info!(
        "cycles={} avg={}ns max={}ns overruns={}",
        stats.cycle_count,
        stats.avg_cycle_ns(),
        stats.max_cycle_ns,
        stats.overruns
    );

    println!("{}", serde_json::to_string_pretty(&runner.orchestrator.status())?);
    Ok(())
}

/// Parse `X=10,Y=5` into an axis → target map.
fn parse_move(arg: &str) -> Result<BTreeMap<String, f64>, String> {
    let mut targets = BTreeMap::new();
    for pair in arg.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected AXIS=POS, got '{pair}'"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing axis name in '{pair}'"));
        }
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|e| format!("invalid position for {name}: {e}"))?;
        if !value.is_finite() {
            return Err(format!("position for {name} must be finite"));
        }
        if targets.insert(name.to_string(), value).is_some() {
            return Err(format!("axis {name} given twice"));
        }
    }
    if targets.is_empty() {
        return Err("move has no targets".to_string());
    }
    Ok(targets)
}

/// Setup tracing subscriber from CLI flags and the configured level.
fn setup_tracing(args: &Args, level: LogLevel) {
    let directive = if args.verbose {
        "debug"
    } else {
        level.as_directive()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        directive
            .parse()
            .unwrap_or_else(|_| tracing::Level::INFO.into()),
    );

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
