// SyncSPI - Interrupt-Driven USART SPI Master
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use syncspi_config::LinkManifest;
use syncspi_sim::{CycleCapture, LinkMetrics, SimError, StopCondition, StopReason};

mod report;

const EXIT_PASS: u8 = 0;
const EXIT_ASSERT_FAIL: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Interrupt-driven USART SPI master link simulator",
    long_about = None
)]
struct Cli {
    /// Enable per-event tracing
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Boot the link and run it until enough receive cycles complete.
    Run(RunArgs),

    /// Parse and validate a link manifest without running it.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Path to the link manifest (YAML). Built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Receive cycles to complete (overrides limits.rx_cycles)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    cycles: Option<u64>,

    /// Bit-clock budget (overrides limits.max_ticks)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    max_ticks: Option<u64>,

    /// Write a link snapshot (JSON) after the run
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Print a machine-readable result line
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Path to the link manifest (YAML)
    #[arg(short, long)]
    config: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    match cli.command {
        Commands::Run(args) => run_link(args),
        Commands::Check(args) => check_manifest(args),
    }
}

fn load_manifest(path: Option<&PathBuf>) -> anyhow::Result<LinkManifest> {
    match path {
        Some(path) => LinkManifest::from_file(path),
        None => {
            info!("No --config given, using the built-in default link");
            Ok(LinkManifest::default())
        }
    }
}

fn check_manifest(args: CheckArgs) -> ExitCode {
    match LinkManifest::from_file(&args.config) {
        Ok(manifest) => {
            println!(
                "OK: '{}' ({} Hz, {:?}, {:?} slave, {} rx cycle(s) within {} ticks)",
                manifest.name,
                manifest.usart.baud_rate,
                manifest.usart.clock_mode,
                manifest.slave.kind,
                manifest.limits.rx_cycles,
                manifest.limits.max_ticks
            );
            ExitCode::from(EXIT_PASS)
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

fn run_link(args: RunArgs) -> ExitCode {
    let manifest = match load_manifest(args.config.as_ref()) {
        Ok(manifest) => manifest,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let mut sim = match syncspi_sim::from_manifest(&manifest) {
        Ok(sim) => sim,
        Err(e @ SimError::Config(_)) => {
            error!("{}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
        Err(e) => {
            error!("Failed to build link: {}", e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    };

    let metrics = Arc::new(LinkMetrics::new());
    let capture = Arc::new(CycleCapture::receive());
    sim.add_observer(metrics.clone());
    sim.add_observer(capture.clone());

    if let Err(e) = sim.boot() {
        error!("Boot failed: {}", e);
        return ExitCode::from(EXIT_RUNTIME_ERROR);
    }

    let mut stop = StopCondition::from(manifest.limits);
    if let Some(cycles) = args.cycles {
        stop.rx_cycles = cycles;
    }
    if let Some(max_ticks) = args.max_ticks {
        stop.max_ticks = max_ticks;
    }

    info!(
        "Running '{}' for {} rx cycle(s), at most {} ticks",
        manifest.name, stop.rx_cycles, stop.max_ticks
    );
    let summary = match sim.run(stop) {
        Ok(summary) => summary,
        Err(e) => {
            error!("Simulation failed: {}", e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    };

    let cycles = capture.cycles();
    for (i, cycle) in cycles.iter().enumerate() {
        println!("rx cycle {}: {}", i + 1, report::hex_bytes(cycle));
    }

    let counters = sim.port().counters();
    info!(
        "Frames: {}, TX overflows: {}, RX overruns: {}, RX underflows: {}",
        counters.frames, counters.tx_overflows, counters.rx_overruns, counters.rx_underflows
    );
    info!(
        "Link time: {} ns, handler rate: {:.2} events/s",
        summary.elapsed_ns,
        metrics.get_events_per_sec()
    );

    if let Some(path) = &args.snapshot {
        let snapshot = sim.snapshot().with_metrics(metrics.report());
        if let Err(e) = report::write_snapshot(path, &snapshot) {
            error!("{:#}", e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
        info!("Snapshot written to {:?}", path);
    }

    if args.json {
        let run_report = report::RunReport::new(
            &manifest.name,
            sim.port().achieved_baud_rate().unwrap_or(0),
            &summary,
            counters,
            &cycles,
        );
        match serde_json::to_string(&run_report) {
            Ok(line) => println!("{}", line),
            Err(e) => {
                error!("Failed to serialize result: {}", e);
                return ExitCode::from(EXIT_RUNTIME_ERROR);
            }
        }
    }

    match summary.stop_reason {
        StopReason::RxCyclesReached => ExitCode::from(EXIT_PASS),
        StopReason::MaxTicks => {
            error!(
                "Stop condition not reached: {} of {} rx cycle(s) after {} ticks",
                capture.len(),
                stop.rx_cycles,
                summary.ticks
            );
            ExitCode::from(EXIT_ASSERT_FAIL)
        }
    }
}
