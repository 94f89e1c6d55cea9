//! # Spatial Eye Scanner
//!
//! Runs one scan against a registered driver and reports the result.
//!
//! # Usage
//!
//! ```bash
//! # Full scan with the simulation driver and default settings
//! eye_scanner
//!
//! # Two cycles from a config file, streaming points as JSON lines
//! eye_scanner --config scanner.toml --cycles 2 --emit
//!
//! # Verbose JSON logs
//! eye_scanner -v --json
//! ```

use clap::Parser;
use eye_common::config::{LogLevel, ScannerConfig, load_scanner_config};
use eye_common::scan::{Point, ScanProgress, ScanState};
use eye_hal::{DriverRegistry, register_all_drivers};
use eye_scanner::ScanEngine;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Spatial Eye Scanner - 3D point cloud acquisition
#[derive(Parser, Debug)]
#[command(name = "eye_scanner")]
#[command(version)]
#[command(about = "Sweeps a time-of-flight sensor over two axes and builds a point cloud")]
struct Args {
    /// Scanner configuration file (TOML). Defaults apply when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Driver providing the scanner capabilities.
    #[arg(short, long, default_value = eye_hal::drivers::simulation::DRIVER_NAME)]
    driver: String,

    /// Override the number of cycles to scan.
    #[arg(long)]
    cycles: Option<u32>,

    /// Write point batches and progress as JSON lines to stdout.
    #[arg(long)]
    emit: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

/// One line of `--emit` output.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Event<'a> {
    Points { points: &'a [Point] },
    Progress { progress: &'a ScanProgress },
    State { state: ScanState },
}

fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            setup_tracing(&args, LogLevel::default());
            error!("FATAL: {e}");
            process::exit(1);
        }
    };
    setup_tracing(&args, config.shared.log_level);

    info!(
        "{} v{} starting...",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = run(&args, config) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Scanner shutdown complete");
}

fn load_config(args: &Args) -> Result<ScannerConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => load_scanner_config(path)?,
        None => ScannerConfig::default(),
    };
    if let Some(cycles) = args.cycles {
        config.scan.cycles = Some(cycles);
        config.validate()?;
    }
    Ok(config)
}

fn run(args: &Args, config: ScannerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = DriverRegistry::new();
    register_all_drivers(&mut registry);
    info!("Available drivers: {:?}", registry.list_drivers());

    let drivers = registry.create(&args.driver, &config.hardware)?;
    let engine = Arc::new(ScanEngine::new(config, drivers));

    if args.emit {
        attach_emitter(&engine);
    }

    let (done_tx, done_rx) = mpsc::channel();
    engine.subscribe_state(move |state| {
        if matches!(state, ScanState::Idle | ScanState::Error) {
            // The receiver is gone only once main stopped waiting.
            let _ = done_tx.send(*state);
        }
        Ok(())
    });

    let stopper = engine.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        stopper.stop_scan();
    })?;

    engine.initialize()?;
    if !engine.start_scan() {
        return Err("scan did not start".into());
    }

    let final_state = wait_for_end(&engine, &done_rx);
    summarize(&engine);
    engine.close()?;

    if final_state == ScanState::Error {
        return Err("scan ended with a hardware fault".into());
    }
    Ok(())
}

/// Block until the scan leaves its active states.
fn wait_for_end(engine: &ScanEngine, done: &mpsc::Receiver<ScanState>) -> ScanState {
    loop {
        match done.recv_timeout(Duration::from_secs(1)) {
            Ok(state) => return state,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                let state = engine.state();
                if !state.is_active() {
                    return state;
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => return engine.state(),
        }
    }
}

fn attach_emitter(engine: &ScanEngine) {
    engine.subscribe_points(|points| emit(&Event::Points { points }));
    engine.subscribe_progress(|progress| emit(&Event::Progress { progress }));
    engine.subscribe_state(|state| emit(&Event::State { state: *state }));
}

fn emit(event: &Event<'_>) -> Result<(), eye_scanner::ListenerError> {
    let line = serde_json::to_string(event)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}")?;
    Ok(())
}

fn summarize(engine: &ScanEngine) {
    let store = engine.point_store();
    let progress = engine.progress();
    info!(
        "Scan summary: {} points, {}/{} cycles ({:.1}%)",
        store.len(),
        progress.current_cycle,
        progress.total_cycles,
        progress.progress_percent
    );
    match (store.bounds(), store.center()) {
        (Some(bounds), Some(center)) => {
            info!("Bounds: min {:?} max {:?}", bounds.min, bounds.max);
            info!("Center: {:?}", center);
        }
        _ => warn!("No points collected"),
    }
}

/// Setup tracing subscriber based on CLI arguments and the config file.
fn setup_tracing(args: &Args, level: LogLevel) {
    let directive = if args.verbose {
        LogLevel::Debug.as_directive()
    } else {
        level.as_directive()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
