//! geoalarm command line
//!
//! Reads `lat, lon[, accuracy_m]` fixes (one per line) from stdin or a file, feeds them to a
//! proximity monitor and prints every monitor event as a JSON line on stdout.
//! Logs go to stderr; set `RUST_LOG` to change the level.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{crate_description, crate_name, crate_version, Parser};
use tracing::{error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use geoalarm::{
    watch, AlarmConfig, AlarmError, AlarmResult, LineSource, LogAlerter, MonitorEvent, MonitorStream,
    ProximityMonitor, RetriggerPolicy,
};

/// How often to check whether the input has run dry while waiting for events.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Exit status when the input ends before the target is reached.
const NOT_ARRIVED: u8 = 2;

#[derive(Parser)]
#[command(name = crate_name!(), version = crate_version!(), about = crate_description!())]
struct Opts {
    /// Target location as "latitude, longitude".
    #[clap(short, long, allow_hyphen_values = true)]
    target: String,
    /// Start with the alarm disabled.
    #[clap(long)]
    disarmed: bool,
    /// Read fixes from this file instead of stdin.
    #[clap(short, long)]
    input: Option<PathBuf>,
    /// JSON configuration file.
    #[clap(short, long)]
    config: Option<PathBuf>,
    /// Minimum movement in metres between delivered fixes (overrides config).
    #[clap(short = 'f', long)]
    distance_filter: Option<f64>,
    /// Alert on every fix inside the radius instead of once.
    #[clap(long)]
    every_sample: bool,
    /// Keep reading after the first arrival.
    #[clap(short, long)]
    keep_going: bool,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match run(&Opts::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(NOT_ARRIVED),
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(opts: &Opts) -> AlarmResult<AlarmConfig> {
    let mut cfg = match &opts.config {
        Some(path) => AlarmConfig::load(path)?,
        None => AlarmConfig::default(),
    };
    if let Some(m) = opts.distance_filter {
        cfg.watch.distance_filter_m = m;
    }
    if opts.every_sample {
        cfg.monitor.retrigger = RetriggerPolicy::EverySample;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn open_input(opts: &Opts) -> AlarmResult<Box<dyn BufRead + Send>> {
    Ok(match &opts.input {
        Some(path) => {
            let file = File::open(path)
                .map_err(|e| AlarmError::config(format!("cannot open {}: {e}", path.display())))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin())),
    })
}

/// Returns whether the target was reached.
fn run(opts: &Opts) -> AlarmResult<bool> {
    let cfg = load_config(opts)?;
    let input = open_input(opts)?;

    let (monitor, events) = ProximityMonitor::start(cfg.monitor.clone(), Box::new(LogAlerter::new()))?;
    let target = monitor.set_target_text(&opts.target)?;
    monitor.set_armed(!opts.disarmed)?;
    info!(%target, armed = !opts.disarmed, "monitoring");

    let handle = watch(LineSource::new(input), cfg.watch.clone(), monitor.feed())?;

    let mut out = io::stdout().lock();
    let mut arrived = false;
    loop {
        match events.recv_timeout(POLL_INTERVAL) {
            Ok(event) => {
                if report(&mut out, &monitor, &event, &mut arrived)? && !opts.keep_going {
                    break;
                }
            }
            Err(e) if e.is_retryable() => {
                if handle.is_finished() {
                    drain(&mut out, &monitor, &events, &mut arrived, opts.keep_going)?;
                    break;
                }
            }
            Err(e) => return Err(e),
        }
    }

    drop(handle);
    monitor.stop()?;
    Ok(arrived)
}

/// Report everything the monitor produced for input that was already queued.
fn drain(
    out: &mut impl Write,
    monitor: &ProximityMonitor,
    events: &MonitorStream,
    arrived: &mut bool,
    keep_going: bool,
) -> AlarmResult<()> {
    // Queued behind every fix the watch delivered.
    monitor.snapshot()?;
    while let Some(event) = events.try_recv()? {
        if report(out, monitor, &event, arrived)? && !keep_going {
            break;
        }
    }
    Ok(())
}

/// Print an event; acknowledge arrivals. Returns true for an arrival.
fn report(
    out: &mut impl Write,
    monitor: &ProximityMonitor,
    event: &MonitorEvent,
    arrived: &mut bool,
) -> AlarmResult<bool> {
    let line = serde_json::to_string(event).map_err(|e| AlarmError::internal(e.to_string()))?;
    writeln!(out, "{line}").map_err(|e| AlarmError::internal(format!("stdout: {e}")))?;

    if event.arrival().is_none() {
        return Ok(false);
    }
    *arrived = true;
    monitor.acknowledge()?;
    Ok(true)
}
