//! nimbled - NimbleStroker TCode host runner
//!
//! Streams TCode from standard input into the controller and drives a
//! simulated or recorded actuator link at the configured tick rate.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use nimble_control::NimbleController;
use nimble_link::SimulatedActuator;
use nimble_tcode::{CalibrationStore, MemoryCalibrationStore, MonotonicClock};
use nimbled::input::spawn_stdin_reader;
use nimbled::runner::{self, RunOptions, Ticker};
use nimbled::sink::stdout_sink;
use nimbled::{ActuatorMode, HostTransport, RecordingTransport, load_config, open_calibration};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "nimbled")]
#[command(about = "NimbleStroker TCode host runner")]
#[command(version)]
struct Cli {
    /// YAML controller configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Persist axis calibration in this file instead of memory
    #[arg(long)]
    calibration: Option<PathBuf>,

    /// Actuator link
    #[arg(long, value_enum, default_value_t = ActuatorMode::Simulated)]
    actuator: ActuatorMode,

    /// Frame log written in record mode
    #[arg(long, default_value = "frames.log")]
    record_path: PathBuf,

    /// Position units the simulated actuator moves per frame
    #[arg(long, default_value_t = nimble_link::sim::DEFAULT_SIM_STEP)]
    sim_step: i32,

    /// Exit after this many ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// Keep running this many milliseconds after input closes
    #[arg(long, default_value_t = 0)]
    linger_ms: u64,

    /// Log the frame state every this many milliseconds
    #[arg(long)]
    status_ms: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "nimbled={level},nimble_control={level},nimble_link={level},nimble_tcode={level}",
                    level = log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    let calibration: Box<dyn CalibrationStore> = match &cli.calibration {
        Some(path) => Box::new(
            open_calibration(path.clone(), config.channel_count)
                .with_context(|| format!("Failed to open calibration file: {:?}", path))?,
        ),
        None => Box::new(MemoryCalibrationStore::new()),
    };

    let transport = match cli.actuator {
        ActuatorMode::Simulated => HostTransport::Simulated(SimulatedActuator::new(cli.sim_step)),
        ActuatorMode::Record => {
            let file = File::create(&cli.record_path).with_context(|| {
                format!("Failed to create frame log: {:?}", cli.record_path)
            })?;
            HostTransport::Record(RecordingTransport::new(BufWriter::new(file)))
        }
    };

    let tick_period = Duration::from_micros(config.tick_period_us);
    let mut controller = NimbleController::new(
        config,
        Arc::new(MonotonicClock::new()),
        Box::new(stdout_sink()),
        calibration,
        transport,
    )?;
    controller.init()?;

    info!(
        "Starting nimbled v{} ({:?} actuator)",
        env!("CARGO_PKG_VERSION"),
        cli.actuator
    );

    let (input, _reader) = spawn_stdin_reader().context("Failed to start input thread")?;
    let ticker = Ticker::spawn(tick_period).context("Failed to start tick thread")?;
    let options = RunOptions {
        max_ticks: cli.ticks,
        linger: Duration::from_millis(cli.linger_ms),
        status_interval: cli.status_ms.map(Duration::from_millis),
    };
    let poll_interval = (tick_period / 4).max(Duration::from_micros(100));
    runner::run(&mut controller, &input, ticker.flag(), poll_interval, &options)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["nimbled"])?;
        assert!(cli.config.is_none());
        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.actuator, ActuatorMode::Simulated);
        assert_eq!(cli.sim_step, 20);
        assert_eq!(cli.linger_ms, 0);
        Ok(())
    }

    #[test]
    fn parse_record_mode_and_verbosity() -> TestResult {
        let cli = Cli::try_parse_from([
            "nimbled",
            "-vv",
            "--actuator",
            "record",
            "--record-path",
            "out.log",
            "--ticks",
            "100",
        ])?;
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.actuator, ActuatorMode::Record);
        assert_eq!(cli.record_path, PathBuf::from("out.log"));
        assert_eq!(cli.ticks, Some(100));
        Ok(())
    }

    #[test]
    fn parse_config_and_calibration_paths() -> TestResult {
        let cli = Cli::try_parse_from([
            "nimbled",
            "--config",
            "nimble.yaml",
            "--calibration",
            "cal.bin",
        ])?;
        assert_eq!(cli.config, Some(PathBuf::from("nimble.yaml")));
        assert_eq!(cli.calibration, Some(PathBuf::from("cal.bin")));
        Ok(())
    }

    #[test]
    fn parse_rejects_unknown_actuator() {
        assert!(Cli::try_parse_from(["nimbled", "--actuator", "serial"]).is_err());
    }
}
