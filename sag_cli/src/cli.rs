//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "sag", version, about = "Suspension sag meter")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/sag_config.toml")]
    pub config: PathBuf,

    /// Optional calibration CSV (strict header `raw,length`, two rows at 0 and 100)
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Log and report as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); defaults to [logging].level, then info
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the meter: sample, display and serve the browser link
    Run {
        /// Stop after this many milliseconds (default: until Ctrl-C)
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,
        /// Print loop statistics on exit
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
    },
    /// Validate config and calibration, then take one sensor reading
    SelfCheck,
    /// Average a burst of readings and print the raw value and its length
    Probe {
        /// Number of readings (default: one filter window)
        #[arg(long, value_name = "N")]
        samples: Option<usize>,
    },
}
