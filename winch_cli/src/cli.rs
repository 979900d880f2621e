//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "winch", version, about = "Winch position controller CLI")]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "etc/winch_config.toml")]
    pub config: PathBuf,

    /// Structured JSON output (logs and telemetry as JSON lines)
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control loop until interrupted
    Run {
        /// Stop after this many control cycles (useful for scripted checks)
        #[arg(long, value_name = "N")]
        cycles: Option<u64>,
    },
    /// Print the persisted position record
    Status,
    /// Reset the persisted position record to zeros
    Clear,
    /// Briefly spin every configured channel forward and report counts
    Smoke {
        /// Duration to spin
        #[arg(long, value_name = "SECONDS", default_value_t = 2.0)]
        seconds: f64,
        /// Duty override (defaults to each channel's configured duty)
        #[arg(long, value_name = "DUTY")]
        duty: Option<f32>,
    },
}
