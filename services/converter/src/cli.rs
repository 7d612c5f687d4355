//! Command-line arguments.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "wps-converter")]
#[command(about = "Convert CMIP6 NetCDF output into WPS intermediate files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, env = "WPS_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "WPS_LOG_JSON", global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert NetCDF files into intermediate files
    Convert(ConvertArgs),
    /// Print the fields stored in an intermediate file
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Variable mapping table (CSV with var_id,wps_name,scale,units, or YAML)
    #[arg(long, env = "WPS_MAPPING")]
    pub mapping: PathBuf,

    /// First valid time, e.g. 2015-01-01 or 2015-01-01T06:00:00
    #[arg(long, env = "WPS_START", value_parser = parse_time)]
    pub start: DateTime<Utc>,

    /// Last valid time (inclusive)
    #[arg(long, env = "WPS_END", value_parser = parse_time)]
    pub end: DateTime<Utc>,

    /// Sampling interval, e.g. 6h, 1d, 30min
    #[arg(long, env = "WPS_INTERVAL", default_value = "6h", value_parser = parse_interval)]
    pub interval: Duration,

    /// Output name prefix; may include a directory
    #[arg(long, env = "WPS_PREFIX", default_value = "FILE")]
    pub prefix: String,

    /// MAP_SOURCE label written to every header
    #[arg(long, env = "WPS_MAP_SOURCE", default_value = conversion::DEFAULT_MAP_SOURCE)]
    pub map_source: String,

    /// Continue with the next file when a dataset fails
    #[arg(long, env = "WPS_KEEP_GOING")]
    pub keep_going: bool,

    /// NetCDF files, processed in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Intermediate file to decode
    pub file: PathBuf,
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    wps_common::parse_datetime(s).map_err(|e| e.to_string())
}

fn parse_interval(s: &str) -> Result<Duration, String> {
    wps_common::parse_interval(s).map_err(|e| e.to_string())
}
