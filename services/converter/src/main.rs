//! CMIP6 to WPS intermediate file converter.
//!
//! Reads NetCDF climate model output, selects a time window, applies the
//! variable mapping table and writes one intermediate file per valid hour.

mod cli;
mod inspect;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use cli::{Cli, Command, ConvertArgs};
use conversion::{ConversionRequest, ConvertOptions, Converter, MappingTable};
use netcdf_parser::DatasetReader;
use storage::FileSinkOpener;
use wps_common::TimeWindow;

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    match cli.command {
        Command::Convert(args) => convert(args),
        Command::Inspect(args) => {
            let count = inspect::run(&args.file)?;
            info!(file = %args.file.display(), fields = count, "Inspected file");
            Ok(())
        }
    }
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let builder = fmt().with_env_filter(filter).with_target(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn convert(args: ConvertArgs) -> Result<()> {
    if args.end < args.start {
        bail!("--end {} is before --start {}", args.end, args.start);
    }

    let mapping = MappingTable::load(&args.mapping)
        .with_context(|| format!("loading variable mapping {}", args.mapping.display()))?;
    info!(
        mapping = %args.mapping.display(),
        rows = mapping.len(),
        files = args.files.len(),
        "Starting conversion"
    );

    let request = ConversionRequest::new(
        TimeWindow::new(args.start, args.end),
        args.interval,
        args.prefix,
    )
    .with_map_source(args.map_source);

    let converter = Converter::new(dataset_reader()?, mapping, request).with_options(ConvertOptions {
        keep_going: args.keep_going,
    });
    let summary = converter.run(&args.files, FileSinkOpener::new())?;

    if !summary.datasets_failed.is_empty() {
        bail!(
            "{} of {} files failed: {:?}",
            summary.datasets_failed.len(),
            args.files.len(),
            summary.datasets_failed
        );
    }
    Ok(())
}

#[cfg(feature = "native")]
fn dataset_reader() -> Result<Box<dyn DatasetReader>> {
    Ok(Box::new(netcdf_parser::NetCdfReader::new()))
}

#[cfg(not(feature = "native"))]
fn dataset_reader() -> Result<Box<dyn DatasetReader>> {
    bail!("this build cannot read NetCDF files; rebuild with `--features native`")
}
