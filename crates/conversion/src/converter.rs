//! Multi-file conversion driver.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use netcdf_parser::DatasetReader;
use storage::{OutputMultiplexer, SinkOpener};

use crate::config::MappingTable;
use crate::error::Result;
use crate::pipeline::{ConversionPipeline, ConversionRequest, DatasetOutcome};

/// Options for a conversion run.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Continue with the next file when a dataset fails with a
    /// non-fatal error
    pub keep_going: bool,
}

/// Result of a conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Datasets that produced output (possibly zero fields)
    pub datasets_converted: usize,
    /// Datasets whose time axis missed the window
    pub datasets_skipped: usize,
    /// Datasets that failed and were passed over
    pub datasets_failed: Vec<PathBuf>,
    pub fields_written: usize,
    pub sinks_opened: u64,
}

/// Converts a list of dataset files into intermediate files.
///
/// Files are processed one after another in the given order; all output
/// goes through one multiplexer whose sinks are closed when the run ends,
/// whether it succeeds or not.
pub struct Converter<R: DatasetReader> {
    reader: R,
    mapping: MappingTable,
    request: ConversionRequest,
    options: ConvertOptions,
}

impl<R: DatasetReader> Converter<R> {
    pub fn new(reader: R, mapping: MappingTable, request: ConversionRequest) -> Self {
        Self {
            reader,
            mapping,
            request,
            options: ConvertOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    pub fn request(&self) -> &ConversionRequest {
        &self.request
    }

    /// Convert `paths`, writing through sinks from `opener`.
    pub fn run<O: SinkOpener>(&self, paths: &[PathBuf], opener: O) -> Result<ConversionSummary> {
        let mut output = OutputMultiplexer::new(opener);
        let result = self.convert_files(paths, &mut output);
        let closed = output.close_all();

        match (result, closed) {
            (Ok(mut summary), Ok(())) => {
                summary.sinks_opened = output.stats().opened;
                info!(
                    converted = summary.datasets_converted,
                    skipped = summary.datasets_skipped,
                    failed = summary.datasets_failed.len(),
                    fields = summary.fields_written,
                    sinks = summary.sinks_opened,
                    "Conversion finished"
                );
                Ok(summary)
            }
            (Ok(_), Err(close_err)) => Err(close_err.into()),
            (Err(err), closed) => {
                if let Err(close_err) = closed {
                    warn!(error = %close_err, "Failed to close output after conversion error");
                }
                Err(err)
            }
        }
    }

    /// Convert `paths` into an existing multiplexer; the caller closes it.
    pub fn convert_files<O: SinkOpener>(
        &self,
        paths: &[PathBuf],
        output: &mut OutputMultiplexer<O>,
    ) -> Result<ConversionSummary> {
        let mut summary = ConversionSummary::default();

        for path in paths {
            match self.convert_file(path, output) {
                Ok(DatasetOutcome::Converted { fields_written }) => {
                    summary.datasets_converted += 1;
                    summary.fields_written += fields_written;
                }
                Ok(DatasetOutcome::EmptyWindow) => summary.datasets_skipped += 1,
                Err(err) if self.options.keep_going && !err.is_fatal() => {
                    error!(file = %path.display(), error = %err, "Dataset failed, continuing");
                    summary.datasets_failed.push(path.clone());
                }
                Err(err) => {
                    error!(file = %path.display(), error = %err, "Dataset failed");
                    return Err(err);
                }
            }
        }

        Ok(summary)
    }

    fn convert_file<O: SinkOpener>(
        &self,
        path: &Path,
        output: &mut OutputMultiplexer<O>,
    ) -> Result<DatasetOutcome> {
        info!(file = %path.display(), "Processing file");
        let dataset = self.reader.read(path)?;
        ConversionPipeline::new(&self.mapping, &self.request).run(&dataset, output)
    }
}
