//! Per-dataset conversion.
//!
//! A dataset is converted in four steps: the time axis is restricted to the
//! requested window and resampled at the requested interval, each mapped
//! variable is scaled and its units checked, every horizontal slice is
//! gap-filled, and each slice is encoded into the sink for its valid hour.
//!
//! Fields reach a sink in dataset, variable, mapping row, time, level order.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info};

use netcdf_parser::{AxisKind, Dataset, Variable};
use storage::{OutputKey, OutputMultiplexer, SinkOpener};
use wps_common::{GeoGrid, GridSpacing, TimeWindow};
use wps_format::{write_slab, FieldMetadata, SURFACE_LEVEL};

use crate::config::{MappingTable, VariableMapping};
use crate::error::{ConversionError, Result};
use crate::fill::fill_missing;

/// Default `MAP_SOURCE` label.
pub const DEFAULT_MAP_SOURCE: &str = "CMIP6";

/// What to produce from each dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub window: TimeWindow,
    /// Sampling interval within the window
    pub interval: Duration,
    /// Output name prefix; may contain a directory
    pub prefix: String,
    pub map_source: String,
}

impl ConversionRequest {
    pub fn new(window: TimeWindow, interval: Duration, prefix: impl Into<String>) -> Self {
        Self {
            window,
            interval,
            prefix: prefix.into(),
            map_source: DEFAULT_MAP_SOURCE.to_string(),
        }
    }

    pub fn with_map_source(mut self, map_source: impl Into<String>) -> Self {
        self.map_source = map_source.into();
        self
    }

    /// Output time stamps: `start`, `start + interval`, ... up to `end`.
    pub fn stamps(&self) -> Result<Vec<DateTime<Utc>>> {
        Ok(self.window.stamps(self.interval)?)
    }
}

/// Result of converting one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetOutcome {
    /// The dataset's time axis does not intersect the window
    EmptyWindow,
    Converted { fields_written: usize },
}

/// Time steps to emit: valid time and, for timed data, the index into the
/// dataset's time axis.
type TimeSelection = Vec<(DateTime<Utc>, Option<usize>)>;

/// Converts datasets according to a mapping table and a request.
#[derive(Debug, Clone, Copy)]
pub struct ConversionPipeline<'a> {
    mapping: &'a MappingTable,
    request: &'a ConversionRequest,
}

impl<'a> ConversionPipeline<'a> {
    pub fn new(mapping: &'a MappingTable, request: &'a ConversionRequest) -> Self {
        Self { mapping, request }
    }

    /// Convert every mapped variable of `dataset` into `output`.
    pub fn run<O: SinkOpener>(
        &self,
        dataset: &Dataset,
        output: &mut OutputMultiplexer<O>,
    ) -> Result<DatasetOutcome> {
        let stamps = self.request.stamps()?;

        let selection = match dataset.times() {
            Some(times) => {
                if !times.iter().any(|t| self.request.window.contains(t)) {
                    info!(
                        dataset = %dataset.name(),
                        start = %self.request.window.start,
                        end = %self.request.window.end,
                        "No data in dataset for the given time range"
                    );
                    return Ok(DatasetOutcome::EmptyWindow);
                }
                debug!(dataset = %dataset.name(), steps = stamps.len(), "Selecting necessary time steps");
                select_time_steps(dataset, times, &stamps)?
            }
            None => stamps.into_iter().map(|t| (t, None)).collect(),
        };

        let mut fields_written = 0;
        for variable in dataset.variables() {
            let rows: Vec<&VariableMapping> = self.mapping.rows_for(variable.name()).collect();
            if rows.is_empty() {
                debug!(variable = %variable.name(), "Variable not mapped, skipping");
                continue;
            }

            let mut state = VariableState::new(variable);
            for row in rows {
                info!(
                    dataset = %dataset.name(),
                    variable = %variable.name(),
                    field = %row.wps_name,
                    "Processing variable"
                );
                fields_written += self.convert_variable(dataset, variable, row, &mut state, &selection, output)?;
            }
        }

        Ok(DatasetOutcome::Converted { fields_written })
    }

    fn convert_variable<O: SinkOpener>(
        &self,
        dataset: &Dataset,
        variable: &Variable,
        row: &VariableMapping,
        state: &mut VariableState,
        selection: &TimeSelection,
        output: &mut OutputMultiplexer<O>,
    ) -> Result<usize> {
        if let Some(scale) = row.scale {
            info!(
                variable = %variable.name(),
                scale = scale,
                units = %row.units,
                "Applying scale factor and units"
            );
            state.apply_scale(scale, &row.units);
        }
        let units = state
            .units
            .as_deref()
            .ok_or_else(|| ConversionError::MissingAttribute {
                variable: variable.name().to_string(),
                attribute: "units",
            })?;

        if units != row.units {
            error!(
                variable = %variable.name(),
                found = %units,
                expected = %row.units,
                "Units mismatch"
            );
            return Err(ConversionError::UnitsMismatch {
                variable: variable.name().to_string(),
                found: units.to_string(),
                expected: row.units.clone(),
            });
        }

        let description = variable
            .attribute("standard_name")
            .or_else(|| variable.attribute("long_name"))
            .ok_or_else(|| ConversionError::MissingAttribute {
                variable: variable.name().to_string(),
                attribute: "standard_name",
            })?;

        // Fail on irregular axes before anything is written
        GridSpacing::from_axes(dataset.lons(), dataset.lats())?;

        let levels: Vec<(Option<usize>, f32)> = match (variable.has_axis(AxisKind::Level), dataset.levels()) {
            (true, Some(levels)) if !levels.is_empty() => levels
                .iter()
                .enumerate()
                .map(|(k, &p)| (Some(k), p as f32))
                .collect(),
            _ => vec![(None, SURFACE_LEVEL)],
        };

        let timed = variable.has_axis(AxisKind::Time);
        match (timed, levels[0].0.is_some()) {
            (true, true) => info!(
                variable = %variable.name(),
                levels = ?levels.iter().map(|(_, p)| *p).collect::<Vec<_>>(),
                "Pressure level data"
            ),
            (true, false) => info!(variable = %variable.name(), "Surface data"),
            (false, _) => info!(variable = %variable.name(), "Static data"),
        }

        // Static slices are identical for every time step
        let static_grids = if timed {
            Vec::new()
        } else {
            levels
                .iter()
                .map(|&(level_idx, _)| self.prepare_slice(dataset, variable, state.scale, None, level_idx))
                .collect::<Result<Vec<_>>>()?
        };

        let mut written = 0;
        for &(valid_time, time_idx) in selection {
            for (k, &(level_idx, level)) in levels.iter().enumerate() {
                let fresh;
                let grid = if timed {
                    fresh = self.prepare_slice(dataset, variable, state.scale, time_idx, level_idx)?;
                    &fresh
                } else {
                    &static_grids[k]
                };

                let meta = FieldMetadata {
                    valid_time,
                    map_source: self.request.map_source.clone(),
                    field: row.wps_name.clone(),
                    units: row.units.clone(),
                    description: description.to_string(),
                    level,
                };
                let key = OutputKey::new(self.request.prefix.as_str(), valid_time);
                write_slab(output.get(&key)?, grid, &meta)?;
                written += 1;
            }
        }

        debug!(variable = %variable.name(), field = %row.wps_name, fields = written, "Variable converted");
        Ok(written)
    }

    /// Extract, scale and gap-fill one horizontal slice.
    fn prepare_slice(
        &self,
        dataset: &Dataset,
        variable: &Variable,
        scale: Option<f64>,
        time_idx: Option<usize>,
        level_idx: Option<usize>,
    ) -> Result<GeoGrid> {
        let mut grid = dataset.horizontal_slice(variable, time_idx, level_idx)?;
        if let Some(scale) = scale {
            grid.scale(scale);
        }

        let missing = fill_missing(&mut grid);
        if missing > 0 {
            return Err(ConversionError::UnfillableValues {
                variable: variable.name().to_string(),
                missing,
            });
        }
        Ok(grid)
    }
}

/// Units and scale of a variable as rewritten by the mapping rows seen so
/// far. A scaled row multiplies the values and replaces the units for every
/// later row of the same variable.
#[derive(Debug, Clone, PartialEq)]
struct VariableState {
    units: Option<String>,
    /// Product of every scale applied so far
    scale: Option<f64>,
}

impl VariableState {
    fn new(variable: &Variable) -> Self {
        Self {
            units: variable.attribute("units").map(str::to_string),
            scale: None,
        }
    }

    fn apply_scale(&mut self, scale: f64, units: &str) {
        self.scale = Some(self.scale.unwrap_or(1.0) * scale);
        self.units = Some(units.to_string());
    }
}

/// Index of every requested stamp on the dataset's time axis.
fn select_time_steps(
    dataset: &Dataset,
    times: &[DateTime<Utc>],
    stamps: &[DateTime<Utc>],
) -> Result<TimeSelection> {
    stamps
        .iter()
        .map(|&stamp| {
            times
                .iter()
                .position(|t| *t == stamp)
                .map(|idx| (stamp, Some(idx)))
                .ok_or_else(|| ConversionError::MissingTimeStep {
                    dataset: dataset.name().to_string(),
                    time: stamp,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use storage::MemorySinkOpener;

    fn utc(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 1, day, hour, 0, 0).unwrap()
    }

    fn request(start: DateTime<Utc>, end: DateTime<Utc>) -> ConversionRequest {
        ConversionRequest::new(TimeWindow::new(start, end), Duration::hours(6), "FILE")
    }

    fn surface_dataset(times: Vec<DateTime<Utc>>) -> Dataset {
        let nt = times.len();
        let mut ds = Dataset::new("tas.nc", vec![0.0, 1.0], vec![0.0, 1.0]).with_times(times);
        let var = Variable::new(
            "tas",
            vec!["time".into(), "lat".into(), "lon".into()],
            vec![nt, 2, 2],
            (0..nt * 4).map(|v| v as f32).collect(),
        )
        .unwrap()
        .with_attribute("units", "K")
        .with_attribute("standard_name", "air_temperature");
        ds.add_variable(var).unwrap();
        ds
    }

    #[test]
    fn test_variable_state_compounds_scales() {
        let ds = surface_dataset(vec![utc(1, 0)]);
        let mut state = VariableState::new(ds.variable("tas").unwrap());
        assert_eq!(state.units.as_deref(), Some("K"));
        assert_eq!(state.scale, None);

        state.apply_scale(10.0, "dK");
        state.apply_scale(0.5, "x");
        assert_eq!(state.units.as_deref(), Some("x"));
        assert_eq!(state.scale, Some(5.0));
    }

    #[test]
    fn test_select_time_steps() {
        let ds = surface_dataset(vec![utc(1, 0), utc(1, 6), utc(1, 12)]);
        let selection = select_time_steps(&ds, ds.times().unwrap(), &[utc(1, 6), utc(1, 12)]).unwrap();
        assert_eq!(selection, vec![(utc(1, 6), Some(1)), (utc(1, 12), Some(2))]);
    }

    #[test]
    fn test_missing_stamp_is_error() {
        let ds = surface_dataset(vec![utc(1, 0), utc(1, 12)]);
        let mapping = MappingTable::from_rows(vec![VariableMapping::new("tas", "TT", None, "K")]).unwrap();
        let req = request(utc(1, 0), utc(1, 12));
        let mut mux = OutputMultiplexer::new(MemorySinkOpener::new());

        let err = ConversionPipeline::new(&mapping, &req).run(&ds, &mut mux).unwrap_err();
        assert!(matches!(err, ConversionError::MissingTimeStep { time, .. } if time == utc(1, 6)));
    }

    #[test]
    fn test_window_outside_dataset_is_skipped() {
        let ds = surface_dataset(vec![utc(1, 0)]);
        let mapping = MappingTable::from_rows(vec![VariableMapping::new("tas", "TT", None, "K")]).unwrap();
        let req = request(utc(2, 0), utc(3, 0));
        let opener = MemorySinkOpener::new();
        let mut mux = OutputMultiplexer::new(opener.clone());

        let outcome = ConversionPipeline::new(&mapping, &req).run(&ds, &mut mux).unwrap();
        assert_eq!(outcome, DatasetOutcome::EmptyWindow);
        assert!(opener.names().is_empty());
    }

    #[test]
    fn test_missing_units_attribute() {
        let mut ds = Dataset::new("x.nc", vec![0.0, 1.0], vec![0.0, 1.0]);
        let var = Variable::new("orog", vec!["lat".into(), "lon".into()], vec![2, 2], vec![1.0; 4]).unwrap();
        ds.add_variable(var).unwrap();
        let mapping = MappingTable::from_rows(vec![VariableMapping::new("orog", "SOILHGT", None, "m")]).unwrap();
        let req = request(utc(1, 0), utc(1, 0));
        let mut mux = OutputMultiplexer::new(MemorySinkOpener::new());

        let err = ConversionPipeline::new(&mapping, &req).run(&ds, &mut mux).unwrap_err();
        assert!(matches!(err, ConversionError::MissingAttribute { attribute: "units", .. }));
    }

    #[test]
    fn test_long_name_used_without_standard_name() {
        let mut ds = Dataset::new("x.nc", vec![0.0, 1.0], vec![0.0, 1.0]);
        let var = Variable::new("orog", vec!["lat".into(), "lon".into()], vec![2, 2], vec![1.0; 4])
            .unwrap()
            .with_attribute("units", "m")
            .with_attribute("long_name", "Surface Altitude");
        ds.add_variable(var).unwrap();
        let mapping = MappingTable::from_rows(vec![VariableMapping::new("orog", "SOILHGT", None, "m")]).unwrap();
        let req = request(utc(1, 0), utc(1, 0));
        let opener = MemorySinkOpener::new();
        let mut mux = OutputMultiplexer::new(opener.clone());

        ConversionPipeline::new(&mapping, &req).run(&ds, &mut mux).unwrap();
        let bytes = opener.contents("FILE:2015-01-01_00").unwrap();
        let fields = wps_format::read_fields(&bytes).unwrap();
        assert_eq!(fields[0].header.description, "Surface Altitude");
    }
}
