//! In-memory gridded dataset model.
//!
//! A [`Dataset`] is a named bag of variables sharing one set of coordinate
//! axes. Each [`Variable`] is a dense row-major array whose dimensions are
//! identified by name; the recognised axes are time, vertical level,
//! latitude and longitude. Missing values are stored as NaN.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use wps_common::GeoGrid;

use crate::error::{NetCdfError, NetCdfResult};

/// Kind of a coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisKind {
    Time,
    Level,
    Latitude,
    Longitude,
}

impl AxisKind {
    /// Classify a dimension by its conventional name.
    pub fn from_dim_name(name: &str) -> Option<Self> {
        match name {
            "time" => Some(AxisKind::Time),
            "plev" | "lev" | "level" | "pressure" => Some(AxisKind::Level),
            "lat" | "latitude" => Some(AxisKind::Latitude),
            "lon" | "longitude" => Some(AxisKind::Longitude),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AxisKind::Time => "time",
            AxisKind::Level => "level",
            AxisKind::Latitude => "latitude",
            AxisKind::Longitude => "longitude",
        }
    }
}

/// A data variable: dimension names, shape, values and text attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    dims: Vec<String>,
    shape: Vec<usize>,
    data: Vec<f32>,
    attributes: BTreeMap<String, String>,
}

impl Variable {
    /// Create a variable; `data` is row-major over `dims`.
    pub fn new(
        name: impl Into<String>,
        dims: Vec<String>,
        shape: Vec<usize>,
        data: Vec<f32>,
    ) -> NetCdfResult<Self> {
        let name = name.into();
        if dims.len() != shape.len() {
            return Err(NetCdfError::InvalidFormat(format!(
                "variable '{}' has {} dimensions but a rank {} shape",
                name,
                dims.len(),
                shape.len()
            )));
        }
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(NetCdfError::InvalidFormat(format!(
                "variable '{}' has {} values, shape {:?} needs {}",
                name,
                data.len(),
                shape,
                expected
            )));
        }

        Ok(Self {
            name,
            dims,
            shape,
            data,
            attributes: BTreeMap::new(),
        })
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Position of the dimension of the given kind, if present.
    pub fn axis_index(&self, kind: AxisKind) -> Option<usize> {
        self.dims
            .iter()
            .position(|d| AxisKind::from_dim_name(d) == Some(kind))
    }

    pub fn has_axis(&self, kind: AxisKind) -> bool {
        self.axis_index(kind).is_some()
    }

    /// Length of the axis of the given kind, if present.
    pub fn axis_len(&self, kind: AxisKind) -> Option<usize> {
        self.axis_index(kind).map(|i| self.shape[i])
    }

    /// First dimension that is not a recognised axis.
    pub fn unsupported_dimension(&self) -> Option<&str> {
        self.dims
            .iter()
            .find(|d| AxisKind::from_dim_name(d).is_none())
            .map(String::as_str)
    }

    /// Extract one horizontal slice as `[lon, lat]` ordered values.
    ///
    /// `time` and `level` must be given exactly when the variable has the
    /// corresponding axis.
    pub fn horizontal_values(&self, time: Option<usize>, level: Option<usize>) -> NetCdfResult<Vec<f32>> {
        if let Some(dim) = self.unsupported_dimension() {
            return Err(NetCdfError::UnsupportedDimension {
                variable: self.name.clone(),
                dimension: dim.to_string(),
            });
        }

        let lat_axis = self.axis_index(AxisKind::Latitude).ok_or_else(|| {
            NetCdfError::MissingData(format!("latitude dimension of '{}'", self.name))
        })?;
        let lon_axis = self.axis_index(AxisKind::Longitude).ok_or_else(|| {
            NetCdfError::MissingData(format!("longitude dimension of '{}'", self.name))
        })?;

        // Row-major strides
        let mut strides = vec![1usize; self.shape.len()];
        for k in (0..self.shape.len().saturating_sub(1)).rev() {
            strides[k] = strides[k + 1] * self.shape[k + 1];
        }

        let mut base = 0usize;
        for (kind, index) in [(AxisKind::Time, time), (AxisKind::Level, level)] {
            match (self.axis_index(kind), index) {
                (Some(axis), Some(idx)) => {
                    if idx >= self.shape[axis] {
                        return Err(NetCdfError::OutOfRange {
                            axis: kind.name(),
                            index: idx,
                            len: self.shape[axis],
                        });
                    }
                    base += idx * strides[axis];
                }
                (Some(_), None) => {
                    return Err(NetCdfError::MissingData(format!(
                        "{} index for '{}'",
                        kind.name(),
                        self.name
                    )));
                }
                (None, Some(_)) => {
                    return Err(NetCdfError::InvalidFormat(format!(
                        "'{}' has no {} axis to index",
                        self.name,
                        kind.name()
                    )));
                }
                (None, None) => {}
            }
        }

        let nx = self.shape[lon_axis];
        let ny = self.shape[lat_axis];
        let mut values = Vec::with_capacity(nx * ny);
        for i in 0..nx {
            for j in 0..ny {
                let flat = base + i * strides[lon_axis] + j * strides[lat_axis];
                values.push(self.data[flat]);
            }
        }
        Ok(values)
    }
}

/// A collection of variables on a shared latitude/longitude grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    lons: Vec<f64>,
    lats: Vec<f64>,
    times: Option<Vec<DateTime<Utc>>>,
    /// Vertical levels in Pa
    levels: Option<Vec<f64>>,
    variables: Vec<Variable>,
}

impl Dataset {
    /// Create an empty dataset with the given horizontal axes.
    pub fn new(name: impl Into<String>, lons: Vec<f64>, lats: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            lons,
            lats,
            times: None,
            levels: None,
            variables: Vec::new(),
        }
    }

    /// Attach a time axis.
    pub fn with_times(mut self, times: Vec<DateTime<Utc>>) -> Self {
        self.times = Some(times);
        self
    }

    /// Attach a pressure-level axis (Pa).
    pub fn with_levels(mut self, levels: Vec<f64>) -> Self {
        self.levels = Some(levels);
        self
    }

    /// Add a variable, checking its recognised axes against the dataset's
    /// coordinates. Insertion order is preserved.
    pub fn add_variable(&mut self, variable: Variable) -> NetCdfResult<()> {
        for (dim, &len) in variable.dims.iter().zip(&variable.shape) {
            let expected = match AxisKind::from_dim_name(dim) {
                Some(AxisKind::Longitude) => Some(self.lons.len()),
                Some(AxisKind::Latitude) => Some(self.lats.len()),
                Some(AxisKind::Time) => Some(self.times.as_ref().map_or(0, Vec::len)),
                Some(AxisKind::Level) => Some(self.levels.as_ref().map_or(0, Vec::len)),
                None => None,
            };
            if let Some(expected) = expected {
                if expected != len {
                    return Err(NetCdfError::InvalidFormat(format!(
                        "dimension '{}' of '{}' has length {} but the coordinate has {}",
                        dim, variable.name, len, expected
                    )));
                }
            }
        }
        self.variables.push(variable);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    /// Time stamps, or `None` for a static (time-invariant) dataset.
    pub fn times(&self) -> Option<&[DateTime<Utc>]> {
        self.times.as_deref()
    }

    pub fn has_time(&self) -> bool {
        self.times.is_some()
    }

    pub fn levels(&self) -> Option<&[f64]> {
        self.levels.as_deref()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Extract one horizontal slice of `variable` as a grid on this
    /// dataset's axes.
    pub fn horizontal_slice(
        &self,
        variable: &Variable,
        time: Option<usize>,
        level: Option<usize>,
    ) -> NetCdfResult<GeoGrid> {
        let values = variable.horizontal_values(time, level)?;
        Ok(GeoGrid::new(self.lons.clone(), self.lats.clone(), values)?)
    }
}

/// Source of gridded datasets.
pub trait DatasetReader {
    fn read(&self, path: &Path) -> NetCdfResult<Dataset>;
}

impl<R: DatasetReader + ?Sized> DatasetReader for Box<R> {
    fn read(&self, path: &Path) -> NetCdfResult<Dataset> {
        (**self).read(path)
    }
}
