//! Synthetic dataset generators.
//!
//! These build small in-memory datasets with predictable values so that
//! tests can check exactly which slice ended up in which field.

use chrono::{DateTime, Duration, Utc};
use netcdf_parser::{AxisKind, Dataset, Variable};

/// Evenly spaced axis: `start, start + step, ...` with `n` points.
///
/// # Example
///
/// ```
/// use test_utils::axis;
///
/// assert_eq!(axis(10.0, 2.0, 3), vec![10.0, 12.0, 14.0]);
/// ```
pub fn axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|k| start + k as f64 * step).collect()
}

/// `n` time stamps starting at `start`, `step` apart.
pub fn time_axis(start: DateTime<Utc>, step: Duration, n: usize) -> Vec<DateTime<Utc>> {
    (0..n).map(|k| start + step * k as i32).collect()
}

/// Predictable value for a `(time, level, lat, lon)` index:
/// `t * 1000 + p * 100 + lat * 10 + lon`.
///
/// Unique as long as each horizontal axis has fewer than 10 points and
/// there are fewer than 10 levels.
pub fn indexed_value(t: usize, p: usize, lat: usize, lon: usize) -> f32 {
    (t * 1000 + p * 100 + lat * 10 + lon) as f32
}

/// Builder for synthetic datasets.
///
/// # Example
///
/// ```
/// use test_utils::{axis, DatasetBuilder};
///
/// let ds = DatasetBuilder::new("orog.nc", axis(0.0, 1.0, 4), axis(10.0, 2.0, 3))
///     .variable("orog", &["lat", "lon"], "m", "surface_altitude", |_| 100.0)
///     .build();
/// assert_eq!(ds.variable("orog").unwrap().data().len(), 12);
/// ```
pub struct DatasetBuilder {
    dataset: Dataset,
}

impl DatasetBuilder {
    pub fn new(name: &str, lons: Vec<f64>, lats: Vec<f64>) -> Self {
        Self {
            dataset: Dataset::new(name, lons, lats),
        }
    }

    pub fn times(mut self, times: Vec<DateTime<Utc>>) -> Self {
        self.dataset = self.dataset.with_times(times);
        self
    }

    /// Pressure levels in Pa.
    pub fn levels(mut self, levels: Vec<f64>) -> Self {
        self.dataset = self.dataset.with_levels(levels);
        self
    }

    /// Add a variable whose value at each index is `value(index)`, with the
    /// index given in `dims` order.
    pub fn variable<F>(self, name: &str, dims: &[&str], units: &str, standard_name: &str, value: F) -> Self
    where
        F: Fn(&[usize]) -> f32,
    {
        let var = self
            .make_variable(name, dims, value)
            .with_attribute("units", units)
            .with_attribute("standard_name", standard_name);
        self.with_variable(var)
    }

    /// Add a variable with the `(time, level, lat, lon)` pattern of
    /// [`indexed_value`]; absent axes count as index 0.
    pub fn indexed_variable(self, name: &str, dims: &[&str], units: &str, standard_name: &str) -> Self {
        let kinds: Vec<Option<AxisKind>> = dims.iter().map(|d| AxisKind::from_dim_name(d)).collect();
        self.variable(name, dims, units, standard_name, move |idx| {
            let pick = |kind| {
                kinds
                    .iter()
                    .position(|k| *k == Some(kind))
                    .map_or(0, |pos| idx[pos])
            };
            indexed_value(
                pick(AxisKind::Time),
                pick(AxisKind::Level),
                pick(AxisKind::Latitude),
                pick(AxisKind::Longitude),
            )
        })
    }

    /// Add a fully prepared variable.
    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.dataset
            .add_variable(variable)
            .expect("variable does not match dataset coordinates");
        self
    }

    /// Build a variable without attributes, sized from the dataset axes.
    pub fn make_variable<F>(&self, name: &str, dims: &[&str], value: F) -> Variable
    where
        F: Fn(&[usize]) -> f32,
    {
        let shape: Vec<usize> = dims.iter().map(|d| self.axis_len(d)).collect();
        let total: usize = shape.iter().product();

        let mut data = Vec::with_capacity(total);
        let mut index = vec![0usize; shape.len()];
        for _ in 0..total {
            data.push(value(&index));
            // Row-major increment
            for k in (0..shape.len()).rev() {
                index[k] += 1;
                if index[k] < shape[k] {
                    break;
                }
                index[k] = 0;
            }
        }

        let dims = dims.iter().map(|d| d.to_string()).collect();
        Variable::new(name, dims, shape, data).expect("generated variable has a consistent shape")
    }

    fn axis_len(&self, dim: &str) -> usize {
        match AxisKind::from_dim_name(dim) {
            Some(AxisKind::Longitude) => self.dataset.lons().len(),
            Some(AxisKind::Latitude) => self.dataset.lats().len(),
            Some(AxisKind::Time) => self.dataset.times().map_or(0, |t| t.len()),
            Some(AxisKind::Level) => self.dataset.levels().map_or(0, |l| l.len()),
            None => panic!("unknown dimension '{}'", dim),
        }
    }

    pub fn build(self) -> Dataset {
        self.dataset
    }
}
