//! Regular latitude/longitude grids.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// Relative tolerance when comparing consecutive coordinate steps.
///
/// Coordinates stored as single precision drift by a few ulps, so exact
/// equality would reject grids that are regular in practice.
pub const SPACING_TOLERANCE: f64 = 1e-4;

/// A 2-D field on a latitude/longitude grid.
///
/// Values are indexed `[longitude, latitude]`: the value for longitude
/// `i` and latitude `j` lives at `i * ny + j`. Missing values are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoGrid {
    lons: Vec<f64>,
    lats: Vec<f64>,
    values: Vec<f32>,
}

impl GeoGrid {
    /// Create a grid from its axes and `[lon, lat]` ordered values.
    pub fn new(lons: Vec<f64>, lats: Vec<f64>, values: Vec<f32>) -> GridResult<Self> {
        let expected = lons.len() * lats.len();
        if values.len() != expected {
            return Err(GridError::ShapeMismatch {
                nx: lons.len(),
                ny: lats.len(),
                expected,
                got: values.len(),
            });
        }
        Ok(Self { lons, lats, values })
    }

    /// Build a grid from values laid out `[lat, lon]` (latitude-major),
    /// which is how most NetCDF variables store a horizontal slice.
    pub fn from_lat_major(lons: Vec<f64>, lats: Vec<f64>, values: &[f32]) -> GridResult<Self> {
        let nx = lons.len();
        let ny = lats.len();
        if values.len() != nx * ny {
            return Err(GridError::ShapeMismatch {
                nx,
                ny,
                expected: nx * ny,
                got: values.len(),
            });
        }

        let mut transposed = vec![0.0; nx * ny];
        for j in 0..ny {
            for i in 0..nx {
                transposed[i * ny + j] = values[j * nx + i];
            }
        }
        Ok(Self {
            lons,
            lats,
            values: transposed,
        })
    }

    /// Number of longitudes (NX).
    pub fn nx(&self) -> usize {
        self.lons.len()
    }

    /// Number of latitudes (NY).
    pub fn ny(&self) -> usize {
        self.lats.len()
    }

    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    /// Values in `[lon, lat]` order.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    /// Value at longitude index `i`, latitude index `j`.
    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        if i >= self.nx() || j >= self.ny() {
            return None;
        }
        Some(self.values[i * self.ny() + j])
    }

    /// Store a value at `(i, j)`. Returns `false`, leaving the grid
    /// untouched, when the indices are out of range.
    pub fn set(&mut self, i: usize, j: usize, value: f32) -> bool {
        if i >= self.nx() || j >= self.ny() {
            return false;
        }
        let ny = self.ny();
        self.values[i * ny + j] = value;
        true
    }

    /// Multiply every value in place. Missing values stay missing.
    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.values {
            *v = (*v as f64 * factor) as f32;
        }
    }

    /// Number of missing (NaN) values.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }

    /// Iterate values with longitude varying fastest, the order in which
    /// a Fortran `SLAB(NX, NY)` array is laid out.
    pub fn iter_lon_fastest(&self) -> impl Iterator<Item = f32> + '_ {
        let ny = self.ny();
        let nx = self.nx();
        (0..ny).flat_map(move |j| (0..nx).map(move |i| self.values[i * ny + j]))
    }

    /// Validate that both axes are ascending with uniform spacing and return
    /// the origin and step of each.
    ///
    /// The step is `axis[1] - axis[0]`; every later step must match it within
    /// [`SPACING_TOLERANCE`].
    pub fn spacing(&self) -> GridResult<GridSpacing> {
        GridSpacing::from_axes(&self.lons, &self.lats)
    }
}

/// Origin and step of a regular grid (south-west corner based).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpacing {
    pub start_lat: f64,
    pub start_lon: f64,
    pub delta_lat: f64,
    pub delta_lon: f64,
}

impl GridSpacing {
    /// Spacing of a grid with the given axes, validating regularity.
    pub fn from_axes(lons: &[f64], lats: &[f64]) -> GridResult<Self> {
        let delta_lat = uniform_step("latitude", lats)?;
        let delta_lon = uniform_step("longitude", lons)?;

        Ok(Self {
            start_lat: lats[0],
            start_lon: lons[0],
            delta_lat,
            delta_lon,
        })
    }
}

fn uniform_step(axis: &'static str, coords: &[f64]) -> GridResult<f64> {
    if coords.len() < 2 {
        return Err(GridError::DegenerateAxis {
            axis,
            len: coords.len(),
        });
    }

    let step = coords[1] - coords[0];
    let tolerance = step.abs() * SPACING_TOLERANCE;

    for (index, pair) in coords.windows(2).enumerate() {
        let found = pair[1] - pair[0];
        if found.is_nan() || found <= 0.0 {
            return Err(GridError::NotAscending {
                axis,
                index: index + 1,
            });
        }
        if (found - step).abs() > tolerance {
            return Err(GridError::Irregular {
                axis,
                index: index + 1,
                expected: step,
                found,
            });
        }
    }

    Ok(step)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(start: f64, step: f64, n: usize) -> Vec<f64> {
        (0..n).map(|k| start + k as f64 * step).collect()
    }

    #[test]
    fn test_shape_mismatch() {
        let err = GeoGrid::new(axis(0.0, 1.0, 4), axis(10.0, 2.0, 3), vec![0.0; 11]).unwrap_err();
        assert_eq!(
            err,
            GridError::ShapeMismatch {
                nx: 4,
                ny: 3,
                expected: 12,
                got: 11
            }
        );
    }

    #[test]
    fn test_from_lat_major_transposes() {
        // [lat, lon] layout: row j holds all longitudes for latitude j
        let lat_major = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let grid = GeoGrid::from_lat_major(axis(0.0, 1.0, 3), axis(0.0, 1.0, 2), &lat_major).unwrap();
        assert_eq!(grid.get(0, 0), Some(1.0));
        assert_eq!(grid.get(2, 0), Some(3.0));
        assert_eq!(grid.get(0, 1), Some(4.0));
        assert_eq!(grid.get(2, 1), Some(6.0));
        assert_eq!(grid.get(3, 0), None);
    }

    #[test]
    fn test_lon_fastest_order() {
        let lat_major = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let grid = GeoGrid::from_lat_major(axis(0.0, 1.0, 3), axis(0.0, 1.0, 2), &lat_major).unwrap();
        let order: Vec<f32> = grid.iter_lon_fastest().collect();
        assert_eq!(order, lat_major.to_vec());
    }

    #[test]
    fn test_spacing_regular() {
        let grid = GeoGrid::new(axis(0.0, 1.0, 4), axis(10.0, 2.0, 3), vec![5.0; 12]).unwrap();
        let spacing = grid.spacing().unwrap();
        assert_eq!(spacing.start_lon, 0.0);
        assert_eq!(spacing.start_lat, 10.0);
        assert_eq!(spacing.delta_lon, 1.0);
        assert_eq!(spacing.delta_lat, 2.0);
    }

    #[test]
    fn test_spacing_tolerates_float_noise() {
        let lats: Vec<f64> = axis(-89.5, 1.0, 180).iter().map(|v| (*v as f32) as f64).collect();
        let grid = GeoGrid::new(axis(0.0, 1.25, 2), lats, vec![0.0; 360]).unwrap();
        assert!(grid.spacing().is_ok());
    }

    #[test]
    fn test_spacing_irregular() {
        let grid = GeoGrid::new(vec![0.0, 1.0, 2.5], axis(0.0, 1.0, 2), vec![0.0; 6]).unwrap();
        match grid.spacing() {
            Err(GridError::Irregular { axis, index, .. }) => {
                assert_eq!(axis, "longitude");
                assert_eq!(index, 2);
            }
            other => panic!("Expected irregular longitude, got {:?}", other),
        }
    }

    #[test]
    fn test_spacing_descending() {
        let grid = GeoGrid::new(axis(0.0, 1.0, 2), vec![10.0, 8.0, 6.0], vec![0.0; 6]).unwrap();
        assert_eq!(
            grid.spacing(),
            Err(GridError::NotAscending {
                axis: "latitude",
                index: 1
            })
        );
    }

    #[test]
    fn test_spacing_degenerate() {
        let grid = GeoGrid::new(axis(0.0, 1.0, 3), vec![45.0], vec![0.0; 3]).unwrap();
        assert_eq!(
            grid.spacing(),
            Err(GridError::DegenerateAxis {
                axis: "latitude",
                len: 1
            })
        );
    }

    #[test]
    fn test_set_out_of_range() {
        let mut grid = GeoGrid::new(vec![0.0, 1.0], vec![0.0, 1.0, 2.0], vec![0.0; 6]).unwrap();
        assert!(grid.set(1, 2, 7.5));
        assert_eq!(grid.get(1, 2), Some(7.5));
        assert!(!grid.set(2, 0, 1.0));
        assert!(!grid.set(0, 3, 1.0));
        assert_eq!(grid.values().iter().filter(|&&v| v != 0.0).count(), 1);
    }

    #[test]
    fn test_scale_keeps_missing() {
        let mut grid = GeoGrid::new(axis(0.0, 1.0, 2), axis(0.0, 1.0, 1), vec![2.0, f32::NAN]).unwrap();
        grid.scale(0.5);
        assert_eq!(grid.get(0, 0), Some(1.0));
        assert!(grid.get(1, 0).unwrap().is_nan());
        assert_eq!(grid.missing_count(), 1);
    }
}
