//! Missing value filling.
//!
//! Missing (NaN) cells are filled by 1-D linear interpolation against the
//! coordinate values, first along latitude for every longitude, then along
//! longitude for every latitude. Outside the range of valid points the line
//! through the two nearest valid points is extended.

use wps_common::GeoGrid;

/// Fill one line in place. Lines with fewer than two valid points are left
/// unchanged. Returns the number of values filled.
pub fn fill_line(coords: &[f64], values: &mut [f32]) -> usize {
    let valid: Vec<usize> = (0..values.len()).filter(|&k| !values[k].is_nan()).collect();
    if valid.len() < 2 || valid.len() == values.len() {
        return 0;
    }

    let mut filled = 0;
    for k in 0..values.len() {
        if !values[k].is_nan() {
            continue;
        }

        // Bracketing pair, or the nearest pair at either end
        let upper = valid.partition_point(|&v| v < k);
        let (a, b) = if upper == 0 {
            (valid[0], valid[1])
        } else if upper == valid.len() {
            (valid[upper - 2], valid[upper - 1])
        } else {
            (valid[upper - 1], valid[upper])
        };

        let (xa, xb) = (coords[a], coords[b]);
        let (ya, yb) = (values[a] as f64, values[b] as f64);
        let t = (coords[k] - xa) / (xb - xa);
        values[k] = (ya + t * (yb - ya)) as f32;
        filled += 1;
    }
    filled
}

/// Fill missing values along latitude, then along longitude.
///
/// Returns the number of values still missing afterwards.
pub fn fill_missing(grid: &mut GeoGrid) -> usize {
    if grid.missing_count() == 0 {
        return 0;
    }

    let (nx, ny) = (grid.nx(), grid.ny());
    let lats = grid.lats().to_vec();
    let lons = grid.lons().to_vec();

    // Latitude runs are contiguous in [lon, lat] storage
    for column in grid.values_mut().chunks_mut(ny) {
        fill_line(&lats, column);
    }

    let mut row = vec![0.0f32; nx];
    for j in 0..ny {
        for (i, v) in row.iter_mut().enumerate() {
            *v = grid.get(i, j).unwrap_or(f32::NAN);
        }
        if fill_line(&lons, &mut row) > 0 {
            for (i, &v) in row.iter().enumerate() {
                grid.set(i, j, v);
            }
        }
    }

    grid.missing_count()
}
