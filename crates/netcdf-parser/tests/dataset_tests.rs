//! Integration tests for the in-memory dataset model.

use chrono::{TimeZone, Utc};
use netcdf_parser::{decode_times, AxisKind, Dataset, NetCdfError, Variable};

fn names(dims: &[&str]) -> Vec<String> {
    dims.iter().map(|d| d.to_string()).collect()
}

/// Daily surface field decoded from a noleap time axis, as CMIP6 files
/// commonly carry.
fn daily_dataset() -> Dataset {
    let times = decode_times("days since 2015-01-01", Some("noleap"), &[0.0, 1.0, 2.0]).unwrap();
    let mut ds = Dataset::new("tas_day.nc", vec![0.0, 2.5, 5.0], vec![-1.0, 1.0]).with_times(times);

    let data: Vec<f32> = (0..3 * 2 * 3).map(|v| v as f32).collect();
    let tas = Variable::new("tas", names(&["time", "lat", "lon"]), vec![3, 2, 3], data)
        .unwrap()
        .with_attribute("units", "K")
        .with_attribute("standard_name", "air_temperature");
    ds.add_variable(tas).unwrap();
    ds
}

#[test]
fn test_time_axis_decoded() {
    let ds = daily_dataset();
    let times = ds.times().unwrap();
    assert_eq!(times.len(), 3);
    assert_eq!(times[2], Utc.with_ymd_and_hms(2015, 1, 3, 0, 0, 0).unwrap());
}

#[test]
fn test_slice_per_time_step() {
    let ds = daily_dataset();
    let tas = ds.variable("tas").unwrap();
    assert!(tas.has_axis(AxisKind::Time));
    assert!(!tas.has_axis(AxisKind::Level));

    let grid = ds.horizontal_slice(tas, Some(2), None).unwrap();
    // time 2 starts at flat index 12; lat 1, lon 2 adds 3 + 2
    assert_eq!(grid.get(2, 1), Some(17.0));
    assert_eq!(grid.get(0, 0), Some(12.0));
}

#[test]
fn test_variable_lookup_and_attributes() {
    let ds = daily_dataset();
    assert!(ds.variable("pr").is_none());
    assert_eq!(ds.variable("tas").unwrap().attribute("units"), Some("K"));
}

#[test]
fn test_mismatched_horizontal_axis_rejected() {
    let mut ds = Dataset::new("bad", vec![0.0, 1.0], vec![0.0, 1.0]);
    let var = Variable::new("x", names(&["lat", "lon"]), vec![2, 3], vec![0.0; 6]).unwrap();
    assert!(matches!(ds.add_variable(var), Err(NetCdfError::InvalidFormat(_))));
}
