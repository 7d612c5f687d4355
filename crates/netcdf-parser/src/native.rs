//! Native NetCDF reading using the netcdf library.
//!
//! Reads a CF-style climate model output file into an in-memory
//! [`Dataset`]: coordinate axes are recognised by dimension name, the time
//! axis is decoded through its `units`/`calendar` attributes, and packed or
//! masked values are unpacked to `f32` with missing values as NaN.

use std::path::Path;
use std::sync::Once;

use tracing::{debug, warn};

use crate::cf_time::decode_times;
use crate::dataset::{AxisKind, Dataset, DatasetReader, Variable};
use crate::error::{NetCdfError, NetCdfResult};
use crate::packing::{level_to_pa, Packing};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully (e.g. when probing for optional attributes). Call
/// this early in `main()`; it is safe to call more than once.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers disable
        // error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// [`DatasetReader`] backed by libnetcdf.
#[derive(Debug, Default, Clone)]
pub struct NetCdfReader;

impl NetCdfReader {
    pub fn new() -> Self {
        silence_hdf5_errors();
        Self
    }
}

impl DatasetReader for NetCdfReader {
    fn read(&self, path: &Path) -> NetCdfResult<Dataset> {
        if !path.exists() {
            return Err(NetCdfError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )));
        }

        let file = netcdf::open(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        // Coordinate variables share their dimension's name
        let mut dim_names: Vec<(String, AxisKind)> = Vec::new();
        for dim in file.dimensions() {
            if let Some(kind) = AxisKind::from_dim_name(&dim.name()) {
                dim_names.push((dim.name(), kind));
            }
        }
        let coord_name = |kind: AxisKind| {
            dim_names
                .iter()
                .find(|(_, k)| *k == kind)
                .map(|(n, _)| n.clone())
        };

        let lon_name = coord_name(AxisKind::Longitude)
            .ok_or_else(|| NetCdfError::MissingData("longitude dimension".to_string()))?;
        let lat_name = coord_name(AxisKind::Latitude)
            .ok_or_else(|| NetCdfError::MissingData("latitude dimension".to_string()))?;

        let lons = read_coordinate(&file, &lon_name)?;
        let lats = read_coordinate(&file, &lat_name)?;
        let mut dataset = Dataset::new(name, lons, lats);

        if let Some(time_name) = coord_name(AxisKind::Time) {
            let var = file
                .variable(&time_name)
                .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", time_name)))?;
            let values: Vec<f64> = var.get_values(..)?;
            let units = get_string_attr(&var, "units")
                .ok_or_else(|| NetCdfError::MissingData(format!("units of {}", time_name)))?;
            let calendar = get_string_attr(&var, "calendar");
            dataset = dataset.with_times(decode_times(&units, calendar.as_deref(), &values)?);
        }

        if let Some(level_name) = coord_name(AxisKind::Level) {
            let var = file
                .variable(&level_name)
                .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", level_name)))?;
            let mut levels: Vec<f64> = var.get_values(..)?;
            let factor = level_to_pa(get_string_attr(&var, "units").as_deref());
            for level in &mut levels {
                *level *= factor;
            }
            dataset = dataset.with_levels(levels);
        }

        let coordinate_names: Vec<&str> = dim_names.iter().map(|(n, _)| n.as_str()).collect();
        for var in file.variables() {
            let var_name = var.name();
            if coordinate_names.contains(&var_name.as_str()) {
                continue;
            }

            let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
            let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
            let has_horizontal = dims
                .iter()
                .any(|d| AxisKind::from_dim_name(d) == Some(AxisKind::Latitude))
                && dims
                    .iter()
                    .any(|d| AxisKind::from_dim_name(d) == Some(AxisKind::Longitude));
            if !has_horizontal {
                debug!(variable = %var_name, "Skipping non-gridded variable");
                continue;
            }
            if let Some(dim) = dims.iter().find(|d| AxisKind::from_dim_name(d).is_none()) {
                warn!(
                    variable = %var_name,
                    dimension = %dim,
                    "Variable has an unsupported dimension"
                );
            }

            let raw: Vec<f64> = var.get_values(..)?;
            let data = packing(&var).unpack(raw);

            let mut variable = Variable::new(var_name.clone(), dims, shape, data)?;
            for attr in var.attributes() {
                if let Ok(netcdf::AttributeValue::Str(s)) = attr.value() {
                    variable.set_attribute(attr.name(), s);
                }
            }

            dataset.add_variable(variable)?;
        }

        debug!(
            dataset = %dataset.name(),
            variables = dataset.variables().len(),
            nx = dataset.lons().len(),
            ny = dataset.lats().len(),
            "Read NetCDF dataset"
        );

        Ok(dataset)
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

fn read_coordinate(file: &netcdf::File, name: &str) -> NetCdfResult<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", name)))?;
    Ok(var.get_values(..)?)
}

fn packing(var: &netcdf::Variable) -> Packing {
    Packing {
        fill: get_f64_attr(var, "_FillValue"),
        missing: get_f64_attr(var, "missing_value"),
        scale: get_f64_attr(var, "scale_factor").unwrap_or(1.0),
        offset: get_f64_attr(var, "add_offset").unwrap_or(0.0),
    }
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}
