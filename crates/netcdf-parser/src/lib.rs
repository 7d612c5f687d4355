//! Gridded dataset model and NetCDF reader for climate model output.
//!
//! Datasets are held in memory as a set of variables over shared time,
//! pressure-level, latitude and longitude axes. The [`DatasetReader`]
//! trait is the seam between the conversion pipeline and the file format;
//! [`NetCdfReader`] implements it with libnetcdf when the `native` feature
//! is enabled.
//!
//! # Example
//!
//! ```
//! use netcdf_parser::{Dataset, Variable};
//!
//! let mut ds = Dataset::new("orog", vec![0.0, 1.0], vec![10.0, 11.0, 12.0]);
//! let var = Variable::new(
//!     "orog",
//!     vec!["lat".into(), "lon".into()],
//!     vec![3, 2],
//!     vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
//! )
//! .unwrap()
//! .with_attribute("units", "m");
//! ds.add_variable(var).unwrap();
//!
//! let grid = ds.horizontal_slice(ds.variable("orog").unwrap(), None, None).unwrap();
//! assert_eq!(grid.get(1, 2), Some(6.0));
//! ```

pub mod cf_time;
pub mod dataset;
pub mod error;
#[cfg(feature = "native")]
pub mod native;
pub mod packing;

pub use cf_time::{decode_times, Calendar, TimeUnits};
pub use dataset::{AxisKind, Dataset, DatasetReader, Variable};
pub use error::{NetCdfError, NetCdfResult};
pub use packing::{level_to_pa, Packing};
#[cfg(feature = "native")]
pub use native::{silence_hdf5_errors, NetCdfReader};
