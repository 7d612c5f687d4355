//! Common test fixtures.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use netcdf_parser::{Dataset, DatasetReader, NetCdfError, NetCdfResult};

/// A mapping table in the CSV layout the converter reads: pressure-level
/// and surface fields, a scaled field and a variable mapped twice.
pub const MAPPING_CSV: &str = "\
var_id,wps_name,scale,units
ta,TT,,K
hus,SPECHUMD,,kg kg-1
zg,GHT,,m
tas,TT,,K
ps,PSFC,,Pa
psl,PMSL,,Pa
pr,PRECIP,3600,mm h-1
orog,SOILHGT,,m
sftlf,LANDSEA,0.01,fraction
";

/// 2015-01-01 00:00 UTC, the start of most test windows.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0)
        .single()
        .expect("valid base time")
}

/// Write [`MAPPING_CSV`] into `dir` and return its path.
pub fn write_mapping_csv(dir: &Path) -> PathBuf {
    let path = dir.join("mapping.csv");
    std::fs::write(&path, MAPPING_CSV).expect("Failed to write mapping fixture");
    path
}

/// [`DatasetReader`] serving prepared datasets by path.
#[derive(Debug, Default, Clone)]
pub struct InMemoryReader {
    datasets: HashMap<PathBuf, Dataset>,
}

impl InMemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, path: impl Into<PathBuf>, dataset: Dataset) -> Self {
        self.datasets.insert(path.into(), dataset);
        self
    }
}

impl DatasetReader for InMemoryReader {
    fn read(&self, path: &Path) -> NetCdfResult<Dataset> {
        self.datasets.get(path).cloned().ok_or_else(|| {
            NetCdfError::IoError(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_unknown_path() {
        let reader = InMemoryReader::new();
        assert!(reader.read(Path::new("missing.nc")).is_err());
    }

    #[test]
    fn test_mapping_fixture_written() {
        let dir = crate::temp_test_dir();
        let path = write_mapping_csv(dir.path());
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.starts_with("var_id,wps_name,scale,units"));
    }
}
