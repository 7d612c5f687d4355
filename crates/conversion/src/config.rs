//! Variable mapping table.
//!
//! Maps source variable identifiers to WPS field names, with an optional
//! scale factor and the units the field must carry. Loaded from a CSV file
//! with the header `var_id,wps_name,scale,units` or from a YAML list of the
//! same records.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConversionError, Result};
use wps_format::widths;

/// One row of the mapping table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableMapping {
    /// Source variable name, e.g. "ta"
    pub var_id: String,
    /// Target field name, e.g. "TT"
    pub wps_name: String,
    /// Multiplier applied before encoding; `None` leaves values unchanged
    #[serde(default)]
    pub scale: Option<f64>,
    /// Units the encoded field carries
    pub units: String,
}

impl VariableMapping {
    pub fn new(
        var_id: impl Into<String>,
        wps_name: impl Into<String>,
        scale: Option<f64>,
        units: impl Into<String>,
    ) -> Self {
        Self {
            var_id: var_id.into(),
            wps_name: wps_name.into(),
            scale,
            units: units.into(),
        }
    }

    fn validate(&self, row: usize) -> Result<()> {
        if self.var_id.trim().is_empty() {
            return Err(ConversionError::InvalidMapping(format!(
                "row {}: empty var_id",
                row
            )));
        }
        if self.wps_name.trim().is_empty() {
            return Err(ConversionError::InvalidMapping(format!(
                "row {}: empty wps_name for {}",
                row, self.var_id
            )));
        }
        if self.wps_name.chars().count() > widths::FIELD {
            return Err(ConversionError::InvalidMapping(format!(
                "row {}: field name '{}' is longer than {} characters",
                row,
                self.wps_name,
                widths::FIELD
            )));
        }
        Ok(())
    }
}

/// Ordered collection of mapping rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingTable {
    rows: Vec<VariableMapping>,
}

impl MappingTable {
    /// Build a table from rows, validating each.
    ///
    /// Non-finite scale factors are treated as absent.
    pub fn from_rows(rows: Vec<VariableMapping>) -> Result<Self> {
        let mut rows = rows;
        for (i, row) in rows.iter_mut().enumerate() {
            if row.scale.is_some_and(|s| !s.is_finite()) {
                row.scale = None;
            }
            row.validate(i + 1)?;
        }
        Ok(Self { rows })
    }

    /// Load from a `.csv`, `.yaml` or `.yml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let table = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content)?,
            _ => Self::from_csv_str(&content)?,
        };
        debug!(path = %path.display(), rows = table.len(), "Loaded variable mapping");
        Ok(table)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let rows: Vec<VariableMapping> = serde_yaml::from_str(content)
            .map_err(|e| ConversionError::InvalidMapping(format!("YAML: {}", e)))?;
        Self::from_rows(rows)
    }

    /// Parse CSV text. Column order comes from the header; extra columns
    /// are ignored.
    pub fn from_csv_str(content: &str) -> Result<Self> {
        let mut lines = content
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty());

        let (_, header) = lines
            .next()
            .ok_or_else(|| ConversionError::InvalidMapping("empty mapping table".to_string()))?;
        let header: Vec<String> = split_csv_line(header)
            .into_iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let column = |name: &str| {
            header.iter().position(|h| h == name).ok_or_else(|| {
                ConversionError::InvalidMapping(format!("missing column '{}'", name))
            })
        };
        let var_col = column("var_id")?;
        let name_col = column("wps_name")?;
        let scale_col = column("scale")?;
        let units_col = column("units")?;

        let mut rows = Vec::new();
        for (line_no, line) in lines {
            let cells = split_csv_line(line);
            let cell = |i: usize| cells.get(i).map(String::as_str).unwrap_or("");

            rows.push(VariableMapping {
                var_id: cell(var_col).to_string(),
                wps_name: cell(name_col).to_string(),
                scale: parse_scale(cell(scale_col)).map_err(|_| {
                    ConversionError::InvalidMapping(format!(
                        "line {}: invalid scale '{}'",
                        line_no + 1,
                        cell(scale_col)
                    ))
                })?,
                units: cell(units_col).to_string(),
            });
        }

        Self::from_rows(rows)
    }

    /// Rows for a source variable, in table order.
    pub fn rows_for<'a>(&'a self, var_id: &'a str) -> impl Iterator<Item = &'a VariableMapping> + 'a {
        self.rows.iter().filter(move |r| r.var_id == var_id)
    }

    pub fn contains(&self, var_id: &str) -> bool {
        self.rows.iter().any(|r| r.var_id == var_id)
    }

    pub fn rows(&self) -> &[VariableMapping] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse a scale cell; blank and NaN-like markers mean "no scaling".
fn parse_scale(cell: &str) -> std::result::Result<Option<f64>, std::num::ParseFloatError> {
    match cell.trim() {
        "" | "nan" | "NaN" | "NAN" | "NA" | "n/a" | "N/A" => Ok(None),
        s => {
            let value: f64 = s.parse()?;
            Ok(value.is_finite().then_some(value))
        }
    }
}

/// Split one CSV line, honouring double-quoted cells.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                cells.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}
