//! `inspect` subcommand: summarise the fields of an intermediate file.

use std::path::Path;

use anyhow::{Context, Result};
use wps_format::{read_fields, DecodedField};

/// One line per field: date, name, units, level, grid size and value range.
pub fn describe(field: &DecodedField) -> String {
    let (min, max) = field
        .slab
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    format!(
        "{}  {:<9} {:<12} level={:<9} {}x{}  min={} max={}",
        field.header.hdate,
        field.header.field,
        field.header.units,
        field.header.level,
        field.header.nx,
        field.header.ny,
        min,
        max
    )
}

pub fn run(path: &Path) -> Result<usize> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let fields = read_fields(&bytes).with_context(|| format!("decoding {}", path.display()))?;

    for field in &fields {
        println!("{}", describe(field));
    }
    Ok(fields.len())
}
