//! CF masking and packing conventions.
//!
//! Kept free of libnetcdf so the arithmetic can be checked without the
//! native library installed.

/// Masking and packing attributes of one variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packing {
    /// `_FillValue`
    pub fill: Option<f64>,
    /// `missing_value`
    pub missing: Option<f64>,
    /// `scale_factor`, 1 when absent
    pub scale: f64,
    /// `add_offset`, 0 when absent
    pub offset: f64,
}

impl Default for Packing {
    fn default() -> Self {
        Self {
            fill: None,
            missing: None,
            scale: 1.0,
            offset: 0.0,
        }
    }
}

impl Packing {
    /// Mask then unpack raw values. Masked and non-finite values become NaN.
    ///
    /// Masks are compared against the packed value, as CF requires.
    pub fn unpack(&self, raw: Vec<f64>) -> Vec<f32> {
        raw.into_iter()
            .map(|v| {
                if !v.is_finite() || Some(v) == self.fill || Some(v) == self.missing {
                    f32::NAN
                } else {
                    (v * self.scale + self.offset) as f32
                }
            })
            .collect()
    }
}

/// Multiplier converting a pressure axis with the given `units` to Pa.
pub fn level_to_pa(units: Option<&str>) -> f64 {
    match units.map(str::trim) {
        Some("hPa") | Some("mbar") | Some("millibar") | Some("mb") => 100.0,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_units() {
        assert_eq!(level_to_pa(Some("Pa")), 1.0);
        assert_eq!(level_to_pa(Some("hPa")), 100.0);
        assert_eq!(level_to_pa(Some(" mbar ")), 100.0);
        assert_eq!(level_to_pa(None), 1.0);
    }

    #[test]
    fn test_fill_and_missing_masked() {
        let packing = Packing {
            fill: Some(1.0e20),
            missing: Some(-999.0),
            ..Packing::default()
        };
        let out = packing.unpack(vec![1.0e20, 280.5, -999.0, f64::NAN]);
        assert!(out[0].is_nan());
        assert_eq!(out[1], 280.5);
        assert!(out[2].is_nan());
        assert!(out[3].is_nan());
    }

    #[test]
    fn test_packed_values_unpacked() {
        let packing = Packing {
            fill: Some(-32767.0),
            missing: None,
            scale: 0.5,
            offset: 100.0,
        };
        let out = packing.unpack(vec![0.0, 10.0, -4.0, -32767.0]);
        assert_eq!(&out[..3], &[100.0, 105.0, 98.0]);
        // Fill compares against the packed value, before scaling
        assert!(out[3].is_nan());
    }

    #[test]
    fn test_default_is_identity() {
        assert_eq!(Packing::default().unpack(vec![1.5, -2.0]), vec![1.5, -2.0]);
    }
}
