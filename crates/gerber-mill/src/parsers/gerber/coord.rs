/// The only `%FS` line the Gerber interpreter accepts.
///
/// Leading-zero suppression, absolute mode, 3 integer digits + 4 decimal
/// digits for both X and Y.
pub const SUPPORTED_FORMAT_SPEC: &str = "%FSLAX34Y34*%";

/// Implicit fixed-point layout of a coordinate digit string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedFormat {
    pub integer: usize,
    pub decimal: usize,
}

/// Gerber coordinates and arc offsets: 3+4.
pub const GERBER_FORMAT: FixedFormat = FixedFormat {
    integer: 3,
    decimal: 4,
};

/// Excellon drill coordinates: 2+4.
pub const DRILL_FORMAT: FixedFormat = FixedFormat {
    integer: 2,
    decimal: 4,
};

/// Unit system from the %MO command.
///
/// Recorded by the interpreter, but coordinates are never scaled by it:
/// every file is rendered as if it were millimeters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Units {
    #[default]
    Millimeters,
    Inches,
}

impl Units {
    /// Millimeters per file unit.
    pub fn scale(self) -> f64 {
        match self {
            Units::Millimeters => 1.0,
            Units::Inches => 25.4,
        }
    }
}

impl FixedFormat {
    /// Decode a digit string (optionally signed) into a physical value.
    ///
    /// The digits are left-padded with zeros to `integer + decimal` and the
    /// decimal point is placed after the first `integer` digits. Longer
    /// strings keep the point at the same position.
    pub fn parse_value(&self, s: &str) -> Option<f64> {
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let total = self.integer + self.decimal;
        let padded = format!("{digits:0>total$}");
        let (int_part, frac_part) = padded.split_at(self.integer);
        let value: f64 = format!("{int_part}.{frac_part}").parse().ok()?;

        Some(if negative { -value } else { value })
    }

    /// Decode a digit string straight into pixel units.
    ///
    /// The magnitude is scaled and rounded first, then the sign is restored,
    /// so `-x` always decodes to exactly the negation of `x`.
    pub fn to_pixels(&self, s: &str, resolution: f64) -> Option<i64> {
        let value = self.parse_value(s)?;
        let magnitude = round_px(value.abs() * resolution);
        Some(if value < 0.0 { -magnitude } else { magnitude })
    }
}

/// Round a pixel-space real to the nearest integer, ties to even.
pub fn round_px(v: f64) -> i64 {
    v.round_ties_even() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gerber_full_width() {
        // 1234567 = 123.4567
        let v = GERBER_FORMAT.parse_value("1234567").unwrap();
        assert_relative_eq!(v, 123.4567, epsilon = 1e-9);
    }

    #[test]
    fn test_gerber_leading_zeros_suppressed() {
        // 5000 -> 0005000 -> 000.5000
        let v = GERBER_FORMAT.parse_value("5000").unwrap();
        assert_relative_eq!(v, 0.5, epsilon = 1e-9);
        assert_eq!(GERBER_FORMAT.to_pixels("5000", 1000.0), Some(500));
    }

    #[test]
    fn test_negative_value() {
        assert_eq!(GERBER_FORMAT.to_pixels("-25000", 1000.0), Some(-2500));
        assert_eq!(
            GERBER_FORMAT.to_pixels("-25000", 1000.0),
            GERBER_FORMAT.to_pixels("25000", 1000.0).map(|v| -v)
        );
    }

    #[test]
    fn test_drill_format() {
        // 015000 -> 01.5000
        assert_eq!(DRILL_FORMAT.to_pixels("015000", 1000.0), Some(1500));
        // 6789 -> 006789 -> 00.6789 -> 678.9
        assert_eq!(DRILL_FORMAT.to_pixels("6789", 1000.0), Some(679));
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(GERBER_FORMAT.to_pixels("", 1000.0), Some(0));
    }

    #[test]
    fn test_overlong_keeps_point_position() {
        let v = GERBER_FORMAT.parse_value("12345678").unwrap();
        assert_relative_eq!(v, 123.45678, epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_non_digits() {
        assert_eq!(GERBER_FORMAT.parse_value("12a4"), None);
        assert_eq!(GERBER_FORMAT.parse_value("1e5"), None);
        assert_eq!(GERBER_FORMAT.parse_value("--1"), None);
    }

    #[test]
    fn test_round_trip_within_one_unit() {
        let resolution = 1000.0;
        for s in ["0", "1", "12", "999", "10000", "123456", "1234567", "9999999"] {
            let physical = GERBER_FORMAT.parse_value(s).unwrap();
            let px = GERBER_FORMAT.to_pixels(s, resolution).unwrap();
            let back = px as f64 / resolution;
            assert!(
                (back - physical).abs() * resolution <= 1.0,
                "{s}: {physical} vs {back}"
            );
        }
    }

    #[test]
    fn test_round_ties_even() {
        assert_eq!(round_px(250.5), 250);
        assert_eq!(round_px(251.5), 252);
        assert_eq!(round_px(-0.4), 0);
    }

    #[test]
    fn test_units_scale() {
        assert_relative_eq!(Units::Millimeters.scale(), 1.0);
        assert_relative_eq!(Units::Inches.scale(), 25.4);
    }
}
