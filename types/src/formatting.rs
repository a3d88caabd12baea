//! Centralized number formatting utilities.
//!
//! All numeric display formatting for bodies and signals goes through this
//! module to keep units consistent, and to support European-style number
//! formatting (swapping `.` and `,`).

/// Apply European number format by swapping `.` and `,` in a formatted string.
fn europeanize(s: &str) -> String {
    // Formatted strings here are numeric with an optional unit suffix, so a
    // global swap is safe.
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '.' => result.push(','),
            ',' => result.push('.'),
            _ => result.push(c),
        }
    }
    result
}

/// Apply European formatting conditionally.
#[inline]
fn maybe_eu(s: String, european: bool) -> String {
    if european {
        europeanize(&s)
    } else {
        s
    }
}

/// Format a large f64 number with K/M suffix for compact display.
///
/// - Values that round to >= 1,000,000 are formatted as `X.XXM`
/// - Values that round to >= 1,000 are formatted as `X.XXK`
/// - Values below 1,000 are rounded to whole numbers
///
/// Thresholds apply after rounding, so `999_999.0` is `1.00M`, not `1000.00K`.
///
/// # Examples
/// ```
/// use starlog_types::formatting::format_compact_f64;
/// assert_eq!(format_compact_f64(500.4, false), "500");
/// assert_eq!(format_compact_f64(1_500.0, false), "1.50K");
/// assert_eq!(format_compact_f64(1_500_000.0, false), "1.50M");
/// assert_eq!(format_compact_f64(1_500.0, true), "1,50K");
/// ```
pub fn format_compact_f64(n: f64, european: bool) -> String {
    let n_abs = n.abs();
    let s = if n_abs >= 999_995.0 {
        format!("{:.2}M", n / 1_000_000.0)
    } else if n_abs >= 999.5 {
        format!("{:.2}K", n / 1_000.0)
    } else {
        format!("{:.0}", n)
    };
    maybe_eu(s, european)
}

/// Format a distance from the arrival star, in light seconds.
///
/// Sub-light-second distances (the arrival star itself, close companions)
/// keep two decimals.
///
/// # Examples
/// ```
/// use starlog_types::formatting::format_distance_ls;
/// assert_eq!(format_distance_ls(0.0, false), "0.00 ls");
/// assert_eq!(format_distance_ls(512.3, false), "512 ls");
/// assert_eq!(format_distance_ls(12_346.0, false), "12.35K ls");
/// assert_eq!(format_distance_ls(12_346.0, true), "12,35K ls");
/// ```
pub fn format_distance_ls(ls: f64, european: bool) -> String {
    if ls.abs() < 1.0 {
        return maybe_eu(format!("{:.2} ls", ls), european);
    }
    format!("{} ls", format_compact_f64(ls, european))
}

/// Format a decimal f64 number with the specified precision.
///
/// # Examples
/// ```
/// use starlog_types::formatting::format_decimal_f64;
/// assert_eq!(format_decimal_f64(1.234, 3, false), "1.234");
/// assert_eq!(format_decimal_f64(1.234, 3, true), "1,234");
/// ```
pub fn format_decimal_f64(n: f64, precision: usize, european: bool) -> String {
    maybe_eu(format!("{:.prec$}", n, prec = precision), european)
}

/// Format a body radius given in metres as kilometres with thousands
/// separators.
///
/// # Examples
/// ```
/// use starlog_types::formatting::format_radius_km;
/// assert_eq!(format_radius_km(6_371_000.0, false), "6,371 km");
/// assert_eq!(format_radius_km(6_371_000.0, true), "6.371 km");
/// assert_eq!(format_radius_km(400.0, false), "0 km");
/// ```
pub fn format_radius_km(radius_m: f64, european: bool) -> String {
    let km = (radius_m / 1_000.0).round() as i64;
    format!("{} km", maybe_eu(format_thousands(km), european))
}

/// Format an integer with thousands separators.
///
/// # Examples
/// ```
/// use starlog_types::formatting::format_thousands;
/// assert_eq!(format_thousands(0), "0");
/// assert_eq!(format_thousands(1_500), "1,500");
/// assert_eq!(format_thousands(-1_500_000), "-1,500,000");
/// ```
pub fn format_thousands(n: i64) -> String {
    let s = n.unsigned_abs().to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3 + 1);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    if n < 0 {
        result.insert(0, '-');
    }
    result
}

/// Format a surface temperature in kelvin.
///
/// # Examples
/// ```
/// use starlog_types::formatting::format_temperature_k;
/// assert_eq!(format_temperature_k(288.4), "288 K");
/// ```
pub fn format_temperature_k(kelvin: f64) -> String {
    format!("{:.0} K", kelvin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_compact_f64() {
        assert_eq!(format_compact_f64(0.0, false), "0");
        assert_eq!(format_compact_f64(999.0, false), "999");
        assert_eq!(format_compact_f64(1_000.0, false), "1.00K");
        assert_eq!(format_compact_f64(999.7, false), "1.00K");
        assert_eq!(format_compact_f64(999_994.0, false), "999.99K");
        assert_eq!(format_compact_f64(999_999.0, false), "1.00M");
        assert_eq!(format_compact_f64(1_000_000.0, false), "1.00M");
        assert_eq!(format_compact_f64(-1_500.0, false), "-1.50K");
    }

    #[test]
    fn test_format_distance_ls() {
        assert_eq!(format_distance_ls(0.42, false), "0.42 ls");
        assert_eq!(format_distance_ls(0.42, true), "0,42 ls");
        assert_eq!(format_distance_ls(1.0, false), "1 ls");
        assert_eq!(format_distance_ls(2_500_000.0, false), "2.50M ls");
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(7), "7");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1_000), "1,000");
        assert_eq!(format_thousands(123_456_789), "123,456,789");
        assert_eq!(format_thousands(-999), "-999");
    }

    #[test]
    fn test_format_radius_km() {
        assert_eq!(format_radius_km(695_700_000.0, false), "695,700 km");
        assert_eq!(format_radius_km(1_499.0, false), "1 km");
    }

    #[test]
    fn test_format_decimal_f64() {
        assert_eq!(format_decimal_f64(0.0123, 2, false), "0.01");
        assert_eq!(format_decimal_f64(3.5, 1, true), "3,5");
    }
}
