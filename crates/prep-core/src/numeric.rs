//! Numeric helpers that reproduce the reference calculator's arithmetic.
//!
//! Quantities are plain `f64` values and `NaN` is a legitimate result that
//! flows through downstream formulas. The helpers here keep that behaviour
//! consistent: `js_max` propagates `NaN` instead of ignoring it, and the
//! parse helpers return `NaN` rather than failing.

/// Rounds `value` to `digits` decimal places using round-half-to-even.
///
/// The scaled value is first re-read through a 16 digit decimal rendering so
/// that binary noise such as `0.30000000000000004` does not defeat the
/// half-way test. Non-finite inputs are returned unchanged.
pub fn gaussian_round(value: f64, digits: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(digits as i32);
    let scaled = if digits == 0 { value } else { value * scale };
    let n = suppress_noise(scaled);
    let whole = n.floor();
    let fraction = n - whole;
    let rounded = if fraction == 0.5 {
        if whole % 2.0 == 0.0 {
            whole
        } else {
            whole + 1.0
        }
    } else {
        n.round()
    };
    if digits == 0 {
        rounded
    } else {
        rounded / scale
    }
}

fn suppress_noise(value: f64) -> f64 {
    format!("{value:.16}").parse().unwrap_or(value)
}

/// Maximum of two values where either operand being `NaN` yields `NaN`.
pub fn js_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

/// Truncates toward zero, mapping non-finite values to `NaN`.
pub fn trunc_int(value: f64) -> f64 {
    if value.is_finite() {
        value.trunc()
    } else {
        f64::NAN
    }
}

/// Parses the longest leading decimal literal in `text`.
///
/// Leading whitespace is skipped and trailing garbage is ignored, so
/// `"12.5 uL"` yields `12.5`. Text without a numeric prefix yields `NaN`.
pub fn parse_float(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    if trimmed[end..].starts_with("Infinity") {
        return if trimmed.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - digits_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let fraction_start = end + 1;
        let mut cursor = fraction_start;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }
        mantissa_digits += cursor - fraction_start;
        if mantissa_digits > 0 {
            end = cursor;
        }
    }
    if mantissa_digits == 0 {
        return f64::NAN;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut cursor = end + 1;
        if cursor < bytes.len() && matches!(bytes[cursor], b'+' | b'-') {
            cursor += 1;
        }
        let exponent_start = cursor;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }
        if cursor > exponent_start {
            end = cursor;
        }
    }

    trimmed[..end].parse().unwrap_or(f64::NAN)
}

/// Parses the leading base-10 integer in `text`, or `NaN` when absent.
pub fn parse_int(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return f64::NAN;
    }
    trimmed[..end].parse().unwrap_or(f64::NAN)
}

/// Renders a number the way it appears in labels: integral values carry no
/// decimal point and `NaN` renders as `NaN`.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        format!("{}", value as i64)
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{value}")
    }
}
