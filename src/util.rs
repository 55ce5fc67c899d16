// Utility helpers for parsing and basic statistics.
//
// This module centralizes all the "dirty" CSV/number/date handling so the
// rest of the code can assume clean, typed values. Every parser here returns
// `None` instead of failing; a bad cell never stops a batch.
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64`.
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace.
/// - Rejects anything that does not parse, and non-finite results such as
///   `NaN` or `inf` spelled out in the cell.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

// Tried in order after RFC 3339. Offset-bearing formats come first so the
// offset is not mistaken for trailing garbage.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse a timestamp cell permissively.
///
/// Offset-bearing values are converted to UTC and returned naive, matching
/// the naive values produced for offset-free input. Date-only values land at
/// midnight. A trailing `UTC` or `Z` marker is accepted.
pub fn parse_timestamp_safe(s: Option<&str>) -> Option<NaiveDateTime> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_utc());
        }
    }
    let s = s
        .strip_suffix(" UTC")
        .or_else(|| s.strip_suffix('Z'))
        .unwrap_or(s)
        .trim_end();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Literals that read as `false`; everything else non-missing is `true`.
///
/// The null markers are listed explicitly because a blanket truthiness cast
/// would turn an exported `NaN` or `false` into `true`.
pub const FALSE_LITERALS: &[&str] = &[
    "", "0", "false", "False", "FALSE", "nan", "NaN", "null", "NULL", "None", "NA", "N/A",
];

pub fn parse_flag(s: Option<&str>) -> bool {
    match s {
        None => false,
        Some(v) => !FALSE_LITERALS.contains(&v.trim()),
    }
}

/// Keep identifier text verbatim; only an empty cell becomes null.
pub fn parse_identifier(s: Option<&str>) -> Option<String> {
    s.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Null-propagating subtraction. An overflowing result is null too.
pub fn sub_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? - b?).filter(|v| v.is_finite())
}

/// Null-propagating multiplication. An overflowing result is null too.
pub fn mul_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? * b?).filter(|v| v.is_finite())
}

pub fn average(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    let sum: f64 = v.iter().copied().sum();
    Some(sum / v.len() as f64)
}

/// Quantile of an already sorted slice using linear interpolation between
/// closest ranks. `q` is in `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // Beyond u128 the digits are shown without separators.
    let mut res = match int_part.parse::<u128>() {
        Ok(v) => v.to_formatted_string(&Locale::en),
        Err(_) => int_part.to_string(),
    };
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts in console messages
    // (e.g., `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

// Display adapters for `#[tabled(display_with = ...)]` columns.

pub fn display_amount(v: &f64) -> String {
    format_number(*v, 2)
}

pub fn display_opt_amount(v: &Option<f64>) -> String {
    v.map(|n| format_number(n, 2)).unwrap_or_default()
}

pub fn display_opt_text(v: &Option<String>) -> String {
    v.clone().unwrap_or_default()
}
