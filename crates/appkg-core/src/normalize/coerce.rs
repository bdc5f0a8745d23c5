//! Fail-soft value coercion.
//!
//! Every function returns `None` for a missing or unusable value and leaves
//! the choice of default to the caller.

/// Tokens read as "no value", compared after trimming.
const MISSING_TOKENS: &[&str] = &[
    "", "nan", "NaN", "NAN", "NA", "N/A", "n/a", "null", "NULL", "None", "<NA>", "#N/A",
];

/// Whether a raw cell holds no value.
pub fn is_missing(raw: &str) -> bool {
    MISSING_TOKENS.contains(&raw.trim())
}

/// Trimmed text, or `None` when missing.
pub fn text(raw: Option<&str>) -> Option<String> {
    raw.filter(|s| !is_missing(s)).map(|s| s.trim().to_string())
}

/// Canonical string identifier.
///
/// Numeric identifiers written as floats (`"123.0"`) are truncated to their
/// integer form; anything that is not a finite number is kept as the trimmed
/// raw string.
pub fn identifier(raw: Option<&str>) -> Option<String> {
    let raw = raw.filter(|s| !is_missing(s))?.trim();

    match raw.parse::<f64>() {
        Ok(v) if v.is_nan() => None,
        Ok(v) if v.is_finite() && v.abs() < i64::MAX as f64 => Some((v.trunc() as i64).to_string()),
        _ => Some(raw.to_string()),
    }
}

/// Finite float, or `None`.
pub fn float(raw: Option<&str>) -> Option<f64> {
    raw.filter(|s| !is_missing(s))
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Integer, accepting float notation (`"21.0"`) by truncation.
pub fn integer(raw: Option<&str>) -> Option<i64> {
    let raw = raw.filter(|s| !is_missing(s))?.trim();
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.abs() < i64::MAX as f64)
            .map(|v| v.trunc() as i64)
    })
}

/// Boolean flag from the usual spellings.
pub fn flag(raw: Option<&str>) -> Option<bool> {
    let raw = raw.filter(|s| !is_missing(s))?.trim().to_lowercase();
    match raw.as_str() {
        "true" | "t" | "yes" | "y" | "1" | "1.0" => Some(true),
        "false" | "f" | "no" | "n" | "0" | "0.0" => Some(false),
        _ => None,
    }
}
