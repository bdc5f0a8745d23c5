//! Dataset preparation: bucketing helpers and the raw-export cleaner.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use tracing::info;

use crate::error::{AppkgError, AppkgResult};
use crate::normalize::coerce;
use crate::table::Table;

/// Price tier label for a price.
pub fn price_tier(price: f64) -> String {
    if price == 0.0 {
        "Free".to_string()
    } else if price < 4.99 {
        "Affordable (<$5)".to_string()
    } else {
        "Premium (>$5)".to_string()
    }
}

/// Storage bucket label for a size in bytes.
pub fn size_bucket(bytes: f64) -> String {
    let mb = bytes / (1024.0 * 1024.0);
    if mb < 100.0 {
        "Small (<100MB)".to_string()
    } else if mb < 1000.0 {
        "Medium (100MB-1GB)".to_string()
    } else {
        "Large (>1GB)".to_string()
    }
}

/// Four-digit year of a date or timestamp, or `"0"` when it cannot be parsed.
pub fn release_year(raw: &str) -> String {
    parse_year(raw.trim())
        .map(|y| y.to_string())
        .unwrap_or_else(|| "0".to_string())
}

fn parse_year(raw: &str) -> Option<i32> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.year());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.year());
        }
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%b %d, %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d.year());
        }
    }
    None
}

/// Summary of a cleaning pass.
#[derive(Debug, Clone, Default)]
pub struct CleanReport {
    pub input_rows: usize,
    pub dropped_missing: usize,
    pub dropped_duplicates: usize,
    pub output_rows: usize,
}

/// Clean a raw export: drop unkeyed rows, fill numeric and text defaults,
/// add the bucket columns and de-duplicate by `App_Id` (first row wins).
pub fn clean_table(raw: &Table) -> AppkgResult<(Table, CleanReport)> {
    let col = |name: &str| raw.column(name);
    let id_col = col("App_Id").ok_or_else(|| AppkgError::MissingColumn("App_Id".into()))?;
    let name_col = col("App_Name").ok_or_else(|| AppkgError::MissingColumn("App_Name".into()))?;

    let numeric_fills: Vec<(usize, bool)> = [
        ("Price", false),
        ("Average_User_Rating", false),
        ("Reviews", true),
        ("Size_Bytes", true),
    ]
    .into_iter()
    .filter_map(|(name, integral)| col(name).map(|i| (i, integral)))
    .collect();

    let text_fills: Vec<(usize, &str)> = [
        ("Primary_Genre", "Unknown"),
        ("Developer", "Unknown Developer"),
        ("Content_Rating", "Not Rated"),
        ("Required_IOS_Version", "Unknown"),
    ]
    .into_iter()
    .filter_map(|(name, default)| col(name).map(|i| (i, default)))
    .collect();

    let price_col = col("Price");
    let size_col = col("Size_Bytes");
    let released_col = col("Released");

    let mut headers = raw.headers.clone();
    headers.extend(["Price_Tier", "Size_Bucket", "Release_Year"].map(String::from));

    let mut report = CleanReport {
        input_rows: raw.len(),
        ..Default::default()
    };
    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(raw.len());

    for record in &raw.rows {
        let mut cells: Vec<String> = (0..raw.headers.len())
            .map(|i| record.get(i).unwrap_or("").trim().to_string())
            .collect();

        if coerce::is_missing(&cells[id_col]) || coerce::is_missing(&cells[name_col]) {
            report.dropped_missing += 1;
            continue;
        }
        if !seen.insert(cells[id_col].clone()) {
            report.dropped_duplicates += 1;
            continue;
        }

        for &(i, integral) in &numeric_fills {
            let value = coerce::float(Some(cells[i].as_str())).unwrap_or(0.0);
            cells[i] = if integral {
                (value.trunc() as i64).to_string()
            } else {
                value.to_string()
            };
        }
        for &(i, default) in &text_fills {
            if coerce::is_missing(&cells[i]) {
                cells[i] = default.to_string();
            }
        }

        let price = price_col.and_then(|i| coerce::float(Some(cells[i].as_str()))).unwrap_or(0.0);
        let size = size_col.and_then(|i| coerce::float(Some(cells[i].as_str()))).unwrap_or(0.0);
        let year = released_col.map(|i| release_year(&cells[i])).unwrap_or_else(|| "0".to_string());

        cells.push(price_tier(price));
        cells.push(size_bucket(size));
        cells.push(year);
        rows.push(StringRecord::from(cells));
    }

    report.output_rows = rows.len();
    info!(
        input = report.input_rows,
        output = report.output_rows,
        dropped_missing = report.dropped_missing,
        dropped_duplicates = report.dropped_duplicates,
        "Cleaned table"
    );

    Ok((Table { headers, rows }, report))
}
