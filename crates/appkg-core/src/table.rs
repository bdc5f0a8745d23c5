//! Delimited table input and output.
//!
//! Files are decoded as UTF-8 first and re-decoded as Windows-1252 (a Latin-1
//! superset) when that fails, then parsed with a header row.

use std::borrow::Cow;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use encoding_rs::{UTF_8, WINDOWS_1252};
use tracing::{debug, warn};

use crate::error::{AppkgError, AppkgResult};

/// A header row plus data rows, as read from a CSV file.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<StringRecord>,
}

/// Decode raw file bytes into text, returning the encoding that succeeded.
pub fn decode(bytes: &[u8]) -> (Cow<'_, str>, &'static str) {
    let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
    if !had_errors {
        return (text, UTF_8.name());
    }

    warn!("Input is not valid UTF-8, falling back to {}", WINDOWS_1252.name());
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    (text, WINDOWS_1252.name())
}

impl Table {
    /// Read a CSV file, keeping at most `limit` data rows.
    pub fn read_path(path: &Path, limit: Option<usize>) -> AppkgResult<Self> {
        let bytes = std::fs::read(path)?;
        let (text, encoding) = decode(&bytes);
        debug!(path = %path.display(), encoding, "Decoded input table");

        Self::parse(&text, limit).map_err(|e| match e {
            AppkgError::MissingHeader(_) => AppkgError::MissingHeader(path.display().to_string()),
            other => other,
        })
    }

    /// Parse CSV text with a header row.
    pub fn parse(text: &str, limit: Option<usize>) -> AppkgResult<Self> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(AppkgError::MissingHeader("<text>".to_string()));
        }

        let limit = limit.unwrap_or(usize::MAX);
        let mut rows = Vec::new();
        for record in reader.records().take(limit) {
            rows.push(record?);
        }

        Ok(Self { headers, rows })
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column, matched case- and whitespace-insensitively.
    pub fn column(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        self.headers
            .iter()
            .position(|h| h.trim().to_lowercase() == wanted)
    }

    /// Write the table as UTF-8 CSV.
    pub fn write_path(&self, path: &Path) -> AppkgResult<()> {
        let mut writer = WriterBuilder::new().flexible(true).from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}
