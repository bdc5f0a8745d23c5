//! Row normalization.
//!
//! Source headers are resolved against the alias table once per file; each row
//! is then turned into an [`AppRecord`] with every field populated. Only a
//! missing identifier rejects a row.

pub mod coerce;
pub mod fields;

use std::collections::BTreeMap;

use csv::StringRecord;
use tracing::{debug, info};

use crate::app::model::AppRecord;
use crate::clean;
use crate::error::SkipRow;
use crate::table::Table;
use fields::{field_spec, Field, Value, FIELDS};

/// Column resolution for one file.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    columns: BTreeMap<Field, usize>,
    headers: Vec<String>,
}

/// Output of normalizing a whole table.
#[derive(Debug, Clone, Default)]
pub struct NormalizedTable {
    pub records: Vec<AppRecord>,
    pub skipped: usize,
}

impl Normalizer {
    /// Resolve canonical fields against the given header row.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let headers: Vec<String> = headers.iter().map(|h| h.as_ref().to_string()).collect();

        let lookup: BTreeMap<String, usize> = headers
            .iter()
            .enumerate()
            .rev()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();

        let mut columns = BTreeMap::new();
        for spec in FIELDS {
            let found = spec
                .aliases
                .iter()
                .find_map(|alias| lookup.get(*alias).copied())
                .or_else(|| (spec.first_column_fallback && !headers.is_empty()).then_some(0));

            if let Some(index) = found {
                columns.insert(spec.field, index);
            }
        }

        Self { columns, headers }
    }

    /// Source column name resolved for a field, if any.
    pub fn resolved(&self, field: Field) -> Option<&str> {
        self.columns
            .get(&field)
            .and_then(|&i| self.headers.get(i))
            .map(String::as_str)
    }

    /// Log which source column each canonical field was matched to.
    pub fn log_resolution(&self) {
        let id = self.resolved(Field::AppId).unwrap_or("-");
        let name = self.resolved(Field::Name).unwrap_or("-");
        let genre = self.resolved(Field::Genre).unwrap_or("-");
        info!(id, name, genre, "Resolved source columns");

        for spec in FIELDS {
            match self.resolved(spec.field) {
                Some(column) => debug!(field = %spec.field, column, "Column matched"),
                None => debug!(field = %spec.field, "No column matched, using default"),
            }
        }
    }

    /// Normalize one row. `line` is only used for the rejection reason.
    pub fn normalize<S: AsRef<str>>(&self, values: &[S], line: usize) -> Result<AppRecord, SkipRow> {
        let raw = |field: Field| {
            self.columns
                .get(&field)
                .and_then(|&i| values.get(i))
                .map(|v| v.as_ref())
        };

        let value = |field: Field| field_spec(field).resolve(raw(field));
        let text = |field: Field| value(field).map(Value::into_text).unwrap_or_default();
        let float = |field: Field| value(field).map_or(0.0, |v| v.as_float());

        let app_id = value(Field::AppId)
            .map(Value::into_text)
            .ok_or(SkipRow::MissingId { line })?;

        let price = float(Field::Price);
        let free = value(Field::Free).and_then(|v| v.as_flag()).unwrap_or(price == 0.0);

        let price_tier = value(Field::PriceTier)
            .map(Value::into_text)
            .unwrap_or_else(|| clean::price_tier(price));
        let size_bucket = value(Field::SizeBucket)
            .map(Value::into_text)
            .unwrap_or_else(|| clean::size_bucket(float(Field::SizeBytes)));
        let release_year = value(Field::ReleaseYear)
            .map(Value::into_text)
            .unwrap_or_else(|| clean::release_year(&text(Field::Released)));

        Ok(AppRecord {
            app_id,
            name: text(Field::Name),
            rating: float(Field::Rating),
            reviews: value(Field::Reviews).map_or(0, |v| v.as_integer()),
            version: text(Field::Version),
            url: text(Field::Url),
            price,
            free,
            developer: text(Field::Developer),
            developer_id: text(Field::DeveloperId),
            developer_url: text(Field::DeveloperUrl),
            genre: text(Field::Genre),
            content_rating: text(Field::ContentRating),
            price_tier,
            size_bucket,
            ios_version: text(Field::IosVersion),
            release_year,
        })
    }

    /// Normalize a parsed CSV record.
    pub fn normalize_record(&self, record: &StringRecord, line: usize) -> Result<AppRecord, SkipRow> {
        let values: Vec<&str> = record.iter().collect();
        self.normalize(&values, line)
    }

    /// Normalize every row of a table, dropping rows that cannot be keyed.
    pub fn normalize_table(&self, table: &Table) -> NormalizedTable {
        let mut out = NormalizedTable::default();

        // Line numbers are 1-based and count the header row.
        for (i, record) in table.rows.iter().enumerate() {
            match self.normalize_record(record, i + 2) {
                Ok(app) => out.records.push(app),
                Err(reason) => {
                    debug!(%reason, "Skipping row");
                    out.skipped += 1;
                }
            }
        }

        out
    }
}

/// Resolve columns from the table's own header and normalize all of its rows.
pub fn normalize_table(table: &Table) -> NormalizedTable {
    let normalizer = Normalizer::from_headers(&table.headers);
    normalizer.log_resolution();
    normalizer.normalize_table(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<&'static str> {
        vec![
            "App_Id", "App_Name", "Primary_Genre", "Content_Rating", "Price", "Average_User_Rating",
            "Reviews", "Developer", "DeveloperId", "Size_Bytes", "Released",
        ]
    }

    #[test]
    fn test_resolves_aliases_case_insensitively() {
        let n = Normalizer::from_headers(&[" ID ", "Track_Name", "prime_genre", "cont_rating"]);
        assert_eq!(n.resolved(Field::AppId), Some(" ID "));
        assert_eq!(n.resolved(Field::Name), Some("Track_Name"));
        assert_eq!(n.resolved(Field::Genre), Some("prime_genre"));
        assert_eq!(n.resolved(Field::ContentRating), Some("cont_rating"));
        assert_eq!(n.resolved(Field::Price), None);
    }

    #[test]
    fn test_identifier_falls_back_to_first_column() {
        let n = Normalizer::from_headers(&["bundle", "track_name"]);
        assert_eq!(n.resolved(Field::AppId), Some("bundle"));

        let app = n.normalize(&["com.example.notes", "Notes"], 2).unwrap();
        assert_eq!(app.app_id, "com.example.notes");
        assert_eq!(app.name, "Notes");
    }

    #[test]
    fn test_full_row() {
        let n = Normalizer::from_headers(&headers());
        let app = n
            .normalize(
                &[
                    "123.0", "Chess Pro", "Games", "12+", "2.99", "4.5", "1200", "Acme", "99.0",
                    "157286400", "2017-05-30T07:00:00Z",
                ],
                2,
            )
            .unwrap();

        assert_eq!(app.app_id, "123");
        assert_eq!(app.name, "Chess Pro");
        assert_eq!(app.genre, "Games");
        assert_eq!(app.content_rating, "12+");
        assert_eq!(app.price, 2.99);
        assert!(!app.free);
        assert_eq!(app.rating, 4.5);
        assert_eq!(app.reviews, 1200);
        assert_eq!(app.developer_id, "99");
        assert_eq!(app.price_tier, "Affordable (<$5)");
        assert_eq!(app.size_bucket, "Medium (100MB-1GB)");
        assert_eq!(app.release_year, "2017");
    }

    #[test]
    fn test_missing_columns_take_defaults() {
        let n = Normalizer::from_headers(&["id", "name"]);
        let app = n.normalize(&["abc", "Notes"], 2).unwrap();

        assert_eq!(app.app_id, "abc");
        assert_eq!(app.genre, "Other");
        assert_eq!(app.content_rating, "4+");
        assert_eq!(app.developer, "Unknown Developer");
        assert_eq!(app.ios_version, "Unknown");
        assert_eq!(app.price, 0.0);
        assert!(app.free);
        assert_eq!(app.price_tier, "Free");
        assert_eq!(app.size_bucket, "Small (<100MB)");
        assert_eq!(app.release_year, "0");
    }

    #[test]
    fn test_bad_values_coerce_softly() {
        let n = Normalizer::from_headers(&headers());
        let app = n
            .normalize(&["7", "", "NaN", "", "free", "excellent", "lots", "", "", "", "someday"], 2)
            .unwrap();

        assert_eq!(app.name, "Unknown");
        assert_eq!(app.genre, "Other");
        assert_eq!(app.price, 0.0);
        assert_eq!(app.rating, 0.0);
        assert_eq!(app.reviews, 0);
        assert_eq!(app.release_year, "0");
    }

    #[test]
    fn test_short_row_uses_defaults_for_absent_cells() {
        let n = Normalizer::from_headers(&headers());
        let app = n.normalize(&["42", "Short"], 2).unwrap();
        assert_eq!(app.app_id, "42");
        assert_eq!(app.genre, "Other");
    }

    #[test]
    fn test_rows_without_identifier_are_skipped() {
        let n = Normalizer::from_headers(&headers());
        assert_eq!(n.normalize(&["", "Nameless"], 5), Err(SkipRow::MissingId { line: 5 }));
        assert_eq!(n.normalize(&["nan", "Nameless"], 6), Err(SkipRow::MissingId { line: 6 }));
    }

    #[test]
    fn test_normalize_table_counts_skipped_rows() {
        let table = Table::parse("App_Id,App_Name\n1.0,A\n,B\nabc,C\nNaN,D\n", None).unwrap();
        let out = normalize_table(&table);
        assert_eq!(out.skipped, 2);
        let ids: Vec<_> = out.records.iter().map(|a| a.app_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "abc"]);
    }

    fn record_text(app: &AppRecord, field: Field) -> Option<&str> {
        let value = match field {
            Field::Name => &app.name,
            Field::Version => &app.version,
            Field::Url => &app.url,
            Field::Developer => &app.developer,
            Field::DeveloperId => &app.developer_id,
            Field::DeveloperUrl => &app.developer_url,
            Field::Genre => &app.genre,
            Field::ContentRating => &app.content_rating,
            Field::IosVersion => &app.ios_version,
            _ => return None,
        };
        Some(value.as_str())
    }

    #[test]
    fn test_record_defaults_come_from_alias_table() {
        let n = Normalizer::from_headers(&["id"]);
        let app = n.normalize(&["1"], 2).unwrap();

        for spec in FIELDS {
            if let (Some(actual), fields::Fallback::Text(default)) = (record_text(&app, spec.field), spec.fallback) {
                assert_eq!(actual, default, "default of {}", spec.field);
            }
        }
        assert_eq!(app.rating, 0.0);
        assert_eq!(app.reviews, 0);
    }

    #[test]
    fn test_identifier_coercion_applies_to_developer_id() {
        let n = Normalizer::from_headers(&["App_Id", "Developer_Id"]);
        let app = n.normalize(&["5", "4040.0"], 2).unwrap();
        assert_eq!(app.developer_id, "4040");
    }

    #[test]
    fn test_explicit_bucket_columns_win_over_derivation() {
        let n = Normalizer::from_headers(&["App_Id", "Price", "Price_Tier", "Release_Year"]);
        let app = n.normalize(&["1", "0", "Promo", "2020"], 2).unwrap();
        assert_eq!(app.price_tier, "Promo");
        assert_eq!(app.release_year, "2020");
    }
}
