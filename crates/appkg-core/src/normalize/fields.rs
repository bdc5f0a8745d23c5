//! Canonical fields and the column alias table.
//!
//! Each canonical field lists the source column names it accepts, in order of
//! preference, how its raw text is coerced, and what it becomes when no column
//! matches or the value is missing.

use serde::Serialize;

use super::coerce;

/// A canonical field of the normalized record, plus the two auxiliary source
/// columns used to derive bucket defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    AppId,
    Name,
    Rating,
    Reviews,
    Version,
    Url,
    Price,
    Free,
    Developer,
    DeveloperId,
    DeveloperUrl,
    Genre,
    ContentRating,
    PriceTier,
    SizeBucket,
    IosVersion,
    ReleaseYear,
    SizeBytes,
    Released,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::AppId => "app_id",
            Field::Name => "name",
            Field::Rating => "rating",
            Field::Reviews => "reviews",
            Field::Version => "version",
            Field::Url => "url",
            Field::Price => "price",
            Field::Free => "free",
            Field::Developer => "developer",
            Field::DeveloperId => "developer_id",
            Field::DeveloperUrl => "developer_url",
            Field::Genre => "genre",
            Field::ContentRating => "content_rating",
            Field::PriceTier => "price_tier",
            Field::SizeBucket => "size_bucket",
            Field::IosVersion => "ios_version",
            Field::ReleaseYear => "release_year",
            Field::SizeBytes => "size_bytes",
            Field::Released => "released",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the raw text of a field is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Identifier,
    Text,
    Float,
    Integer,
    Flag,
}

impl Coercion {
    /// Convert raw text, or `None` when it is missing or unusable.
    pub fn apply(&self, raw: Option<&str>) -> Option<Value> {
        match self {
            Coercion::Identifier => coerce::identifier(raw).map(Value::Text),
            Coercion::Text => coerce::text(raw).map(Value::Text),
            Coercion::Float => coerce::float(raw).map(Value::Float),
            Coercion::Integer => coerce::integer(raw).map(Value::Integer),
            Coercion::Flag => coerce::flag(raw).map(Value::Flag),
        }
    }
}

/// A coerced field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Float(f64),
    Integer(i64),
    Flag(bool),
}

impl Value {
    pub fn into_text(self) -> String {
        match self {
            Value::Text(s) => s,
            Value::Float(v) => v.to_string(),
            Value::Integer(v) => v.to_string(),
            Value::Flag(b) => b.to_string(),
        }
    }

    pub fn as_float(&self) -> f64 {
        match self {
            Value::Float(v) => *v,
            Value::Integer(v) => *v as f64,
            Value::Text(s) => coerce::float(Some(s)).unwrap_or(0.0),
            Value::Flag(b) => f64::from(u8::from(*b)),
        }
    }

    pub fn as_integer(&self) -> i64 {
        match self {
            Value::Integer(v) => *v,
            Value::Float(v) => v.trunc() as i64,
            Value::Text(s) => coerce::integer(Some(s)).unwrap_or(0),
            Value::Flag(b) => i64::from(*b),
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Value::Flag(b) => Some(*b),
            Value::Text(s) => coerce::flag(Some(s)),
            Value::Float(v) => Some(*v != 0.0),
            Value::Integer(v) => Some(*v != 0),
        }
    }
}

/// What a field becomes when its column is absent or its value is missing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fallback {
    /// The row cannot be normalized without this field.
    Required,
    Text(&'static str),
    Float(f64),
    Integer(i64),
    /// Computed from other fields of the same row.
    Derived,
}

impl Fallback {
    /// The default value, if the table supplies one.
    pub fn value(&self) -> Option<Value> {
        match self {
            Fallback::Text(s) => Some(Value::Text(s.to_string())),
            Fallback::Float(v) => Some(Value::Float(*v)),
            Fallback::Integer(v) => Some(Value::Integer(*v)),
            Fallback::Required | Fallback::Derived => None,
        }
    }
}

/// One entry of the alias table.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: Field,
    /// Accepted source names, lower-case, in order of preference.
    pub aliases: &'static [&'static str],
    /// Use the first column when no alias matches.
    pub first_column_fallback: bool,
    pub coercion: Coercion,
    pub fallback: Fallback,
}

impl FieldSpec {
    /// Coerce a raw cell, falling back to the table default.
    ///
    /// `None` means the value is missing and the field is required or
    /// derived from other fields.
    pub fn resolve(&self, raw: Option<&str>) -> Option<Value> {
        self.coercion.apply(raw).or_else(|| self.fallback.value())
    }
}

const fn spec(
    field: Field,
    aliases: &'static [&'static str],
    coercion: Coercion,
    fallback: Fallback,
) -> FieldSpec {
    FieldSpec {
        field,
        aliases,
        first_column_fallback: false,
        coercion,
        fallback,
    }
}

pub const DEFAULT_NAME: &str = "Unknown";
pub const DEFAULT_VERSION: &str = "Unknown";
pub const DEFAULT_DEVELOPER: &str = "Unknown Developer";
pub const DEFAULT_GENRE: &str = "Other";
pub const DEFAULT_CONTENT_RATING: &str = "4+";
pub const DEFAULT_IOS_VERSION: &str = "Unknown";
pub const DEFAULT_RELEASE_YEAR: &str = "0";

/// The alias table, evaluated once per file.
pub const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        field: Field::AppId,
        aliases: &["app_id", "id"],
        first_column_fallback: true,
        coercion: Coercion::Identifier,
        fallback: Fallback::Required,
    },
    spec(Field::Name, &["app_name", "track_name", "name"], Coercion::Text, Fallback::Text(DEFAULT_NAME)),
    spec(Field::Rating, &["average_user_rating", "user_rating", "rating"], Coercion::Float, Fallback::Float(0.0)),
    spec(Field::Reviews, &["reviews", "rating_count_tot"], Coercion::Integer, Fallback::Integer(0)),
    spec(Field::Version, &["version", "ver"], Coercion::Text, Fallback::Text(DEFAULT_VERSION)),
    spec(Field::Url, &["appstore_url", "url"], Coercion::Text, Fallback::Text("")),
    spec(Field::Price, &["price"], Coercion::Float, Fallback::Float(0.0)),
    spec(Field::Free, &["free"], Coercion::Flag, Fallback::Derived),
    spec(Field::Developer, &["developer", "developer_name"], Coercion::Text, Fallback::Text(DEFAULT_DEVELOPER)),
    spec(Field::DeveloperId, &["developerid", "developer_id"], Coercion::Identifier, Fallback::Text("")),
    spec(Field::DeveloperUrl, &["developer_url"], Coercion::Text, Fallback::Text("")),
    spec(Field::Genre, &["primary_genre", "prime_genre", "genre"], Coercion::Text, Fallback::Text(DEFAULT_GENRE)),
    spec(Field::ContentRating, &["content_rating", "cont_rating"], Coercion::Text, Fallback::Text(DEFAULT_CONTENT_RATING)),
    spec(Field::PriceTier, &["price_tier"], Coercion::Text, Fallback::Derived),
    spec(Field::SizeBucket, &["size_bucket"], Coercion::Text, Fallback::Derived),
    spec(Field::IosVersion, &["required_ios_version", "ios_version"], Coercion::Text, Fallback::Text(DEFAULT_IOS_VERSION)),
    spec(Field::ReleaseYear, &["release_year"], Coercion::Text, Fallback::Derived),
    spec(Field::SizeBytes, &["size_bytes"], Coercion::Float, Fallback::Float(0.0)),
    spec(Field::Released, &["released", "release_date"], Coercion::Text, Fallback::Text("")),
];

/// Look up the alias table entry for a field.
pub fn field_spec(field: Field) -> &'static FieldSpec {
    FIELDS
        .iter()
        .find(|s| s.field == field)
        .unwrap_or(&FIELDS[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_field_has_one_entry() {
        let mut fields: Vec<_> = FIELDS.iter().map(|s| s.field).collect();
        fields.sort();
        fields.dedup();
        assert_eq!(fields.len(), FIELDS.len());
        assert_eq!(field_spec(Field::Genre).fallback, Fallback::Text("Other"));
    }

    #[test]
    fn test_aliases_are_lower_case() {
        for spec in FIELDS {
            for alias in spec.aliases {
                assert_eq!(*alias, alias.trim().to_lowercase(), "alias {alias} of {}", spec.field);
            }
        }
    }

    #[test]
    fn test_only_identifier_is_required() {
        let required: Vec<_> = FIELDS
            .iter()
            .filter(|s| s.fallback == Fallback::Required)
            .map(|s| s.field)
            .collect();
        assert_eq!(required, vec![Field::AppId]);
        assert!(field_spec(Field::AppId).first_column_fallback);
    }

    #[test]
    fn test_missing_values_resolve_to_table_defaults() {
        for spec in FIELDS {
            for raw in [None, Some(""), Some("NaN")] {
                assert_eq!(spec.resolve(raw), spec.fallback.value(), "{} from {raw:?}", spec.field);
            }
        }
    }

    #[test]
    fn test_resolve_follows_coercion_column() {
        assert_eq!(field_spec(Field::AppId).resolve(Some("123.0")), Some(Value::Text("123".into())));
        assert_eq!(field_spec(Field::DeveloperId).resolve(Some("99.0")), Some(Value::Text("99".into())));
        assert_eq!(field_spec(Field::Name).resolve(Some(" 99.0 ")), Some(Value::Text("99.0".into())));
        assert_eq!(field_spec(Field::Reviews).resolve(Some("21.0")), Some(Value::Integer(21)));
        assert_eq!(field_spec(Field::Rating).resolve(Some("lots")), Some(Value::Float(0.0)));
        assert_eq!(field_spec(Field::Free).resolve(Some("yes")), Some(Value::Flag(true)));
        assert_eq!(field_spec(Field::Free).resolve(Some("maybe")), None);
    }
}
