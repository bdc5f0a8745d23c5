//! Cypher templates for App upserts.
//!
//! Both backends send the same statement shape:
//!
//! ```cypher
//! MERGE (app:App {id: …}) SET app.… = …
//! MERGE (dev:Developer {name: …}) SET dev.id = …, dev.url = …
//! MERGE (genre:Genre {name: …})
//! …
//! MERGE (app)-[:DEVELOPED_BY]->(dev)
//! …
//! ```
//!
//! Bulk writes bind a list with `UNWIND $rows AS row`; per-row writes bind
//! flat parameters (`$app_id`, `$name`, …).

use neo4rs::{BoltBoolean, BoltFloat, BoltInteger, BoltMap, BoltString, BoltType, Query};

use appkg_core::app::{AppRecord, Dimension, APP_KEY, APP_LABEL};

/// How row values are referenced inside the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// `UNWIND $rows AS row`, values as `row.field`.
    Unwind,
    /// One row, values as `$field`.
    Single,
}

impl Binding {
    fn value(&self, field: &str) -> String {
        match self {
            Binding::Unwind => format!("row.{}", field),
            Binding::Single => format!("${}", field),
        }
    }
}

/// App properties written on every upsert, as (property, row field).
pub const APP_PROPERTIES: &[(&str, &str)] = &[
    ("name", "name"),
    ("rating", "rating"),
    ("reviews", "reviews"),
    ("version", "version"),
    ("url", "url"),
    ("price", "price"),
    ("free", "free"),
];

/// Developer properties besides its key, as (property, row field).
pub const DEVELOPER_PROPERTIES: &[(&str, &str)] = &[("id", "developer_id"), ("url", "developer_url")];

/// Row field holding each dimension's value.
pub fn dimension_field(dim: Dimension) -> &'static str {
    match dim {
        Dimension::Developer => "developer",
        Dimension::Genre => "genre",
        Dimension::ContentRating => "content_rating",
        Dimension::PriceTier => "price_tier",
        Dimension::SizeBucket => "size_bucket",
        Dimension::IosVersion => "ios_version",
        Dimension::Year => "release_year",
    }
}

/// Render the upsert statement for the given binding.
pub fn upsert_app_cypher(binding: Binding) -> String {
    let mut lines = Vec::new();

    if binding == Binding::Unwind {
        lines.push("UNWIND $rows AS row".to_string());
    }

    lines.push(format!(
        "MERGE (app:{} {{{}: {}}})",
        APP_LABEL,
        APP_KEY,
        binding.value("app_id")
    ));
    lines.push(format!("SET {}", assignments("app", APP_PROPERTIES, binding)));

    for dim in Dimension::ALL {
        lines.push(format!(
            "MERGE ({}:{} {{{}: {}}})",
            dim.var(),
            dim.label(),
            dim.key(),
            binding.value(dimension_field(dim))
        ));
        if dim == Dimension::Developer {
            lines.push(format!("SET {}", assignments(dim.var(), DEVELOPER_PROPERTIES, binding)));
        }
    }

    for dim in Dimension::ALL {
        lines.push(format!("MERGE (app)-[:{}]->({})", dim.relationship(), dim.var()));
    }

    lines.join("\n")
}

fn assignments(var: &str, props: &[(&str, &str)], binding: Binding) -> String {
    props
        .iter()
        .map(|(prop, field)| format!("{}.{} = {}", var, prop, binding.value(field)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Every row field as a Bolt value, keyed by field name.
fn row_fields(app: &AppRecord) -> Vec<(&'static str, BoltType)> {
    vec![
        ("app_id", text(&app.app_id)),
        ("name", text(&app.name)),
        ("rating", BoltType::Float(BoltFloat::new(app.rating))),
        ("reviews", BoltType::Integer(BoltInteger::new(app.reviews))),
        ("version", text(&app.version)),
        ("url", text(&app.url)),
        ("price", BoltType::Float(BoltFloat::new(app.price))),
        ("free", BoltType::Boolean(BoltBoolean::new(app.free))),
        ("developer", text(&app.developer)),
        ("developer_id", text(&app.developer_id)),
        ("developer_url", text(&app.developer_url)),
        ("genre", text(&app.genre)),
        ("content_rating", text(&app.content_rating)),
        ("price_tier", text(&app.price_tier)),
        ("size_bucket", text(&app.size_bucket)),
        ("ios_version", text(&app.ios_version)),
        ("release_year", text(&app.release_year)),
    ]
}

fn text(value: &str) -> BoltType {
    BoltType::String(BoltString::from(value))
}

/// One row as a Bolt map, for `UNWIND $rows`.
pub fn row_map(app: &AppRecord) -> BoltType {
    BoltType::Map(BoltMap::from_iter(
        row_fields(app)
            .into_iter()
            .map(|(k, v)| (BoltString::from(k), v)),
    ))
}

/// Bulk upsert for a batch of rows.
pub fn upsert_batch_query(rows: &[AppRecord]) -> Query {
    let rows: Vec<BoltType> = rows.iter().map(row_map).collect();
    Query::new(upsert_app_cypher(Binding::Unwind)).param("rows", rows)
}

/// Upsert for a single row with flat parameters.
pub fn upsert_row_query(app: &AppRecord) -> Query {
    row_fields(app)
        .into_iter()
        .fold(Query::new(upsert_app_cypher(Binding::Single)), |query, (k, v)| query.param(k, v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwind_statement_shape() {
        let cypher = upsert_app_cypher(Binding::Unwind);
        assert!(cypher.starts_with("UNWIND $rows AS row\nMERGE (app:App {id: row.app_id})"));
        assert!(cypher.contains("SET app.name = row.name, app.rating = row.rating"));
        assert!(cypher.contains("MERGE (dev:Developer {name: row.developer})\nSET dev.id = row.developer_id, dev.url = row.developer_url"));
        assert!(cypher.contains("MERGE (ios:IOSVersion {v: row.ios_version})"));
        assert!(cypher.contains("MERGE (app)-[:RELEASED_IN]->(year)"));
        assert_eq!(cypher.matches('$').count(), 1);
    }

    #[test]
    fn test_single_statement_has_same_shape() {
        let bulk = upsert_app_cypher(Binding::Unwind);
        let single = upsert_app_cypher(Binding::Single);

        assert!(!single.contains("UNWIND"));
        assert!(single.contains("MERGE (genre:Genre {name: $genre})"));

        let strip = |s: &str| s.replace("row.", "$").replace("UNWIND $rows AS row\n", "");
        assert_eq!(strip(&bulk), single);
    }

    #[test]
    fn test_every_relationship_is_merged_once() {
        let cypher = upsert_app_cypher(Binding::Single);
        for dim in Dimension::ALL {
            let pattern = format!("-[:{}]->", dim.relationship());
            assert_eq!(cypher.matches(&pattern).count(), 1, "{}", dim);
        }
        assert!(!cypher.contains("CREATE"));
    }

    #[test]
    fn test_row_fields_cover_statement_parameters() {
        let app = AppRecord {
            app_id: "1".into(),
            name: "n".into(),
            rating: 0.0,
            reviews: 0,
            version: "v".into(),
            url: String::new(),
            price: 0.0,
            free: true,
            developer: "d".into(),
            developer_id: String::new(),
            developer_url: String::new(),
            genre: "g".into(),
            content_rating: "4+".into(),
            price_tier: "Free".into(),
            size_bucket: "Small (<100MB)".into(),
            ios_version: "Unknown".into(),
            release_year: "0".into(),
        };
        let single = upsert_app_cypher(Binding::Single);
        let fields: Vec<_> = row_fields(&app).into_iter().map(|(k, _)| k).collect();
        for field in &fields {
            assert!(single.contains(&format!("${}", field)), "{} unused", field);
        }
    }
}
