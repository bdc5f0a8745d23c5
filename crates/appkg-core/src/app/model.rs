//! App domain models.

use serde::{Deserialize, Serialize};

/// A normalized App row, ready to be upserted into the graph.
///
/// Every field is populated; missing source values have already been replaced
/// by their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppRecord {
    pub app_id: String,
    pub name: String,
    pub rating: f64,
    pub reviews: i64,
    pub version: String,
    pub url: String,
    pub price: f64,
    pub free: bool,
    pub developer: String,
    pub developer_id: String,
    pub developer_url: String,
    pub genre: String,
    pub content_rating: String,
    pub price_tier: String,
    pub size_bucket: String,
    pub ios_version: String,
    pub release_year: String,
}

impl AppRecord {
    /// Value of the given dimension for this app.
    pub fn dimension(&self, dim: Dimension) -> &str {
        match dim {
            Dimension::Developer => &self.developer,
            Dimension::Genre => &self.genre,
            Dimension::ContentRating => &self.content_rating,
            Dimension::PriceTier => &self.price_tier,
            Dimension::SizeBucket => &self.size_bucket,
            Dimension::IosVersion => &self.ios_version,
            Dimension::Year => &self.release_year,
        }
    }
}

/// Low-cardinality classification nodes shared by many App nodes.
///
/// Each dimension is a node label with one unique key property, reached from
/// App through exactly one relationship type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Developer,
    Genre,
    ContentRating,
    PriceTier,
    SizeBucket,
    IosVersion,
    Year,
}

/// Label of the entity node.
pub const APP_LABEL: &str = "App";

/// Unique key property of the entity node.
pub const APP_KEY: &str = "id";

impl Dimension {
    /// Every dimension, in the order relationships are written.
    pub const ALL: [Dimension; 7] = [
        Dimension::Developer,
        Dimension::Genre,
        Dimension::ContentRating,
        Dimension::PriceTier,
        Dimension::SizeBucket,
        Dimension::IosVersion,
        Dimension::Year,
    ];

    /// The graph node label for this dimension.
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Developer => "Developer",
            Dimension::Genre => "Genre",
            Dimension::ContentRating => "ContentRating",
            Dimension::PriceTier => "PriceTier",
            Dimension::SizeBucket => "SizeBucket",
            Dimension::IosVersion => "IOSVersion",
            Dimension::Year => "Year",
        }
    }

    /// The unique key property of the dimension node.
    pub fn key(&self) -> &'static str {
        match self {
            Dimension::Developer | Dimension::Genre => "name",
            Dimension::ContentRating => "level",
            Dimension::PriceTier | Dimension::SizeBucket => "label",
            Dimension::IosVersion => "v",
            Dimension::Year => "value",
        }
    }

    /// Relationship type from App to this dimension.
    pub fn relationship(&self) -> &'static str {
        match self {
            Dimension::Developer => "DEVELOPED_BY",
            Dimension::Genre => "BELONGS_TO",
            Dimension::ContentRating => "CLASSIFIED_AS",
            Dimension::PriceTier => "HAS_PRICE_TIER",
            Dimension::SizeBucket => "SPACE_OCCUPIED",
            Dimension::IosVersion => "REQUIRES_OS",
            Dimension::Year => "RELEASED_IN",
        }
    }

    /// Short variable name used when rendering Cypher patterns.
    pub fn var(&self) -> &'static str {
        match self {
            Dimension::Developer => "dev",
            Dimension::Genre => "genre",
            Dimension::ContentRating => "cr",
            Dimension::PriceTier => "pt",
            Dimension::SizeBucket => "sb",
            Dimension::IosVersion => "ios",
            Dimension::Year => "year",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_types_are_distinct() {
        let mut rels: Vec<_> = Dimension::ALL.iter().map(|d| d.relationship()).collect();
        rels.sort();
        rels.dedup();
        assert_eq!(rels.len(), Dimension::ALL.len());
    }
}
