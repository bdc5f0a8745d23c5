//! Prompt for Cypher generation.
//!
//! The system message carries fixed instructions, a description of the App
//! graph and a few worked examples; the question goes in the user message.

use appkg_core::app::{Dimension, APP_KEY, APP_LABEL};

const INSTRUCTIONS: &str = "\
Task: Generate Cypher statement to query a graph database.
Instructions:
Use only the provided relationship types and properties in the schema.
Do not use any other relationship types or properties that are not provided.";

const CLOSING: &str = "\
Note: Do not include any explanations or apologies in your responses.
Do not include any text except the generated Cypher statement.";

/// Question / statement pairs shown to the model.
pub const EXAMPLES: &[(&str, &str)] = &[
    (
        "有多少个 App 属于 'Games' 类别？",
        r#"MATCH (:App)-[:BELONGS_TO]->(g:Genre {name: "Games"}) RETURN count(*) AS result"#,
    ),
    (
        "找出评分高于 4.5 且免费的游戏。",
        r#"MATCH (a:App)-[:BELONGS_TO]->(:Genre {name: "Games"}) WHERE a.rating > 4.5 AND a.free = true RETURN a.name AS result"#,
    ),
    (
        "Minecraft 这个应用属于什么分级？",
        r#"MATCH (a:App {name: "Minecraft"})-[:CLASSIFIED_AS]->(cr:ContentRating) RETURN cr.level AS result"#,
    ),
    (
        "哪种分类的应用平均价格最高？",
        "MATCH (a:App)-[:BELONGS_TO]->(g:Genre) RETURN g.name AS genre, avg(a.price) AS avg_price ORDER BY avg_price DESC LIMIT 1",
    ),
    (
        "Mojang 开发了哪些应用？",
        r#"MATCH (a:App)-[:DEVELOPED_BY]->(:Developer {name: "Mojang"}) RETURN a.name AS result"#,
    ),
    (
        "2015 年发布的大型应用有哪些？",
        r#"MATCH (y:Year {value: "2015"})<-[:RELEASED_IN]-(a:App)-[:SPACE_OCCUPIED]->(:SizeBucket {label: "Large (>1GB)"}) RETURN a.name AS result"#,
    ),
];

/// Node properties and relationships of the App graph.
pub fn schema_description() -> String {
    let mut lines = vec![
        "Node properties:".to_string(),
        format!(
            "{} {{{}: STRING, name: STRING, rating: DOUBLE, reviews: INTEGER, version: STRING, url: STRING, price: DOUBLE, free: BOOLEAN}}",
            APP_LABEL, APP_KEY
        ),
    ];

    for dim in Dimension::ALL {
        if dim == Dimension::Developer {
            lines.push(format!("{} {{{}: STRING, id: STRING, url: STRING}}", dim.label(), dim.key()));
        } else {
            lines.push(format!("{} {{{}: STRING}}", dim.label(), dim.key()));
        }
    }

    lines.push(String::new());
    lines.push("The relationships:".to_string());
    for dim in Dimension::ALL {
        lines.push(format!("(:{})-[:{}]->(:{})", APP_LABEL, dim.relationship(), dim.label()));
    }

    lines.join("\n")
}

fn examples() -> String {
    EXAMPLES
        .iter()
        .map(|(question, cypher)| format!("# {}\n{}", question, cypher))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The full system message.
pub fn system_prompt() -> String {
    format!(
        "{}\nSchema:\n{}\n\nExamples: Here are examples of generated Cypher statements for particular questions:\n{}\n\n{}",
        INSTRUCTIONS,
        schema_description(),
        examples(),
        CLOSING
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_lists_every_relationship() {
        let schema = schema_description();
        for dim in Dimension::ALL {
            assert!(schema.contains(&format!("-[:{}]->(:{})", dim.relationship(), dim.label())));
        }
        assert!(schema.contains("IOSVersion {v: STRING}"));
        assert!(schema.contains("Developer {name: STRING, id: STRING, url: STRING}"));
    }

    #[test]
    fn test_examples_only_use_known_relationships() {
        let known: Vec<_> = Dimension::ALL.iter().map(|d| d.relationship()).collect();
        for (_, cypher) in EXAMPLES {
            for part in cypher.split("[:").skip(1) {
                let rel = part.split(']').next().unwrap_or_default();
                assert!(known.contains(&rel), "unknown relationship {}", rel);
            }
        }
    }

    #[test]
    fn test_system_prompt_layout() {
        let prompt = system_prompt();
        assert!(prompt.starts_with("Task: Generate Cypher statement"));
        assert!(prompt.contains("Schema:\nNode properties:"));
        assert!(prompt.ends_with("except the generated Cypher statement."));
    }
}
