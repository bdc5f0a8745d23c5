//! Question parser: question text to generated Cypher to a short answer.
//!
//! Each stage failure becomes part of the returned record; nothing here
//! returns an error to the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use appkg_graph::GraphClient;

use crate::error::QaError;
use crate::prompt;

/// Most distinct values listed in an answer.
pub const MAX_ANSWER_VALUES: usize = 15;

pub const ANSWER_HEADER: &str = "查询到如下信息：";
pub const NO_RESULTS: &str = "未找到相关信息。";
pub const QUERY_FAILED: &str = "数据库查询出错。";
pub const UNPARSEABLE: &str = "无法解析问题。";

const QUESTION_TYPE: &str = "llm_generated";
const ERROR_TYPE: &str = "error";

/// A natural-language question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// One answer, with the statement that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_type: String,
    pub sql: Vec<String>,
    pub answer: String,
}

impl AnswerRecord {
    pub fn is_error(&self) -> bool {
        self.question_type == ERROR_TYPE
    }
}

/// Text generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<String, QaError>;
}

/// Read access to the graph; each row comes back as its values in text form.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    async fn run_query(&self, cypher: &str) -> Result<Vec<Vec<String>>, QaError>;
}

#[async_trait]
impl QueryRunner for GraphClient {
    async fn run_query(&self, cypher: &str) -> Result<Vec<Vec<String>>, QaError> {
        Ok(self.query_values(cypher).await?)
    }
}

/// Remove markdown code fences around a generated statement.
pub fn strip_fences(reply: &str) -> String {
    reply
        .trim()
        .replace("```cypher", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Turn query rows into an answer line.
pub fn summarize(rows: &[Vec<String>]) -> String {
    let mut values: Vec<&str> = Vec::new();
    for value in rows.iter().flatten() {
        if !values.contains(&value.as_str()) {
            values.push(value.as_str());
        }
    }

    if values.is_empty() {
        return NO_RESULTS.to_string();
    }

    values.truncate(MAX_ANSWER_VALUES);
    format!("{}\n{}", ANSWER_HEADER, values.join("、"))
}

/// Answers questions by generating and running Cypher.
pub struct QuestionParser<G, R> {
    generator: G,
    runner: R,
    system_prompt: String,
}

impl<G: TextGenerator, R: QueryRunner> QuestionParser<G, R> {
    pub fn new(generator: G, runner: R) -> Self {
        Self {
            generator,
            runner,
            system_prompt: prompt::system_prompt(),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Generate the statement for a question.
    pub async fn generate_cypher(&self, question: &str) -> Result<String, QaError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QaError::EmptyQuestion);
        }

        let reply = self.generator.generate(&self.system_prompt, question).await?;
        let cypher = strip_fences(&reply);
        if cypher.is_empty() {
            return Err(QaError::Generation("reply contained no statement".to_string()));
        }
        Ok(cypher)
    }

    /// Answer a question. Empty questions give an empty list; every other
    /// question gives exactly one record.
    pub async fn parse(&self, question: &Question) -> Vec<AnswerRecord> {
        let cypher = match self.generate_cypher(&question.text).await {
            Ok(cypher) => cypher,
            Err(QaError::EmptyQuestion) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Could not generate a query");
                return vec![AnswerRecord {
                    question_type: ERROR_TYPE.to_string(),
                    sql: Vec::new(),
                    answer: UNPARSEABLE.to_string(),
                }];
            }
        };

        info!(%cypher, "Generated query");

        let answer = match self.runner.run_query(&cypher).await {
            Ok(rows) => {
                debug!(rows = rows.len(), "Query returned");
                summarize(&rows)
            }
            Err(e) => {
                warn!(error = %e, %cypher, "Generated query failed");
                QUERY_FAILED.to_string()
            }
        };

        vec![AnswerRecord {
            question_type: QUESTION_TYPE.to_string(),
            sql: vec![cypher],
            answer,
        }]
    }
}
