//! # AppKG QA
//!
//! Natural-language questions over the App graph.
//!
//! A question is turned into a Cypher statement by a chat model, the
//! statement runs against the graph store, and the returned values are
//! condensed into a short answer.

pub mod error;
pub mod llm;
pub mod parser;
pub mod prompt;
pub mod repl;

pub use error::QaError;
pub use llm::{ChatClient, LlmConfig};
pub use parser::{strip_fences, summarize, AnswerRecord, Question, QuestionParser, QueryRunner, TextGenerator};
pub use repl::{is_exit_command, run_session};
