//! `appkg ask`: questions over the graph.

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use appkg_qa::{run_session, ChatClient, Question, QuestionParser};

use crate::config::AppConfig;
use crate::output;

#[derive(Args)]
pub struct AskArgs {
    /// Answer this question and exit; without it, read questions from stdin
    #[arg(short, long)]
    pub question: Option<String>,

    /// Print the generated Cypher
    #[arg(long)]
    pub show_query: bool,

    /// Print the answer record as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: AskArgs, config: &AppConfig) -> Result<()> {
    if config.graph.backend.is_memory() {
        bail!("Questions need a Neo4j or TuGraph store; the memory backend has no query engine");
    }

    let client = super::connect(&config.graph).await?;
    let parser = QuestionParser::new(ChatClient::new(&config.llm), client);

    match args.question {
        Some(text) => {
            let records = parser.parse(&Question::new(text)).await;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                output::print_answer(&records, args.show_query);
            }
        }
        None => {
            println!("{}", "=".repeat(50));
            println!("{}", "AppKG question answering".bold());
            println!("Type {} or {} to leave", "exit".cyan(), "退出".cyan());
            println!("{}", "=".repeat(50));

            let stdin = std::io::stdin();
            run_session(&parser, stdin.lock(), std::io::stdout(), "\n> ").await?;
            println!("{}", "Disconnected.".dimmed());
        }
    }

    Ok(())
}
