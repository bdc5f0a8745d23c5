//! Line-oriented question loop.

use std::io::{BufRead, Write};

use tracing::info;

use crate::parser::{Question, QueryRunner, QuestionParser, TextGenerator, NO_RESULTS};

/// Inputs that end the session, compared case-insensitively.
pub const EXIT_COMMANDS: &[&str] = &["exit", "quit", "退出"];

pub fn is_exit_command(line: &str) -> bool {
    let line = line.trim().to_lowercase();
    EXIT_COMMANDS.iter().any(|cmd| *cmd == line)
}

/// Read questions from `input` until an exit command or end of input,
/// writing each answer to `output`. Returns the number of questions asked.
pub async fn run_session<G, R, I, O>(
    parser: &QuestionParser<G, R>,
    input: I,
    mut output: O,
    prompt: &str,
) -> std::io::Result<usize>
where
    G: TextGenerator,
    R: QueryRunner,
    I: BufRead,
    O: Write,
{
    let mut asked = 0;
    let mut lines = input.lines();

    loop {
        write!(output, "{}", prompt)?;
        output.flush()?;

        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let line = line.trim();

        if is_exit_command(line) {
            break;
        }
        if line.is_empty() {
            continue;
        }

        asked += 1;
        let records = parser.parse(&Question::new(line)).await;
        match records.first() {
            Some(record) => writeln!(output, "{}", record.answer)?,
            None => writeln!(output, "{}", NO_RESULTS)?,
        }
    }

    info!(asked, "Question session ended");
    Ok(asked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tests::{FakeGraph, FixedReply};

    #[test]
    fn test_exit_commands() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("  QUIT "));
        assert!(is_exit_command("退出"));
        assert!(!is_exit_command("exit now"));
    }

    #[tokio::test]
    async fn test_session_stops_at_sentinel() {
        let parser = QuestionParser::new(
            FixedReply(Ok("MATCH (g:Genre) RETURN g.name".into())),
            FakeGraph {
                rows: Some(vec![vec!["Games".to_string()]]),
                ..FakeGraph::default()
            },
        );
        let input = "有哪些分类？\n\n   \nExit\n不会被问到\n";
        let mut out = Vec::new();

        let asked = run_session(&parser, input.as_bytes(), &mut out, "> ").await.unwrap();

        assert_eq!(asked, 1);
        assert_eq!(parser.runner().seen.lock().unwrap().len(), 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Games"));
    }

    #[tokio::test]
    async fn test_session_ends_at_eof() {
        let parser = QuestionParser::new(FixedReply(Ok("RETURN 1".into())), FakeGraph::default());
        let asked = run_session(&parser, "q1\nq2".as_bytes(), Vec::new(), "").await.unwrap();
        assert_eq!(asked, 2);
    }
}
