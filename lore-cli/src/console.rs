//! Interactive question loop.
//!
//! Lines starting with `/` are commands; everything else is a question.

use anyhow::Result;
use lore_rag::{AssistantHandle, RagError};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::commands;

const HELP: &str = "Commands:\n  /ingest  re-run ingestion and reload the index\n  /help    show this message\n  /quit    exit";

/// What a line of input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Question(String),
    Ingest,
    Help,
    Quit,
    Blank,
    Unknown(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "" => Self::Blank,
            "/quit" | "/exit" => Self::Quit,
            "/ingest" => Self::Ingest,
            "/help" => Self::Help,
            _ if line.starts_with('/') => Self::Unknown(line.to_string()),
            _ => Self::Question(line.to_string()),
        }
    }
}

/// Run the console until `/quit`, Ctrl-C or end of input.
pub async fn run(handle: &AssistantHandle) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("Ask a question about your documents. Type /help for commands.");

    loop {
        let line = match rl.readline("lore> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        match Input::parse(&line) {
            Input::Blank => continue,
            Input::Quit => break,
            Input::Help => println!("{HELP}"),
            Input::Unknown(command) => println!("Unknown command {command}. Type /help."),
            Input::Ingest => {
                // A failed ingestion is reported, not fatal.
                match commands::ingest(handle.config()).await {
                    Ok(outcome) if outcome.is_ingested() => handle.reset().await,
                    Ok(_) => {}
                    Err(e) => println!("Ingestion failed: {e:#}"),
                }
            }
            Input::Question(question) => {
                let _ = rl.add_history_entry(question.as_str());
                match handle.get_or_init().await {
                    Ok(assistant) => {
                        let result = assistant.ask(&question).await;
                        println!("{}\n", commands::render_answer(&result));
                    }
                    Err(e @ RagError::IndexNotInitialized { .. }) => {
                        println!("{e}. Use /ingest to build it.");
                    }
                    Err(e) => println!("Could not open the index: {e}"),
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_questions() {
        assert_eq!(Input::parse("  "), Input::Blank);
        assert_eq!(Input::parse("/quit"), Input::Quit);
        assert_eq!(Input::parse("/exit"), Input::Quit);
        assert_eq!(Input::parse(" /ingest "), Input::Ingest);
        assert_eq!(Input::parse("/help"), Input::Help);
        assert_eq!(Input::parse("/reload"), Input::Unknown("/reload".to_string()));
        assert_eq!(
            Input::parse(" What animal is lazy? "),
            Input::Question("What animal is lazy?".to_string())
        );
    }
}
