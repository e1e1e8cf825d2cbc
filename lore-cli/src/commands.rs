//! `ingest` and `ask` subcommands, and answer rendering shared with the console.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use lore_rag::document::PAGE_KEY;
use lore_rag::{AnswerResult, Assistant, IngestOutcome, IngestPipeline, LoreConfig};

/// Longest source excerpt printed under an answer, in characters.
const EXCERPT_CHARS: usize = 160;

/// Run ingestion with the configured directories and print a summary.
pub async fn ingest(config: &LoreConfig) -> Result<IngestOutcome> {
    let pipeline = IngestPipeline::from_config(config)?;
    let outcome = pipeline
        .ingest(&config.raw_data_dir, &config.index_dir)
        .await
        .with_context(|| format!("ingestion from '{}' failed", config.raw_data_dir.display()))?;
    println!("{}", render_outcome(config, &outcome));
    Ok(outcome)
}

/// Answer one question and print it.
pub async fn ask(config: &LoreConfig, question: &str, json: bool) -> Result<()> {
    let assistant = Assistant::from_config(config).await?;
    let result = assistant.ask(question).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", render_answer(&result));
    }
    Ok(())
}

/// Human-readable summary of an ingestion run.
pub fn render_outcome(config: &LoreConfig, outcome: &IngestOutcome) -> String {
    match outcome {
        IngestOutcome::NoDocumentsFound => format!(
            "No documents found in '{}'. Add .txt, .md or .pdf files and run ingestion again.",
            config.raw_data_dir.display()
        ),
        IngestOutcome::Ingested(report) => {
            let mut out = format!(
                "Indexed {} chunks from {} documents into '{}'.",
                report.chunks,
                report.documents,
                report.index_dir.display()
            );
            for path in &report.skipped_files {
                let _ = write!(out, "\n  skipped: {}", path.display());
            }
            out
        }
    }
}

/// The answer followed by a numbered source list.
pub fn render_answer(result: &AnswerResult) -> String {
    let mut out = result.answer.clone();
    if result.sources.is_empty() {
        return out;
    }

    out.push_str("\n\nSources:");
    for (i, source) in result.sources.iter().enumerate() {
        let name = source.metadata.get("source").map_or("unknown", String::as_str);
        let _ = write!(out, "\n  [{}] {name}", i + 1);
        if let Some(page) = source.metadata.get(PAGE_KEY) {
            let _ = write!(out, " p.{page}");
        }
        let _ = write!(out, " (score {:.2})\n      {}", source.score, excerpt(&source.content));
    }
    out
}

fn excerpt(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= EXCERPT_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
    format!("{cut}...")
}
