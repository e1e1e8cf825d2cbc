//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lore_rag::{LoreConfig, Result};

/// Ask questions about a folder of documents.
#[derive(Parser, Debug)]
#[command(name = "lore", version, about = "Ask questions about a folder of documents")]
pub struct Cli {
    #[command(flatten)]
    pub overrides: ConfigOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Load, chunk and embed the raw data directory into the index
    Ingest,
    /// Answer one question and exit
    Ask {
        /// The question; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
        /// Print the answer and sources as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive question loop
    Chat,
}

/// Flags that override values read from the environment.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    /// Directory scanned for documents
    #[arg(long, global = true, value_name = "DIR")]
    pub raw_data_dir: Option<PathBuf>,
    /// Directory the index is written to and read from
    #[arg(long, global = true, value_name = "DIR")]
    pub index_dir: Option<PathBuf>,
    /// Number of chunks retrieved per question
    #[arg(long, global = true, value_name = "K")]
    pub top_k: Option<usize>,
    /// Maximum chunk size in characters
    #[arg(long, global = true, value_name = "CHARS")]
    pub chunk_size: Option<usize>,
    /// Overlap between consecutive chunks in characters
    #[arg(long, global = true, value_name = "CHARS")]
    pub chunk_overlap: Option<usize>,
    /// Embedding model identifier
    #[arg(long, global = true, value_name = "MODEL")]
    pub embedding_model: Option<String>,
    /// Chat model used to answer
    #[arg(long, global = true, value_name = "MODEL")]
    pub generation_model: Option<String>,
    /// Sampling temperature (0.0 to 2.0)
    #[arg(long, global = true, value_name = "FLOAT")]
    pub temperature: Option<f32>,
}

impl ConfigOverrides {
    /// Apply the flags that were given and re-validate.
    pub fn apply(&self, mut config: LoreConfig) -> Result<LoreConfig> {
        if let Some(dir) = &self.raw_data_dir {
            config.raw_data_dir = dir.clone();
        }
        if let Some(dir) = &self.index_dir {
            config.index_dir = dir.clone();
        }
        if let Some(k) = self.top_k {
            config.top_k = k;
        }
        if let Some(size) = self.chunk_size {
            config.chunk_size = size;
        }
        if let Some(overlap) = self.chunk_overlap {
            config.chunk_overlap = overlap;
        }
        if let Some(model) = &self.embedding_model {
            config.embedding_model = model.clone();
        }
        if let Some(model) = &self.generation_model {
            config.generation_model = model.clone();
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_keep_config() {
        let config = LoreConfig::default();
        assert_eq!(ConfigOverrides::default().apply(config.clone()).unwrap(), config);
    }

    #[test]
    fn flags_replace_fields() {
        let overrides = ConfigOverrides {
            index_dir: Some(PathBuf::from("/tmp/idx")),
            top_k: Some(2),
            temperature: Some(0.0),
            ..Default::default()
        };
        let config = overrides.apply(LoreConfig::default()).unwrap();
        assert_eq!(config.index_dir, PathBuf::from("/tmp/idx"));
        assert_eq!(config.top_k, 2);
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn invalid_combination_is_rejected() {
        let overrides = ConfigOverrides { chunk_size: Some(100), chunk_overlap: Some(150), ..Default::default() };
        assert!(overrides.apply(LoreConfig::default()).is_err());
    }
}
