//! Language model trait used to generate answers.

use async_trait::async_trait;

use crate::error::Result;

/// A text-completion backend.
///
/// One call to [`complete`](LanguageModel::complete) is one request to the
/// backend. Implementations do not retry.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send a single prompt and return the generated text verbatim.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// The identifier of the model.
    fn model(&self) -> &str;
}
