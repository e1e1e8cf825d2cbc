//! Answer generation from a question and retrieved context.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::generation::LanguageModel;

/// Returned for a blank question, without calling the model.
pub const EMPTY_QUESTION_REPLY: &str = "Please provide a question.";

const GROUNDED_INSTRUCTIONS: &str = "You are an assistant answering questions about a document collection. \
Use the following context to answer the question.
If you don't know the answer, just say that you don't know, don't try to make up an answer.
Keep the answer concise and to the point, referring only to the provided context.";

/// Text produced by the model, and whether it was grounded in context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// The model output, verbatim.
    pub text: String,
    /// `false` when no context was available and the model answered from
    /// general knowledge.
    pub grounded: bool,
}

/// Builds prompts and calls the [`LanguageModel`] once per question.
#[derive(Clone)]
pub struct Generator {
    model: Arc<dyn LanguageModel>,
}

impl Generator {
    /// Create a generator backed by `model`.
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Answer `question` using `context`.
    ///
    /// - Blank question: returns [`EMPTY_QUESTION_REPLY`] without a model call.
    /// - Blank context: asks the model without context; `grounded` is `false`.
    /// - Otherwise: one call with the context-only instructions.
    ///
    /// # Errors
    ///
    /// Propagates the model's error. There is no retry.
    pub async fn generate(&self, question: &str, context: &str) -> Result<Generation> {
        if question.trim().is_empty() {
            return Ok(Generation { text: EMPTY_QUESTION_REPLY.to_string(), grounded: false });
        }

        if context.trim().is_empty() {
            warn!(model = self.model.model(), "no context available, answering ungrounded");
            let text = self.model.complete(&ungrounded_prompt(question)).await?;
            return Ok(Generation { text, grounded: false });
        }

        debug!(model = self.model.model(), context_len = context.len(), "generating grounded answer");
        let text = self.model.complete(&grounded_prompt(question, context)).await?;
        info!(model = self.model.model(), answer_len = text.len(), "generated answer");
        Ok(Generation { text, grounded: true })
    }
}

/// The prompt used when context is available.
pub fn grounded_prompt(question: &str, context: &str) -> String {
    format!("{GROUNDED_INSTRUCTIONS}\n\nContext:\n{context}\n\nQuestion:\n{question}\n\nAnswer:")
}

/// The prompt used when retrieval found nothing.
pub fn ungrounded_prompt(question: &str) -> String {
    format!("Answer the following question without any specific context: {question}")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct RecordingModel {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for RecordingModel {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("answer".to_string())
        }

        fn model(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn blank_question_skips_the_model() {
        let model = Arc::new(RecordingModel::default());
        let generator = Generator::new(model.clone());

        let generation = generator.generate("   ", "some context").await.unwrap();
        assert_eq!(generation.text, EMPTY_QUESTION_REPLY);
        assert!(model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_context_is_flagged_ungrounded() {
        let model = Arc::new(RecordingModel::default());
        let generator = Generator::new(model.clone());

        let generation = generator.generate("Why?", "").await.unwrap();
        assert!(!generation.grounded);
        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.as_slice(), [ungrounded_prompt("Why?")]);
    }

    #[tokio::test]
    async fn grounded_prompt_carries_context_and_question_once() {
        let model = Arc::new(RecordingModel::default());
        let generator = Generator::new(model.clone());

        let generation = generator.generate("Who?", "The fox.").await.unwrap();
        assert!(generation.grounded);
        assert_eq!(generation.text, "answer");

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Context:\nThe fox."));
        assert!(prompts[0].contains("Question:\nWho?"));
        assert!(prompts[0].contains("don't know"));
    }
}
