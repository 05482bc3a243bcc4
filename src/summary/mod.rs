//! Summaries from a language-model completion endpoint

mod openai;

pub use openai::{parse_completion, CompletionRequest, OpenAiCompletionClient};

use crate::error::Result;
use async_trait::async_trait;

/// Produces a summary of extracted document text
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String>;
}
