//! OpenAI-style completions client

use super::Summarizer;
use crate::config::CompletionConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;

/// Longest provider body echoed into an error
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Body of a completion request
#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub prompt: String,
    pub max_tokens: u32,
}

/// Summarizer that calls a completions endpoint once per document
pub struct OpenAiCompletionClient {
    client: Client,
    config: CompletionConfig,
}

impl OpenAiCompletionClient {
    pub fn new(config: CompletionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(Error::HttpRequest)?;
        Ok(Self { client, config })
    }

    /// Prompt sent for `text`: the configured instruction followed by the text.
    pub fn prompt(&self, text: &str) -> String {
        format!("{}{}", self.config.prompt_prefix, text)
    }

    pub fn request_body(&self, text: &str) -> CompletionRequest<'_> {
        CompletionRequest {
            model: &self.config.model,
            prompt: self.prompt(text),
            max_tokens: self.config.max_tokens,
        }
    }
}

#[async_trait]
impl Summarizer for OpenAiCompletionClient {
    async fn summarize(&self, text: &str) -> Result<String> {
        let request = self.request_body(text);

        tracing::debug!(
            endpoint = %self.config.endpoint,
            model = %self.config.model,
            prompt_bytes = request.prompt.len(),
            "Requesting completion"
        );

        let response = self
            .client
            .post(self.config.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        parse_completion(status, &body)
    }
}

/// Pull `choices[0].text` out of a completion response.
///
/// An `error` object or a non-success status yields
/// [`Error::CompletionProvider`]; any other deviation from the expected shape
/// yields [`Error::UnexpectedResponseShape`]. The text is returned verbatim.
pub fn parse_completion(status: StatusCode, body: &str) -> Result<String> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) if !status.is_success() => return Err(provider_error(status, truncate(body))),
        Err(e) => {
            return Err(shape_error(format!("response is not JSON: {}", e)));
        }
    };

    if let Some(error) = value.get("error").filter(|error| !error.is_null()) {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| truncate(&error.to_string()));
        return Err(provider_error(status, message));
    }

    if !status.is_success() {
        return Err(provider_error(status, truncate(body)));
    }

    let choices = value
        .get("choices")
        .ok_or_else(|| shape_error("missing `choices`".to_string()))?
        .as_array()
        .ok_or_else(|| shape_error("`choices` is not an array".to_string()))?;

    let first = choices
        .first()
        .ok_or_else(|| shape_error("`choices` is empty".to_string()))?;

    let text = first
        .get("text")
        .and_then(Value::as_str)
        .ok_or_else(|| shape_error("`choices[0].text` is missing or not a string".to_string()))?;

    Ok(text.to_string())
}

fn provider_error(status: StatusCode, message: String) -> Error {
    Error::CompletionProvider {
        status: status.as_u16(),
        message,
    }
}

fn shape_error(reason: String) -> Error {
    Error::UnexpectedResponseShape { reason }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
